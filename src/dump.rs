use std::fmt::Write;

use crate::doc::{Document, NodeId};
use crate::node::{NodeKind, Scalar};
use crate::serialize::format_number;

impl Document {
    /// Human-readable tree dump of the whole document, for debugging.
    pub fn dump(&self) -> String {
        self.dump_node(self.root())
    }

    /// One line per node: kind, key if any, payload, and the status code
    /// when the node carries a fault. Children indent two spaces.
    pub fn dump_node(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.dump_rec(id, 0, &mut out);
        out
    }

    fn dump_rec(&self, id: NodeId, depth: usize, out: &mut String) {
        if !self.contains(id) {
            return;
        }
        for _ in 0..depth {
            out.push_str("  ");
        }
        let node = self.node(id);
        if let Some(key) = &node.key {
            let _ = write!(out, "{key:?}: ");
        }
        out.push_str(node.kind.name());
        if node.is_unset() {
            out.push_str(" (unset)");
        } else {
            match &node.scalar {
                Scalar::Null => {}
                Scalar::Bool(value) => {
                    let _ = write!(out, " {value}");
                }
                Scalar::Number(value) => {
                    let _ = write!(out, " {}", format_number(*value));
                }
                Scalar::Str(value) => {
                    let _ = write!(out, " {value:?}");
                }
            }
        }
        if node.kind.is_container() {
            let _ = write!(out, " ({})", node.children.len());
        }
        if let Some(fault) = node.status {
            let _ = write!(out, " [status {}: {fault}]", fault.code());
        }
        out.push('\n');
        for &child in &node.children {
            self.dump_rec(child, depth + 1, out);
        }
    }
}
