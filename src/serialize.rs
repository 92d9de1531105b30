use crate::doc::{Document, NodeId};
use crate::error::Fault;
use crate::node::{NodeKind, Scalar};
use crate::options::WriteOptions;

/// Canonical number literal: integral values go through itoa, everything
/// else through ryu's shortest representation.
pub(crate) fn format_number(value: f64) -> String {
    let mut out = String::new();
    write_number(&mut out, value);
    out
}

fn write_number(out: &mut String, value: f64) {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        let mut buf = itoa::Buffer::new();
        out.push_str(buf.format(value as i64));
    } else {
        let mut buf = ryu::Buffer::new();
        out.push_str(buf.format(value));
    }
}

fn write_escaped(out: &mut String, text: &str, escape_single_quotes: bool) {
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '\'' if escape_single_quotes => out.push_str("\\'"),
            ch if (ch as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", ch as u32));
            }
            ch => out.push(ch),
        }
    }
    out.push('"');
}

impl Document {
    /// Serialize the root. See [`Document::to_text`].
    pub fn text(&mut self) -> String {
        self.to_text(self.root())
    }

    pub fn to_text(&mut self, id: NodeId) -> String {
        self.to_text_with(id, &WriteOptions::default())
    }

    /// Serialize a subtree. Idempotent between mutations: the result is
    /// cached on the node and handed back verbatim until something
    /// invalidates it. Returns an empty string and sets
    /// [`Fault::ChildSerialize`] up the chain when a descendant carries a
    /// fault; a faulted target yields an empty string directly.
    pub fn to_text_with(&mut self, id: NodeId, options: &WriteOptions) -> String {
        self.tally("serialize");
        if !self.contains(id) || self.node(id).status.is_some() {
            return String::new();
        }
        if self.cached_text_valid(id) {
            return self.node(id).text.clone().unwrap_or_default();
        }
        let mut out = String::new();
        match self.write_node(id, options, &mut out) {
            Ok(()) => {
                let node = self.node_mut(id);
                node.text = Some(out.clone());
                node.text_valid = true;
                out
            }
            Err(failed_parent) => {
                self.poison_chain(failed_parent, id);
                String::new()
            }
        }
    }

    /// Mark the container whose child failed, and every ancestor up to the
    /// serialization entry point. Partial output is discarded by the caller.
    fn poison_chain(&mut self, from: NodeId, upto: NodeId) {
        let mut current = Some(from);
        while let Some(at) = current {
            self.fail(at, Fault::ChildSerialize, "aborting serialization");
            if at == upto {
                break;
            }
            current = self.node(at).parent;
        }
    }

    fn write_node(
        &self,
        id: NodeId,
        options: &WriteOptions,
        out: &mut String,
    ) -> Result<(), NodeId> {
        let node = self.node(id);
        if node.status.is_some() || node.kind == NodeKind::Error {
            return Err(node.parent.unwrap_or(id));
        }
        if node.text_valid {
            if let Some(text) = &node.text {
                out.push_str(text);
                return Ok(());
            }
        }
        match node.kind {
            // an unset node re-emits as null as well
            NodeKind::Null => out.push_str("null"),
            NodeKind::Boolean => match node.scalar {
                Scalar::Bool(true) => out.push_str("true"),
                _ => out.push_str("false"),
            },
            NodeKind::Number => match node.scalar {
                Scalar::Number(value) => write_number(out, value),
                _ => out.push_str("0"),
            },
            NodeKind::String => match &node.scalar {
                Scalar::Str(s) => write_escaped(out, s, options.escape_single_quotes),
                _ => out.push_str("\"\""),
            },
            NodeKind::Array => {
                out.push('[');
                for (index, &child) in node.children.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    let meta = self.node(child).formatting.as_ref();
                    if let Some(meta) = meta {
                        out.push_str(&meta.pre_value);
                    }
                    self.write_node(child, options, out)?;
                    if let Some(meta) = meta {
                        out.push_str(&meta.trailing);
                    }
                }
                if let Some(meta) = &node.formatting {
                    out.push_str(&meta.trailing);
                }
                out.push(']');
            }
            NodeKind::Object => {
                out.push('{');
                for (index, &child) in node.children.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    let meta = self.node(child).formatting.as_ref();
                    if let Some(meta) = meta {
                        out.push_str(&meta.pre_key);
                    }
                    let key = self.node(child).key.as_deref().unwrap_or_default();
                    write_escaped(out, key, options.escape_single_quotes);
                    if let Some(meta) = meta {
                        out.push_str(&meta.post_key);
                    }
                    out.push(':');
                    if let Some(meta) = meta {
                        out.push_str(&meta.pre_value);
                    }
                    self.write_node(child, options, out)?;
                    if let Some(meta) = meta {
                        out.push_str(&meta.trailing);
                    }
                }
                if let Some(meta) = &node.formatting {
                    out.push_str(&meta.trailing);
                }
                out.push('}');
            }
            NodeKind::Error => unreachable!("error nodes are rejected above"),
        }
        Ok(())
    }
}
