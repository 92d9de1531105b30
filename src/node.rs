use smol_str::SmolStr;

use crate::doc::NodeId;
use crate::error::{Fault, Location};

/// What a node represents. `Error` marks a node constructed as an error
/// placeholder; nodes that fail during parsing keep their structural kind
/// and carry the fault in their status instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    #[default]
    Null,
    Number,
    String,
    Boolean,
    Array,
    Object,
    Error,
}

impl NodeKind {
    pub const fn name(self) -> &'static str {
        match self {
            NodeKind::Null => "null",
            NodeKind::Number => "number",
            NodeKind::String => "string",
            NodeKind::Boolean => "boolean",
            NodeKind::Array => "array",
            NodeKind::Object => "object",
            NodeKind::Error => "error",
        }
    }

    pub const fn is_container(self) -> bool {
        matches!(self, NodeKind::Array | NodeKind::Object)
    }

    pub const fn is_scalar(self) -> bool {
        matches!(self, NodeKind::Number | NodeKind::String | NodeKind::Boolean)
    }
}

/// Leaf payload. Containers keep `Null` here and use the child list.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Str(SmolStr),
}

/// Whitespace/comment fragments captured around a value when formatting
/// preservation is on, plus where the value started in the source.
///
/// For an object member `pre_key` and `post_key` bracket the key string and
/// `pre_value` sits between the `:` and the value; array elements only use
/// `pre_value`. `trailing` is whatever followed the value up to its
/// terminator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormatMeta {
    pub pre_key: String,
    pub post_key: String,
    pub pre_value: String,
    pub trailing: String,
    pub location: Option<Location>,
}

impl FormatMeta {
    pub fn is_empty(&self) -> bool {
        self.pre_key.is_empty()
            && self.post_key.is_empty()
            && self.pre_value.is_empty()
            && self.trailing.is_empty()
            && self.location.is_none()
    }
}

/// One slot in the document arena.
///
/// A node is "unset" when it has neither a valid value nor cached text;
/// that is the state fresh slots and cleared nodes are in, and it reads as
/// null everywhere.
#[derive(Debug, Clone, Default)]
pub(crate) struct Node {
    pub kind: NodeKind,
    pub status: Option<Fault>,
    pub key: Option<SmolStr>,
    pub scalar: Scalar,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub text: Option<String>,
    pub text_valid: bool,
    pub value_valid: bool,
    pub formatting: Option<FormatMeta>,
}

impl Node {
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn is_unset(&self) -> bool {
        !self.value_valid && !(self.text_valid && self.text.is_some())
    }

    pub fn is_healthy(&self) -> bool {
        self.status.is_none()
    }

    /// Reset to the unset state, dropping payload, children list, caches
    /// and status. Parent/key links are the owner's business.
    pub fn reset(&mut self) {
        let parent = self.parent;
        *self = Node::unset();
        self.parent = parent;
    }
}
