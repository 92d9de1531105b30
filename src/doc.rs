use smol_str::SmolStr;

use crate::diag::Diagnostics;
use crate::error::{Error, Fault, Result};
use crate::node::{FormatMeta, Node, NodeKind, Scalar};
use crate::serialize::format_number;

/// Handle into a [`Document`] arena.
///
/// Handles are only meaningful for the document that issued them. A handle
/// whose node has been removed reads as an unset null; it is never
/// reattached implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// How much of a node a deep copy carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClonePart {
    /// Values, children, cached text and formatting.
    #[default]
    Full,
    /// Values and children only; caches and formatting are dropped.
    ValueOnly,
    /// Cached text and formatting only; no children, value marked invalid.
    TextOnly,
}

/// A mutable JSON/extended-JSON tree.
///
/// Nodes live in a slab owned by the document and refer to each other by
/// [`NodeId`]. Children are exclusively owned by their parent's child list;
/// the parent handle on each node exists only so mutations can invalidate
/// cached text up the tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    free: Vec<u32>,
    root: NodeId,
    diag: Option<Box<Diagnostics>>,
}

impl Document {
    /// An empty document whose root is an unset null.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::unset()],
            free: Vec::new(),
            root: NodeId(0),
            diag: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Attach a diagnostics context. Off by default; when off, nothing is
    /// counted or recorded.
    pub fn enable_diagnostics(&mut self) {
        if self.diag.is_none() {
            self.diag = Some(Box::default());
        }
    }

    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        self.diag.as_deref()
    }

    pub fn take_diagnostics(&mut self) -> Option<Diagnostics> {
        self.diag.take().map(|boxed| *boxed)
    }

    pub(crate) fn tally(&mut self, op: &'static str) {
        if let Some(diag) = self.diag.as_deref_mut() {
            diag.tally(op);
        }
    }

    /// Set a sticky fault. The first fault wins; later ones only show up in
    /// diagnostics.
    pub(crate) fn fail(&mut self, id: NodeId, fault: Fault, context: &str) {
        if let Some(diag) = self.diag.as_deref_mut() {
            diag.report(format!("{fault} ({}): {context}", fault.code()));
        }
        let node = self.node_mut(id);
        if node.status.is_none() {
            node.status = Some(fault);
        }
    }

    // ---- slab plumbing ----

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = node;
                NodeId(slot)
            }
            None => {
                self.nodes.push(node);
                NodeId((self.nodes.len() - 1) as u32)
            }
        }
    }

    /// Reset a subtree to unset slots and make them reusable. The root slot
    /// is never freed.
    pub(crate) fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.node_mut(current);
            stack.extend(std::mem::take(&mut node.children));
            *node = Node::unset();
            if current != self.root {
                self.free.push(current.0);
            }
        }
    }

    // ---- detached factories ----

    pub fn new_null(&mut self) -> NodeId {
        let mut node = Node::unset();
        node.value_valid = true;
        self.alloc(node)
    }

    pub fn new_bool(&mut self, value: bool) -> NodeId {
        let mut node = Node::unset();
        node.kind = NodeKind::Boolean;
        node.scalar = Scalar::Bool(value);
        node.value_valid = true;
        self.alloc(node)
    }

    /// Non-finite input yields an error node with a [`Fault::BadType`]
    /// status instead of a number.
    pub fn new_number(&mut self, value: f64) -> NodeId {
        if !value.is_finite() {
            return self.new_error(Fault::BadType);
        }
        let mut node = Node::unset();
        node.kind = NodeKind::Number;
        node.scalar = Scalar::Number(value);
        node.value_valid = true;
        self.alloc(node)
    }

    pub fn new_string(&mut self, value: &str) -> NodeId {
        let mut node = Node::unset();
        node.kind = NodeKind::String;
        node.scalar = Scalar::Str(SmolStr::new(value));
        node.value_valid = true;
        self.alloc(node)
    }

    pub fn new_array(&mut self) -> NodeId {
        let mut node = Node::unset();
        node.kind = NodeKind::Array;
        node.value_valid = true;
        self.alloc(node)
    }

    pub fn new_object(&mut self) -> NodeId {
        let mut node = Node::unset();
        node.kind = NodeKind::Object;
        node.value_valid = true;
        self.alloc(node)
    }

    pub fn new_error(&mut self, fault: Fault) -> NodeId {
        let mut node = Node::unset();
        node.kind = NodeKind::Error;
        node.status = Some(fault);
        let id = self.alloc(node);
        if let Some(diag) = self.diag.as_deref_mut() {
            diag.report(format!("{fault} ({}): error node created", fault.code()));
        }
        id
    }

    // ---- inspection ----

    pub fn kind(&self, id: NodeId) -> NodeKind {
        if self.contains(id) {
            self.node(id).kind
        } else {
            NodeKind::Null
        }
    }

    /// Integer status code: `0` healthy, negative when a fault is set.
    pub fn status(&self, id: NodeId) -> i32 {
        self.fault(id).map_or(0, Fault::code)
    }

    pub fn fault(&self, id: NodeId) -> Option<Fault> {
        if self.contains(id) {
            self.node(id).status
        } else {
            None
        }
    }

    pub fn status_message(&self, id: NodeId) -> String {
        match self.fault(id) {
            Some(fault) => fault.to_string(),
            None => "ok".to_string(),
        }
    }

    pub fn key(&self, id: NodeId) -> Option<&str> {
        if self.contains(id) {
            self.node(id).key.as_deref()
        } else {
            None
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        if self.contains(id) {
            self.node(id).parent
        } else {
            None
        }
    }

    /// Child count for containers, `1` for a set scalar, `0` otherwise.
    pub fn len(&self, id: NodeId) -> usize {
        if !self.contains(id) {
            return 0;
        }
        let node = self.node(id);
        if node.kind.is_container() {
            node.children.len()
        } else if node.is_unset() {
            0
        } else {
            1
        }
    }

    pub fn is_empty(&self, id: NodeId) -> bool {
        self.len(id) == 0
    }

    pub fn is_unset(&self, id: NodeId) -> bool {
        !self.contains(id) || self.node(id).is_unset()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes.get(id.index()) {
            Some(node) if node.kind.is_container() => &node.children,
            _ => &[],
        }
    }

    /// Ordered traversal: children for containers, the node itself for a
    /// set scalar or null, nothing for an unset node.
    pub fn iter(&self, id: NodeId) -> NodeIter {
        let items: Vec<NodeId> = if !self.contains(id) || self.node(id).is_unset() {
            Vec::new()
        } else if self.node(id).kind.is_container() {
            self.node(id).children.clone()
        } else {
            vec![id]
        };
        NodeIter {
            items: items.into_iter(),
        }
    }

    pub fn cached_text(&self, id: NodeId) -> Option<&str> {
        if self.contains(id) {
            self.node(id).text.as_deref()
        } else {
            None
        }
    }

    pub fn cached_text_valid(&self, id: NodeId) -> bool {
        self.contains(id) && self.node(id).text_valid && self.node(id).text.is_some()
    }

    pub fn formatting(&self, id: NodeId) -> Option<&FormatMeta> {
        if self.contains(id) {
            self.node(id).formatting.as_ref()
        } else {
            None
        }
    }

    // ---- coercion accessors ----

    pub fn str_or(&self, id: NodeId, default: &str) -> String {
        if !self.readable(id) {
            return default.to_string();
        }
        match &self.node(id).scalar {
            Scalar::Str(s) => s.to_string(),
            Scalar::Number(n) => format_number(*n),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Null => default.to_string(),
        }
    }

    pub fn int_or(&self, id: NodeId, default: i64) -> i64 {
        if !self.readable(id) {
            return default;
        }
        match &self.node(id).scalar {
            Scalar::Number(n) => n.trunc() as i64,
            Scalar::Str(s) => s
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map_or(default, |f| f.trunc() as i64),
            _ => default,
        }
    }

    pub fn float_or(&self, id: NodeId, default: f64) -> f64 {
        if !self.readable(id) {
            return default;
        }
        match &self.node(id).scalar {
            Scalar::Number(n) => *n,
            Scalar::Str(s) => s
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .unwrap_or(default),
            _ => default,
        }
    }

    pub fn bool_or(&self, id: NodeId, default: bool) -> bool {
        if !self.readable(id) {
            return default;
        }
        match &self.node(id).scalar {
            Scalar::Bool(b) => *b,
            Scalar::Str(s) => {
                if s.eq_ignore_ascii_case("true") {
                    true
                } else if s.eq_ignore_ascii_case("false") {
                    false
                } else {
                    default
                }
            }
            _ => default,
        }
    }

    fn readable(&self, id: NodeId) -> bool {
        self.contains(id) && self.node(id).is_healthy() && self.node(id).value_valid
    }

    // ---- mutation ----

    /// Drop cached text on this node and every ancestor. Descendant caches
    /// stay valid.
    pub(crate) fn invalidate(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(at) = current {
            if !self.contains(at) {
                break;
            }
            let node = self.node_mut(at);
            node.text_valid = false;
            current = node.parent;
        }
    }

    fn writable(&self, id: NodeId) -> bool {
        self.contains(id) && self.node(id).is_healthy()
    }

    fn replace_payload(&mut self, id: NodeId, kind: NodeKind, scalar: Scalar) -> bool {
        if !self.writable(id) {
            return false;
        }
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.free_subtree(child);
        }
        let node = self.node_mut(id);
        node.kind = kind;
        node.scalar = scalar;
        node.value_valid = true;
        node.text = None;
        self.invalidate(id);
        true
    }

    pub fn set_null(&mut self, id: NodeId) -> bool {
        self.tally("set");
        self.replace_payload(id, NodeKind::Null, Scalar::Null)
    }

    pub fn set_bool(&mut self, id: NodeId, value: bool) -> bool {
        self.tally("set");
        self.replace_payload(id, NodeKind::Boolean, Scalar::Bool(value))
    }

    /// Refuses non-finite values with a sticky [`Fault::BadType`].
    pub fn set_number(&mut self, id: NodeId, value: f64) -> bool {
        self.tally("set");
        if !value.is_finite() {
            if self.writable(id) {
                self.fail(id, Fault::BadType, "non-finite number assigned");
            }
            return false;
        }
        self.replace_payload(id, NodeKind::Number, Scalar::Number(value))
    }

    pub fn set_string(&mut self, id: NodeId, value: &str) -> bool {
        self.tally("set");
        self.replace_payload(id, NodeKind::String, Scalar::Str(SmolStr::new(value)))
    }

    pub fn make_array(&mut self, id: NodeId) -> bool {
        self.tally("set");
        self.replace_payload(id, NodeKind::Array, Scalar::Null)
    }

    pub fn make_object(&mut self, id: NodeId) -> bool {
        self.tally("set");
        self.replace_payload(id, NodeKind::Object, Scalar::Null)
    }

    /// Append a detached node to an array. An unset or null target is
    /// promoted to an array first.
    pub fn push(&mut self, array: NodeId, child: NodeId) -> bool {
        if !self.writable(array) || !self.attachable(child) {
            return false;
        }
        if self.node(array).kind == NodeKind::Null {
            if !self.make_array(array) {
                return false;
            }
        }
        if self.node(array).kind != NodeKind::Array {
            return false;
        }
        let node = self.node_mut(child);
        node.parent = Some(array);
        node.key = None;
        self.node_mut(array).children.push(child);
        self.invalidate(array);
        true
    }

    /// Insert a detached node as an object member. Key uniqueness is
    /// enforced: a case-insensitive match is replaced in place.
    pub fn insert_member(&mut self, obj: NodeId, key: &str, child: NodeId) -> bool {
        if !self.writable(obj) || !self.attachable(child) {
            return false;
        }
        if self.node(obj).kind == NodeKind::Null {
            if !self.make_object(obj) {
                return false;
            }
        }
        if self.node(obj).kind != NodeKind::Object {
            return false;
        }
        {
            let node = self.node_mut(child);
            node.parent = Some(obj);
            node.key = Some(SmolStr::new(key));
        }
        match self.member_position(obj, key) {
            Some(position) => {
                let old = self.node(obj).children[position];
                self.free_subtree(old);
                self.node_mut(obj).children[position] = child;
            }
            None => self.node_mut(obj).children.push(child),
        }
        self.invalidate(obj);
        true
    }

    fn attachable(&self, child: NodeId) -> bool {
        self.contains(child) && child != self.root && self.node(child).parent.is_none()
    }

    fn member_position(&self, obj: NodeId, key: &str) -> Option<usize> {
        self.node(obj).children.iter().position(|&child| {
            self.node(child)
                .key
                .as_deref()
                .is_some_and(|k| k.eq_ignore_ascii_case(key))
        })
    }

    /// Pure lookup by key, case-insensitive. Never creates.
    pub fn find_member(&self, obj: NodeId, key: &str) -> Option<NodeId> {
        if !self.contains(obj) || self.node(obj).kind != NodeKind::Object {
            return None;
        }
        self.member_position(obj, key)
            .map(|position| self.node(obj).children[position])
    }

    /// Pure lookup by index. Never creates.
    pub fn at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    /// Get-or-create member accessor. A missing key is created as a null
    /// member; an unset/null target becomes an object. Returns `None` for a
    /// scalar target or a faulted node.
    pub fn member(&mut self, obj: NodeId, key: &str) -> Option<NodeId> {
        if !self.writable(obj) {
            return None;
        }
        if self.node(obj).kind == NodeKind::Null && !self.make_object(obj) {
            return None;
        }
        if self.node(obj).kind != NodeKind::Object {
            return None;
        }
        if let Some(existing) = self.find_member(obj, key) {
            return Some(existing);
        }
        let child = self.new_null();
        self.insert_member(obj, key, child).then_some(child)
    }

    /// Get-or-create index accessor. Out-of-range reads grow the array with
    /// nulls up to and including `index`.
    pub fn element(&mut self, array: NodeId, index: usize) -> Option<NodeId> {
        if !self.writable(array) {
            return None;
        }
        if self.node(array).kind == NodeKind::Null && !self.make_array(array) {
            return None;
        }
        if self.node(array).kind != NodeKind::Array {
            return None;
        }
        while self.node(array).children.len() <= index {
            let child = self.new_null();
            if !self.push(array, child) {
                return None;
            }
        }
        Some(self.node(array).children[index])
    }

    /// Detach a node from its parent, keeping it alive as a free-standing
    /// subtree. Returns `false` for the root or an already detached node.
    pub fn detach(&mut self, id: NodeId) -> bool {
        if !self.contains(id) || id == self.root {
            return false;
        }
        let Some(parent) = self.node(id).parent else {
            return false;
        };
        self.node_mut(parent).children.retain(|&child| child != id);
        self.invalidate(parent);
        let node = self.node_mut(id);
        node.parent = None;
        node.key = None;
        true
    }

    /// Detach a subtree and free its slots.
    pub fn remove(&mut self, id: NodeId) -> bool {
        self.tally("remove");
        if !self.detach(id) {
            return false;
        }
        self.free_subtree(id);
        true
    }

    /// Reset a node to the unset state and detach it from its parent. The
    /// slot stays valid; children are freed.
    pub fn clear(&mut self, id: NodeId) {
        self.tally("clear");
        if !self.contains(id) {
            return;
        }
        self.detach(id);
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.free_subtree(child);
        }
        self.node_mut(id).reset();
        self.node_mut(id).parent = None;
        if id == self.root {
            return;
        }
        self.invalidate(id);
    }

    /// Rename every member whose key matches `old` (case-insensitive).
    /// Fails if `new` is already taken. Returns how many were renamed.
    pub fn rename(&mut self, obj: NodeId, old: &str, new: &str) -> Result<usize> {
        self.tally("rename");
        if !self.writable(obj) || self.node(obj).kind != NodeKind::Object {
            return Err(Error::path("rename target is not a healthy object"));
        }
        if !old.eq_ignore_ascii_case(new) && self.find_member(obj, new).is_some() {
            return Err(Error::path(format!("key '{new}' already exists")));
        }
        let members = self.node(obj).children.clone();
        let mut renamed = 0;
        for child in members {
            let matches = self
                .node(child)
                .key
                .as_deref()
                .is_some_and(|k| k.eq_ignore_ascii_case(old));
            if matches {
                self.node_mut(child).key = Some(SmolStr::new(new));
                renamed += 1;
            }
        }
        if renamed > 0 {
            self.invalidate(obj);
        }
        Ok(renamed)
    }

    // ---- cloning ----

    /// Deep copy within this document; the copy is detached and keyless.
    pub fn clone_node(&mut self, id: NodeId, part: ClonePart) -> NodeId {
        self.tally("clone");
        if !self.contains(id) {
            return self.new_null();
        }
        self.clone_rec_same(id, part, true)
    }

    fn clone_rec_same(&mut self, id: NodeId, part: ClonePart, strip_key: bool) -> NodeId {
        let source = self.node(id).clone();
        let children = source.children.clone();
        let copy_id = self.alloc(shape_copy(source, part, strip_key));
        if part != ClonePart::TextOnly {
            for child in children {
                let copied = self.clone_rec_same(child, part, false);
                self.node_mut(copied).parent = Some(copy_id);
                self.node_mut(copy_id).children.push(copied);
            }
        }
        copy_id
    }

    /// Deep copy into another document; the copy is detached and keyless at
    /// its top level.
    pub fn clone_into(&self, id: NodeId, target: &mut Document, part: ClonePart) -> NodeId {
        if !self.contains(id) {
            return target.new_null();
        }
        self.clone_rec_into(id, target, part, true)
    }

    fn clone_rec_into(
        &self,
        id: NodeId,
        target: &mut Document,
        part: ClonePart,
        strip_key: bool,
    ) -> NodeId {
        let source = self.node(id).clone();
        let children = source.children.clone();
        let copy_id = target.alloc(shape_copy(source, part, strip_key));
        if part != ClonePart::TextOnly {
            for child in children {
                let copied = self.clone_rec_into(child, target, part, false);
                target.node_mut(copied).parent = Some(copy_id);
                target.node_mut(copy_id).children.push(copied);
            }
        }
        copy_id
    }

    // ---- serde_json interop ----

    pub fn to_json_value(&self, id: NodeId) -> serde_json::Value {
        if !self.contains(id) || !self.node(id).is_healthy() {
            return serde_json::Value::Null;
        }
        let node = self.node(id);
        match node.kind {
            NodeKind::Null | NodeKind::Error => serde_json::Value::Null,
            NodeKind::Boolean => match node.scalar {
                Scalar::Bool(b) => serde_json::Value::Bool(b),
                _ => serde_json::Value::Null,
            },
            NodeKind::Number => match node.scalar {
                Scalar::Number(n) => {
                    if n.fract() == 0.0 && n.abs() < 9.0e15 {
                        serde_json::Value::Number((n as i64).into())
                    } else {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .unwrap_or(serde_json::Value::Null)
                    }
                }
                _ => serde_json::Value::Null,
            },
            NodeKind::String => match &node.scalar {
                Scalar::Str(s) => serde_json::Value::String(s.to_string()),
                _ => serde_json::Value::Null,
            },
            NodeKind::Array => serde_json::Value::Array(
                node.children
                    .iter()
                    .map(|&child| self.to_json_value(child))
                    .collect(),
            ),
            NodeKind::Object => {
                let mut map = serde_json::Map::new();
                for &child in &node.children {
                    let key = self.node(child).key.as_deref().unwrap_or_default();
                    map.insert(key.to_string(), self.to_json_value(child));
                }
                serde_json::Value::Object(map)
            }
        }
    }

    /// Build a detached subtree from a `serde_json::Value`.
    pub fn from_json_value(&mut self, value: &serde_json::Value) -> NodeId {
        match value {
            serde_json::Value::Null => self.new_null(),
            serde_json::Value::Bool(b) => self.new_bool(*b),
            serde_json::Value::Number(n) => self.new_number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => self.new_string(s),
            serde_json::Value::Array(items) => {
                let array = self.new_array();
                for item in items {
                    let child = self.from_json_value(item);
                    self.push(array, child);
                }
                array
            }
            serde_json::Value::Object(map) => {
                let obj = self.new_object();
                for (key, item) in map {
                    let child = self.from_json_value(item);
                    self.insert_member(obj, key, child);
                }
                obj
            }
        }
    }

    /// A document whose root mirrors the given `serde_json::Value`.
    pub fn from_json(value: &serde_json::Value) -> Document {
        let mut doc = Document::new();
        let detached = doc.from_json_value(value);
        doc.adopt_as_root(detached);
        doc
    }

    /// Build a detached subtree from any serializable value.
    pub fn from_serialize<T: serde::Serialize>(&mut self, value: &T) -> Result<NodeId> {
        let json = serde_json::to_value(value)
            .map_err(|err| Error::fault(Fault::BadType, err.to_string()))?;
        Ok(self.from_json_value(&json))
    }

    /// Deserialize a subtree into a typed value.
    pub fn to_typed<T: serde::de::DeserializeOwned>(&self, id: NodeId) -> Result<T> {
        serde_json::from_value(self.to_json_value(id))
            .map_err(|err| Error::fault(Fault::BadType, err.to_string()))
    }

    /// Move a detached subtree into the root slot, replacing whatever the
    /// document held.
    pub fn adopt_as_root(&mut self, id: NodeId) {
        // only detached subtrees may take over the root slot
        if id == self.root || !self.contains(id) || self.node(id).parent.is_some() {
            return;
        }
        let root = self.root;
        let old_children = std::mem::take(&mut self.node_mut(root).children);
        for child in old_children {
            self.free_subtree(child);
        }
        let node = std::mem::replace(self.node_mut(id), Node::unset());
        let children = node.children.clone();
        *self.node_mut(root) = node;
        self.node_mut(root).parent = None;
        self.node_mut(root).key = None;
        for child in children {
            self.node_mut(child).parent = Some(root);
        }
        self.free.push(id.0);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn shape_copy(mut source: Node, part: ClonePart, strip_key: bool) -> Node {
    source.parent = None;
    source.children = Vec::new();
    if strip_key {
        source.key = None;
    }
    match part {
        ClonePart::Full => {}
        ClonePart::ValueOnly => {
            source.text = None;
            source.text_valid = false;
            source.formatting = None;
        }
        ClonePart::TextOnly => {
            source.scalar = Scalar::Null;
            source.value_valid = false;
        }
    }
    source
}

/// Iterator returned by [`Document::iter`].
pub struct NodeIter {
    items: std::vec::IntoIter<NodeId>,
}

impl Iterator for NodeIter {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        self.items.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_factories_and_kinds() {
        let mut doc = Document::new();
        let n = doc.new_number(1.5);
        let s = doc.new_string("hi");
        let b = doc.new_bool(true);
        let o = doc.new_object();
        assert_eq!(doc.kind(n), NodeKind::Number);
        assert_eq!(doc.kind(s), NodeKind::String);
        assert_eq!(doc.kind(b), NodeKind::Boolean);
        assert_eq!(doc.kind(o), NodeKind::Object);
        assert_eq!(doc.float_or(n, 0.0), 1.5);
        assert_eq!(doc.str_or(s, ""), "hi");
        assert!(doc.bool_or(b, false));
    }

    #[rstest::rstest]
    fn test_non_finite_number_becomes_error_node() {
        let mut doc = Document::new();
        let bad = doc.new_number(f64::NAN);
        assert_eq!(doc.kind(bad), NodeKind::Error);
        assert_eq!(doc.status(bad), Fault::BadType.code());
    }

    #[rstest::rstest]
    fn test_insert_member_enforces_unique_keys() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.make_object(root);
        let first = doc.new_number(1.0);
        let second = doc.new_number(2.0);
        assert!(doc.insert_member(root, "Key", first));
        assert!(doc.insert_member(root, "key", second));
        assert_eq!(doc.len(root), 1);
        let found = doc.find_member(root, "KEY").unwrap();
        assert_eq!(doc.float_or(found, 0.0), 2.0);
    }

    #[rstest::rstest]
    fn test_element_accessor_grows_with_nulls() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.make_array(root);
        let third = doc.element(root, 2).unwrap();
        assert_eq!(doc.len(root), 3);
        assert_eq!(doc.kind(third), NodeKind::Null);
        assert!(!doc.is_unset(third));
    }

    #[rstest::rstest]
    fn test_member_accessor_autovivifies_null() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.set_null(root);
        let child = doc.member(root, "a").unwrap();
        assert_eq!(doc.kind(root), NodeKind::Object);
        assert_eq!(doc.key(child), Some("a"));
    }

    #[rstest::rstest]
    fn test_member_accessor_refuses_scalars() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.set_number(root, 3.0);
        assert!(doc.member(root, "a").is_none());
        assert_eq!(doc.kind(root), NodeKind::Number);
    }

    #[rstest::rstest]
    fn test_sticky_status_blocks_reads_and_writes() {
        let mut doc = Document::new();
        let bad = doc.new_error(Fault::BadLiteral);
        assert_eq!(doc.str_or(bad, "fallback"), "fallback");
        assert_eq!(doc.int_or(bad, -3), -3);
        assert!(!doc.set_string(bad, "nope"));
        assert_eq!(doc.status(bad), Fault::BadLiteral.code());
    }

    #[rstest::rstest]
    fn test_rename_is_plural_and_guards_collisions() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.make_object(root);
        let a = doc.new_number(1.0);
        doc.insert_member(root, "old", a);
        let b = doc.new_number(2.0);
        doc.insert_member(root, "other", b);
        assert!(doc.rename(root, "missing", "new").is_ok());
        assert_eq!(doc.rename(root, "old", "fresh").unwrap(), 1);
        assert!(doc.find_member(root, "fresh").is_some());
        assert!(doc.rename(root, "fresh", "other").is_err());
    }

    #[rstest::rstest]
    fn test_remove_and_clear() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.make_object(root);
        let child = doc.member(root, "a").unwrap();
        doc.set_number(child, 5.0);
        assert!(doc.remove(child));
        assert_eq!(doc.len(root), 0);

        let again = doc.member(root, "b").unwrap();
        doc.set_string(again, "x");
        doc.clear(again);
        assert_eq!(doc.len(root), 0);
    }

    #[rstest::rstest]
    fn test_clone_node_parts() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.make_object(root);
        let child = doc.member(root, "a").unwrap();
        doc.set_number(child, 7.0);

        let full = doc.clone_node(root, ClonePart::Full);
        assert_eq!(doc.len(full), 1);
        assert!(doc.key(full).is_none());
        let copied = doc.find_member(full, "a").unwrap();
        assert_eq!(doc.float_or(copied, 0.0), 7.0);

        let value_only = doc.clone_node(root, ClonePart::ValueOnly);
        assert!(doc.cached_text(value_only).is_none());
    }

    #[rstest::rstest]
    fn test_clone_into_other_document() {
        let mut src = Document::new();
        let root = src.root();
        src.make_array(root);
        let item = src.element(root, 0).unwrap();
        src.set_string(item, "moved");

        let mut dst = Document::new();
        let copy = src.clone_into(root, &mut dst, ClonePart::Full);
        assert_eq!(dst.len(copy), 1);
        let first = dst.at(copy, 0).unwrap();
        assert_eq!(dst.str_or(first, ""), "moved");
    }

    #[rstest::rstest]
    fn test_json_interop_roundtrip() {
        let value = serde_json::json!({"a": [1, 2.5, "x"], "b": {"c": true, "d": null}});
        let doc = Document::from_json(&value);
        assert_eq!(doc.to_json_value(doc.root()), value);
    }

    #[rstest::rstest]
    fn test_typed_interop() {
        #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
        struct Endpoint {
            host: String,
            port: u16,
        }

        let mut doc = Document::new();
        let node = doc
            .from_serialize(&Endpoint {
                host: "localhost".to_string(),
                port: 8080,
            })
            .unwrap();
        doc.adopt_as_root(node);
        assert_eq!(doc.int_at("port", 0), 8080);

        let back: Endpoint = doc.to_typed(doc.root()).unwrap();
        assert_eq!(back.port, 8080);
        assert_eq!(back.host, "localhost");
    }

    #[rstest::rstest]
    fn test_iter_scalar_yields_itself() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.set_number(root, 4.0);
        let visited: Vec<NodeId> = doc.iter(root).collect();
        assert_eq!(visited, vec![root]);
    }

    #[rstest::rstest]
    fn test_diagnostics_counts_operations() {
        let mut doc = Document::new();
        doc.enable_diagnostics();
        let root = doc.root();
        doc.set_number(root, 1.0);
        doc.set_number(root, 2.0);
        assert_eq!(doc.diagnostics().unwrap().count("set"), 2);
    }
}
