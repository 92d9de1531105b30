use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::doc::{Document, NodeId};
use crate::error::{Error, Result};
use crate::node::NodeKind;
use crate::parse::scanner::Scanner;

/// Conflict policy for path-level insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetMode {
    /// Fail if the final key/index already holds a value.
    Add,
    /// Fail if the final key/index does not exist yet.
    Replace,
    #[default]
    Upsert,
}

type Tokens = SmallVec<[SmolStr; 8]>;

/// Split a dotted reference into tokens. Double-quoted tokens (lexed with
/// the string reader, so escapes work) carry literal dots and quotes; a
/// reference without any `"` is a plain split on `.`.
fn tokenize(reference: &str) -> Option<Tokens> {
    let mut tokens = Tokens::new();
    if reference.is_empty() {
        return Some(tokens);
    }
    if !reference.contains('"') {
        tokens.extend(reference.split('.').map(SmolStr::new));
        return Some(tokens);
    }

    let mut scanner = Scanner::new(reference);
    loop {
        if scanner.peek() == Some(b'"') {
            let token = scanner.read_quoted().ok()?;
            tokens.push(SmolStr::new(token));
        } else {
            let start = scanner.pos();
            while !matches!(scanner.peek(), None | Some(b'.')) {
                if scanner.peek() == Some(b'"') {
                    return None;
                }
                scanner.bump();
            }
            tokens.push(SmolStr::new(scanner.slice(start, scanner.pos())));
        }
        match scanner.peek() {
            None => return Some(tokens),
            Some(b'.') => {
                scanner.bump();
                if scanner.at_end() {
                    tokens.push(SmolStr::default());
                    return Some(tokens);
                }
            }
            Some(_) => return None,
        }
    }
}

impl Document {
    /// Pure lookup from the root; never creates anything.
    pub fn resolve(&self, reference: &str) -> Option<NodeId> {
        self.resolve_from(self.root(), reference)
    }

    pub fn resolve_from(&self, id: NodeId, reference: &str) -> Option<NodeId> {
        let tokens = tokenize(reference)?;
        let mut current = id;
        for token in &tokens {
            current = self.resolve_step(current, token)?;
        }
        Some(current)
    }

    fn resolve_step(&self, id: NodeId, token: &str) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::Array => token.parse::<usize>().ok().and_then(|i| self.at(id, i)),
            NodeKind::Object => self.find_member(id, token),
            _ => None,
        }
    }

    /// Walk all but the final token, returning the would-be parent and that
    /// final token. The walk itself is pure.
    pub fn resolve_parent(&self, reference: &str) -> Option<(NodeId, SmolStr)> {
        let mut tokens = tokenize(reference)?;
        let last = tokens.pop()?;
        let mut current = self.root();
        for token in &tokens {
            current = self.resolve_step(current, token)?;
        }
        Some((current, last))
    }

    /// Get-or-create walk from the root: missing members are created as
    /// nulls, out-of-range indexes grow their array, and null nodes are
    /// promoted to whichever container the token shape requires. Scalar
    /// collisions yield `None` and leave the tree untouched.
    pub fn ensure(&mut self, reference: &str) -> Option<NodeId> {
        self.ensure_from(self.root(), reference)
    }

    pub fn ensure_from(&mut self, id: NodeId, reference: &str) -> Option<NodeId> {
        let tokens = tokenize(reference)?;
        let mut current = id;
        for token in &tokens {
            current = self.ensure_step(current, token)?;
        }
        Some(current)
    }

    fn ensure_step(&mut self, id: NodeId, token: &str) -> Option<NodeId> {
        let numeric = !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit());
        match self.kind(id) {
            NodeKind::Array => self.element(id, token.parse::<usize>().ok()?),
            NodeKind::Object => self.member(id, token),
            NodeKind::Null if numeric => self.element(id, token.parse::<usize>().ok()?),
            NodeKind::Null => self.member(id, token),
            _ => None,
        }
    }

    /// Attach a detached node at the referenced position.
    pub fn set_node(&mut self, reference: &str, child: NodeId, mode: SetMode) -> Result<NodeId> {
        self.tally("set_path");
        let mut tokens =
            tokenize(reference).ok_or_else(|| Error::path("malformed reference"))?;
        let last = tokens
            .pop()
            .ok_or_else(|| Error::path("empty reference"))?;

        // a replace that misses must leave the tree untouched, so its walk
        // is pure; the creating modes may build intermediate containers
        let mut current = self.root();
        for token in &tokens {
            current = if mode == SetMode::Replace {
                self.resolve_step(current, token)
            } else {
                self.ensure_step(current, token)
            }
            .ok_or_else(|| Error::path(format!("cannot traverse '{token}'")))?;
        }

        let numeric_last = !last.is_empty() && last.bytes().all(|b| b.is_ascii_digit());
        if self.kind(current) == NodeKind::Array
            || (self.kind(current) == NodeKind::Null && numeric_last)
        {
            let index: usize = last
                .parse()
                .map_err(|_| Error::path(format!("'{last}' is not an array index")))?;
            let len = if self.kind(current) == NodeKind::Array {
                self.len(current)
            } else {
                0
            };
            match mode {
                SetMode::Add if index < len => {
                    return Err(Error::path(format!("index {index} already exists")));
                }
                SetMode::Replace if index >= len => {
                    return Err(Error::path(format!("index {index} does not exist")));
                }
                _ => {}
            }
            let slot = self
                .element(current, index)
                .ok_or_else(|| Error::path("cannot index into this node"))?;
            self.replace_slot(current, slot, child)?;
            return Ok(child);
        }

        let existing = self.find_member(current, &last);
        match mode {
            SetMode::Add if existing.is_some() => {
                return Err(Error::path(format!("key '{last}' already exists")));
            }
            SetMode::Replace if existing.is_none() => {
                return Err(Error::path(format!("key '{last}' does not exist")));
            }
            _ => {}
        }
        if self.insert_member(current, &last, child) {
            Ok(child)
        } else {
            Err(Error::path("cannot attach at this reference"))
        }
    }

    /// Swap a freshly ensured array slot for the caller's node.
    fn replace_slot(&mut self, array: NodeId, slot: NodeId, child: NodeId) -> Result<()> {
        let position = self
            .children(array)
            .iter()
            .position(|&existing| existing == slot)
            .ok_or_else(|| Error::path("array slot vanished"))?;
        self.free_subtree(slot);
        self.node_mut(child).parent = Some(array);
        self.node_mut(child).key = None;
        self.node_mut(array).children[position] = child;
        self.invalidate(array);
        Ok(())
    }

    // path-level convenience setters, all upserting

    pub fn put_null(&mut self, reference: &str) -> Result<NodeId> {
        let child = self.new_null();
        self.set_node(reference, child, SetMode::Upsert)
    }

    pub fn put_bool(&mut self, reference: &str, value: bool) -> Result<NodeId> {
        let child = self.new_bool(value);
        self.set_node(reference, child, SetMode::Upsert)
    }

    pub fn put_number(&mut self, reference: &str, value: f64) -> Result<NodeId> {
        let child = self.new_number(value);
        self.set_node(reference, child, SetMode::Upsert)
    }

    pub fn put_str(&mut self, reference: &str, value: &str) -> Result<NodeId> {
        let child = self.new_string(value);
        self.set_node(reference, child, SetMode::Upsert)
    }

    /// Remove the referenced subtree. Pure resolution: nothing is created
    /// on a miss, and the root cannot be removed.
    pub fn remove_path(&mut self, reference: &str) -> bool {
        match self.resolve(reference) {
            Some(target) => self.remove(target),
            None => false,
        }
    }

    // coercion accessors over a reference

    pub fn str_at(&self, reference: &str, default: &str) -> String {
        match self.resolve(reference) {
            Some(id) => self.str_or(id, default),
            None => default.to_string(),
        }
    }

    pub fn int_at(&self, reference: &str, default: i64) -> i64 {
        self.resolve(reference)
            .map_or(default, |id| self.int_or(id, default))
    }

    pub fn float_at(&self, reference: &str, default: f64) -> f64 {
        self.resolve(reference)
            .map_or(default, |id| self.float_or(id, default))
    }

    pub fn bool_at(&self, reference: &str, default: bool) -> bool {
        self.resolve(reference)
            .map_or(default, |id| self.bool_or(id, default))
    }
}
