use smol_str::SmolStr;

use crate::doc::{Document, NodeId};
use crate::error::Fault;
use crate::node::{FormatMeta, Node, NodeKind, Scalar};
use crate::options::{GrammarMode, ParseOptions};

use super::scanner::Scanner;

/// Default step budget: generous multiple of the input length. The counter
/// exists to turn a would-be runaway loop on malformed input into a
/// reported fault, not to police well-formed documents.
fn default_step_limit(len: usize) -> usize {
    len.saturating_mul(16).saturating_add(256)
}

/// Containers may nest this deep before the parser gives up. The step
/// counter bounds total work; this bounds recursion so hostile input
/// cannot exhaust the call stack first.
const DEPTH_LIMIT: usize = 256;

pub(crate) struct Parser<'a, 'd> {
    cur: Scanner<'a>,
    doc: &'d mut Document,
    mode: GrammarMode,
    preserve: bool,
    steps: usize,
    limit: usize,
    depth: usize,
}

impl<'a, 'd> Parser<'a, 'd> {
    pub fn new(doc: &'d mut Document, text: &'a str, options: &ParseOptions) -> Self {
        Self {
            cur: Scanner::new(text),
            doc,
            mode: options.mode,
            preserve: options.preserve_formatting,
            steps: 0,
            limit: options.step_limit.unwrap_or_else(|| default_step_limit(text.len())),
            depth: 0,
        }
    }

    /// Guard one level of container recursion.
    fn descend(&mut self, id: NodeId) -> bool {
        if self.depth >= DEPTH_LIMIT {
            self.fail(id, Fault::StepLimit);
            return false;
        }
        self.depth += 1;
        true
    }

    fn step(&mut self, id: NodeId) -> bool {
        self.steps += 1;
        if self.steps > self.limit {
            self.fail(id, Fault::StepLimit);
            return false;
        }
        true
    }

    fn fail(&mut self, id: NodeId, fault: Fault) {
        let location = self.cur.location();
        self.doc.fail(id, fault, &location.to_string());
    }

    /// Parse one item into `id`, stopping (without consuming) at any of
    /// `terminators`. `must_be_key` forces bareword tokens to stay strings;
    /// `ok_to_clip` tolerates trailing text, keeping it as terminal
    /// formatting. A blank item leaves the node unset.
    pub fn parse_item(
        &mut self,
        id: NodeId,
        terminators: &[u8],
        must_be_key: bool,
        ok_to_clip: bool,
    ) {
        let mut pre = if self.preserve {
            Some(String::new())
        } else {
            None
        };

        // before-item: whitespace and (in Flex) comments
        loop {
            if !self.step(id) {
                return;
            }
            match self.cur.peek() {
                None => {
                    self.store_formatting(id, pre, None, None);
                    return;
                }
                Some(byte) if terminators.contains(&byte) => {
                    self.store_formatting(id, pre, None, None);
                    return;
                }
                Some(b' ' | b'\t' | b'\n' | b'\r') => {
                    let ch = self.cur.bump().unwrap_or(' ');
                    if let Some(buf) = pre.as_mut() {
                        buf.push(ch);
                    }
                }
                Some(b'/')
                    if self.mode.allows_comments()
                        && matches!(self.cur.peek_at(1), Some(b'/') | Some(b'*')) =>
                {
                    let start = self.cur.pos();
                    if self.cur.peek_at(1) == Some(b'/') {
                        self.cur.skip_line();
                    } else {
                        self.cur.skip_block_comment();
                    }
                    if let Some(buf) = pre.as_mut() {
                        buf.push_str(self.cur.slice(start, self.cur.pos()));
                    }
                }
                Some(_) => break,
            }
        }

        let start_location = self.cur.location();
        let start = self.cur.pos();
        match self.cur.peek() {
            Some(b'{') => {
                if self.descend(id) {
                    self.parse_object(id);
                    self.depth -= 1;
                }
            }
            Some(b'[') => {
                if self.descend(id) {
                    self.parse_array(id);
                    self.depth -= 1;
                }
            }
            Some(b'"') => self.parse_quoted(id),
            Some(b'\'') if self.mode.allows_single_quotes() => self.parse_quoted(id),
            Some(byte) if is_bareword_byte(byte) => self.parse_bareword(id, must_be_key),
            Some(_) | None => self.fail(id, Fault::BadLiteral),
        }
        if self.doc.fault(id).is_some() {
            self.store_formatting(id, pre, None, Some(start_location));
            return;
        }

        // the exact consumed slice becomes the cached text
        let end = self.cur.pos();
        {
            let node = self.doc.node_mut(id);
            node.text = Some(self.cur.slice(start, end).to_string());
            node.text_valid = true;
        }

        // after-item: whitespace/comments up to the terminator
        let mut trailing = if self.preserve {
            Some(String::new())
        } else {
            None
        };
        loop {
            if !self.step(id) {
                break;
            }
            match self.cur.peek() {
                None => break,
                Some(byte) if terminators.contains(&byte) => break,
                Some(b' ' | b'\t' | b'\n' | b'\r') => {
                    let ch = self.cur.bump().unwrap_or(' ');
                    if let Some(buf) = trailing.as_mut() {
                        buf.push(ch);
                    }
                }
                Some(b'/')
                    if self.mode.allows_comments()
                        && matches!(self.cur.peek_at(1), Some(b'/') | Some(b'*')) =>
                {
                    let from = self.cur.pos();
                    if self.cur.peek_at(1) == Some(b'/') {
                        self.cur.skip_line();
                    } else {
                        self.cur.skip_block_comment();
                    }
                    if let Some(buf) = trailing.as_mut() {
                        buf.push_str(self.cur.slice(from, self.cur.pos()));
                    }
                }
                Some(_) => {
                    if ok_to_clip {
                        let from = self.cur.pos();
                        while self.cur.bump().is_some() {}
                        if let Some(buf) = trailing.as_mut() {
                            buf.push_str(self.cur.slice(from, self.cur.pos()));
                        }
                    } else if terminators.is_empty() {
                        self.fail(id, Fault::TrailingText);
                    }
                    // inside a container the owner reports the missing
                    // delimiter itself
                    break;
                }
            }
        }
        self.store_formatting(id, pre, trailing, Some(start_location));
    }

    fn store_formatting(
        &mut self,
        id: NodeId,
        pre: Option<String>,
        trailing: Option<String>,
        location: Option<crate::error::Location>,
    ) {
        if !self.preserve {
            return;
        }
        let meta = FormatMeta {
            pre_key: String::new(),
            post_key: String::new(),
            pre_value: pre.unwrap_or_default(),
            trailing: trailing.unwrap_or_default(),
            location,
        };
        self.doc.node_mut(id).formatting = Some(meta);
    }

    fn parse_quoted(&mut self, id: NodeId) {
        match self.cur.read_quoted() {
            Ok(text) => {
                let node = self.doc.node_mut(id);
                node.kind = NodeKind::String;
                node.scalar = Scalar::Str(SmolStr::new(&text));
                node.value_valid = true;
            }
            Err(fault) => self.fail(id, fault),
        }
    }

    fn parse_bareword(&mut self, id: NodeId, must_be_key: bool) {
        let start = self.cur.pos();
        while matches!(self.cur.peek(), Some(byte) if is_bareword_byte(byte)) {
            self.cur.bump();
        }
        let word = self.cur.slice(start, self.cur.pos());

        if must_be_key {
            // keys always read as plain strings, but unquoted keys need
            // the bareword grammar
            if self.mode.allows_barewords() {
                let node = self.doc.node_mut(id);
                node.kind = NodeKind::String;
                node.scalar = Scalar::Str(SmolStr::new(word));
                node.value_valid = true;
            } else {
                self.fail(id, Fault::KeyNotString);
            }
            return;
        }

        if word.eq_ignore_ascii_case("null") {
            let node = self.doc.node_mut(id);
            node.kind = NodeKind::Null;
            node.value_valid = true;
            return;
        }
        if word.eq_ignore_ascii_case("true") || word.eq_ignore_ascii_case("false") {
            let node = self.doc.node_mut(id);
            node.kind = NodeKind::Boolean;
            node.scalar = Scalar::Bool(word.eq_ignore_ascii_case("true"));
            node.value_valid = true;
            return;
        }
        if word.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
            if let Ok(value) = word.parse::<f64>() {
                // f64::from_str accepts "inf"/"nan" spellings; a finite
                // check keeps those out
                if value.is_finite() {
                    let node = self.doc.node_mut(id);
                    node.kind = NodeKind::Number;
                    node.scalar = Scalar::Number(value);
                    node.value_valid = true;
                    return;
                }
            }
        }
        if self.mode.allows_barewords() {
            let node = self.doc.node_mut(id);
            node.kind = NodeKind::String;
            node.scalar = Scalar::Str(SmolStr::new(word));
            node.value_valid = true;
        } else {
            self.fail(id, Fault::BadLiteral);
        }
    }

    fn parse_object(&mut self, id: NodeId) {
        self.cur.bump(); // '{'
        {
            let node = self.doc.node_mut(id);
            node.kind = NodeKind::Object;
            node.value_valid = true;
        }
        let mut after_comma = false;
        loop {
            if !self.step(id) {
                return;
            }

            let key_id = self.doc.alloc(Node::unset());
            self.parse_item(key_id, &[b':', b'}'], true, false);
            if let Some(fault) = self.doc.fault(key_id) {
                self.doc.free_subtree(key_id);
                self.fail(id, fault);
                return;
            }
            if self.doc.node(key_id).is_unset() {
                // blank key: legal only right before '}'
                let key_meta = self.doc.node_mut(key_id).formatting.take();
                self.doc.free_subtree(key_id);
                if self.cur.peek() == Some(b'}') {
                    if after_comma && !self.mode.is_flex() {
                        self.fail(id, Fault::BadLiteral);
                        return;
                    }
                    self.cur.bump();
                    self.keep_container_tail(id, key_meta);
                    return;
                }
                self.fail(id, Fault::KeyNotString);
                return;
            }
            if self.doc.node(key_id).kind != NodeKind::String {
                self.doc.free_subtree(key_id);
                self.fail(id, Fault::KeyNotString);
                return;
            }
            let key = match &self.doc.node(key_id).scalar {
                Scalar::Str(s) => s.clone(),
                _ => SmolStr::default(),
            };
            let key_meta = self.doc.node_mut(key_id).formatting.take();
            self.doc.free_subtree(key_id);

            if self.cur.peek() != Some(b':') {
                self.fail(id, Fault::MissingColon);
                return;
            }
            self.cur.bump();

            let value_id = self.doc.alloc(Node::unset());
            self.parse_item(value_id, &[b',', b'}'], false, false);
            if self.preserve {
                let meta = self
                    .doc
                    .node_mut(value_id)
                    .formatting
                    .get_or_insert_with(FormatMeta::default);
                if let Some(key_meta) = key_meta {
                    meta.pre_key = key_meta.pre_value;
                    meta.post_key = key_meta.trailing;
                }
            }
            if let Some(fault) = self.doc.fault(value_id) {
                self.attach_member(id, key, value_id);
                self.fail(id, fault);
                return;
            }
            if self.doc.node(value_id).is_unset() {
                if self.mode.is_flex() {
                    self.doc.node_mut(value_id).value_valid = true;
                } else {
                    self.doc.free_subtree(value_id);
                    self.fail(id, Fault::BadLiteral);
                    return;
                }
            }
            self.attach_member(id, key, value_id);

            match self.cur.peek() {
                Some(b',') => {
                    self.cur.bump();
                    after_comma = true;
                }
                Some(b'}') => {
                    self.cur.bump();
                    return;
                }
                _ => {
                    self.fail(id, Fault::MissingDelimiter);
                    return;
                }
            }
        }
    }

    /// Attach a parsed member, replacing an existing key (last wins).
    fn attach_member(&mut self, obj: NodeId, key: SmolStr, child: NodeId) {
        {
            let node = self.doc.node_mut(child);
            node.parent = Some(obj);
            node.key = Some(key.clone());
        }
        let existing = self.doc.children(obj).iter().copied().position(|member| {
            self.doc
                .key(member)
                .is_some_and(|k| k.eq_ignore_ascii_case(&key))
        });
        match existing {
            Some(position) => {
                let old = self.doc.children(obj)[position];
                self.doc.free_subtree(old);
                self.doc.node_mut(obj).children[position] = child;
            }
            None => self.doc.node_mut(obj).children.push(child),
        }
    }

    /// Whitespace swallowed by the blank probe before a closing bracket
    /// belongs to the container's trailing formatting.
    fn keep_container_tail(&mut self, id: NodeId, blank_meta: Option<FormatMeta>) {
        if !self.preserve {
            return;
        }
        let Some(blank_meta) = blank_meta else { return };
        if blank_meta.pre_value.is_empty() {
            return;
        }
        let meta = self
            .doc
            .node_mut(id)
            .formatting
            .get_or_insert_with(FormatMeta::default);
        meta.trailing.push_str(&blank_meta.pre_value);
    }

    fn parse_array(&mut self, id: NodeId) {
        self.cur.bump(); // '['
        {
            let node = self.doc.node_mut(id);
            node.kind = NodeKind::Array;
            node.value_valid = true;
        }
        let mut after_comma = false;
        loop {
            if !self.step(id) {
                return;
            }

            let element = self.doc.alloc(Node::unset());
            self.parse_item(element, &[b',', b']'], false, false);
            if let Some(fault) = self.doc.fault(element) {
                self.attach_element(id, element);
                self.fail(id, fault);
                return;
            }
            if self.doc.node(element).is_unset() {
                let blank_meta = self.doc.node_mut(element).formatting.take();
                self.doc.free_subtree(element);
                match self.cur.peek() {
                    Some(b']') => {
                        if after_comma && !self.mode.is_flex() {
                            self.fail(id, Fault::BadLiteral);
                            return;
                        }
                        self.cur.bump();
                        self.keep_container_tail(id, blank_meta);
                        return;
                    }
                    Some(b',') if self.mode.is_flex() => {
                        // blank-as-null element
                        let null_id = self.doc.new_null();
                        self.attach_element(id, null_id);
                        self.cur.bump();
                        after_comma = true;
                        continue;
                    }
                    Some(b',') => {
                        self.fail(id, Fault::BadLiteral);
                        return;
                    }
                    _ => {
                        self.fail(id, Fault::MissingDelimiter);
                        return;
                    }
                }
            }
            self.attach_element(id, element);

            match self.cur.peek() {
                Some(b',') => {
                    self.cur.bump();
                    after_comma = true;
                }
                Some(b']') => {
                    self.cur.bump();
                    return;
                }
                _ => {
                    self.fail(id, Fault::MissingDelimiter);
                    return;
                }
            }
        }
    }

    fn attach_element(&mut self, array: NodeId, child: NodeId) {
        {
            let node = self.doc.node_mut(child);
            node.parent = Some(array);
            node.key = None;
        }
        self.doc.node_mut(array).children.push(child);
    }

    /// Finish a top-level parse: a blank root is null in Flex, a fault in
    /// strict mode.
    pub fn finish_root(&mut self, root: NodeId) {
        if self.doc.fault(root).is_some() {
            return;
        }
        if self.doc.node(root).is_unset() {
            if self.mode.is_flex() {
                self.doc.node_mut(root).value_valid = true;
            } else {
                self.fail(root, Fault::BadLiteral);
            }
        }
    }
}

// '+' is included so exponent signs ("1e+5") stay inside the token
fn is_bareword_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'+')
}
