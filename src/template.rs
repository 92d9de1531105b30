use memchr::memchr;

use crate::doc::Document;
use crate::node::NodeKind;
use crate::serialize::format_number;

/// Substitution ceiling. Tags whose replacement text contains further tags
/// are expanded again, so a self-referential value would otherwise loop.
const MAX_DEPTH: usize = 8;

/// Options for `[[tag]]` expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateOptions {
    /// Leave unresolvable tags in place instead of dropping them.
    pub keep_unmatched: bool,
    /// How many re-expansion rounds a single tag's output may trigger.
    pub max_depth: usize,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            keep_unmatched: true,
            max_depth: MAX_DEPTH,
        }
    }
}

impl TemplateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keep_unmatched(mut self, keep: bool) -> Self {
        self.keep_unmatched = keep;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

impl Document {
    /// Replace every `[[reference]]` in `template` with the scalar value
    /// that reference resolves to in this document. References use the
    /// same dotted grammar as [`Document::resolve`]; replacements are
    /// expanded recursively up to the depth limit.
    pub fn expand_tags(&self, template: &str) -> String {
        self.expand_tags_with(template, &TemplateOptions::default())
    }

    pub fn expand_tags_with(&self, template: &str, options: &TemplateOptions) -> String {
        self.expand_level(template, options, options.max_depth)
    }

    fn expand_level(&self, template: &str, options: &TemplateOptions, depth: usize) -> String {
        let bytes = template.as_bytes();
        let mut out = String::with_capacity(template.len());
        let mut pos = 0;
        while pos < bytes.len() {
            let Some(open) = memchr(b'[', &bytes[pos..]).map(|found| pos + found) else {
                out.push_str(&template[pos..]);
                break;
            };
            out.push_str(&template[pos..open]);
            if bytes.get(open + 1) != Some(&b'[') {
                out.push('[');
                pos = open + 1;
                continue;
            }
            let Some(close) = find_closing(bytes, open + 2) else {
                // no ]] ahead, the rest is literal
                out.push_str(&template[open..]);
                break;
            };
            let reference = &template[open + 2..close];
            match self.tag_value(reference) {
                Some(value) if depth > 0 => {
                    out.push_str(&self.expand_level(&value, options, depth - 1));
                }
                Some(value) => out.push_str(&value),
                None if options.keep_unmatched => out.push_str(&template[open..close + 2]),
                None => {}
            }
            pos = close + 2;
        }
        out
    }

    /// A tag substitutes only scalar values; containers and faulted nodes
    /// leave the tag unresolved.
    fn tag_value(&self, reference: &str) -> Option<String> {
        let id = self.resolve(reference)?;
        if self.status(id) != 0 || self.is_unset(id) {
            return None;
        }
        match self.kind(id) {
            NodeKind::Null => Some(String::new()),
            NodeKind::Boolean => {
                let word = if self.bool_or(id, false) { "true" } else { "false" };
                Some(word.to_string())
            }
            NodeKind::Number => Some(format_number(self.float_or(id, 0.0))),
            NodeKind::String => Some(self.str_or(id, "")),
            NodeKind::Array | NodeKind::Object | NodeKind::Error => None,
        }
    }
}

fn find_closing(bytes: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    while let Some(found) = memchr(b']', &bytes[pos..]).map(|at| pos + at) {
        if bytes.get(found + 1) == Some(&b']') {
            return Some(found);
        }
        pos = found + 1;
    }
    None
}
