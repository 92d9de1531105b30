pub(crate) mod parser;
pub(crate) mod scanner;

use crate::doc::{Document, NodeId};
use crate::options::ParseOptions;

use parser::Parser;

impl Document {
    /// Parse strict JSON into a fresh document. Syntax problems never
    /// return an error here: they are recorded as a sticky status on the
    /// node where parsing stopped.
    pub fn parse(text: &str) -> Document {
        Self::parse_with(text, &ParseOptions::default())
    }

    pub fn parse_with(text: &str, options: &ParseOptions) -> Document {
        let mut doc = Document::new();
        doc.reparse(text, options);
        doc
    }

    /// Replace this document's contents with a fresh parse of `text`,
    /// keeping the root handle (and any attached diagnostics) stable.
    pub fn reparse(&mut self, text: &str, options: &ParseOptions) -> NodeId {
        self.tally("parse");
        let root = self.root();
        let children = std::mem::take(&mut self.node_mut(root).children);
        for child in children {
            self.free_subtree(child);
        }
        self.node_mut(root).reset();
        let mut parser = Parser::new(self, text, options);
        parser.parse_item(root, &[], false, options.clip_trailing);
        parser.finish_root(root);
        root
    }
}
