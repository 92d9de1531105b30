pub mod cache;
pub mod compare;
pub mod diag;
pub mod doc;
mod dump;
pub mod error;
mod io;
pub mod node;
pub mod options;
mod parse;
pub mod path;
mod serialize;
pub mod template;

pub use crate::cache::DocumentCache;
pub use crate::compare::{SortKey, SortSpec};
pub use crate::diag::Diagnostics;
pub use crate::doc::{ClonePart, Document, NodeId, NodeIter};
pub use crate::error::{Error, Fault, Location, Result};
pub use crate::node::{FormatMeta, NodeKind};
pub use crate::options::{GrammarMode, ParseOptions, WriteOptions};
pub use crate::path::SetMode;
pub use crate::template::TemplateOptions;

pub fn parse(text: &str) -> Document {
    Document::parse(text)
}

pub fn parse_with(text: &str, options: &ParseOptions) -> Document {
    Document::parse_with(text, options)
}

pub fn parse_flex(text: &str) -> Document {
    Document::parse_with(text, &ParseOptions::flex())
}
