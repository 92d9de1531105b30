use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use memchr::memchr;

use crate::doc::Document;
use crate::error::{Error, Result};
use crate::options::{ParseOptions, WriteOptions};

/// Collapse `\r\n` and bare `\r` to `\n`. Returns the input untouched when
/// there is nothing to do, which is the common case.
pub(crate) fn normalize_newlines(text: &str) -> String {
    if memchr(b'\r', text.as_bytes()).is_none() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(ch);
        }
    }
    out
}

impl Document {
    /// Read everything from `reader`, normalize line endings and parse.
    pub fn from_reader<R: Read>(mut reader: R, options: &ParseOptions) -> Result<Document> {
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(|err| Error::io(&err))?;
        Ok(Document::parse_with(&normalize_newlines(&text), options))
    }

    pub fn from_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Document> {
        let file = File::open(path.as_ref()).map_err(|err| Error::io(&err))?;
        Self::from_reader(file, options)
    }

    /// Serialize the root and write it out. A tree that refuses to
    /// serialize (a faulted root or descendant) writes nothing and
    /// reports the fault.
    pub fn to_writer<W: Write>(&mut self, mut writer: W, options: &WriteOptions) -> Result<()> {
        let root = self.root();
        let text = self.to_text_with(root, options);
        if let Some(fault) = self.fault(root) {
            return Err(Error::fault(fault, "document did not serialize"));
        }
        writer
            .write_all(text.as_bytes())
            .map_err(|err| Error::io(&err))
    }

    pub fn to_file(&mut self, path: impl AsRef<Path>, options: &WriteOptions) -> Result<()> {
        let file = File::create(path.as_ref()).map_err(|err| Error::io(&err))?;
        self.to_writer(file, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[rstest::rstest]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\r\nb\rc\nd"), "a\nb\nc\nd");
        assert_eq!(normalize_newlines("plain"), "plain");
        assert_eq!(normalize_newlines("\r\n\r\n"), "\n\n");
    }

    #[rstest::rstest]
    fn test_from_reader_parses_crlf_input() {
        let input = "{\r\n  \"a\": 1\r\n}";
        let doc = Document::from_reader(Cursor::new(input), &ParseOptions::default()).unwrap();
        assert_eq!(doc.status(doc.root()), 0);
        assert_eq!(doc.int_at("a", 0), 1);
    }

    #[rstest::rstest]
    fn test_from_reader_rejects_invalid_utf8() {
        let input: &[u8] = &[0x7b, 0xff, 0x7d];
        let result = Document::from_reader(Cursor::new(input), &ParseOptions::default());
        assert!(result.is_err());
    }

    #[rstest::rstest]
    fn test_to_writer_roundtrip() {
        let mut doc = Document::parse(r#"{"a": [1, 2]}"#);
        let mut out = Vec::new();
        doc.to_writer(&mut out, &WriteOptions::default()).unwrap();
        assert_eq!(out, br#"{"a": [1, 2]}"#);
    }

    #[rstest::rstest]
    fn test_to_writer_refuses_faulted_tree() {
        let mut doc = Document::parse("[1, 2");
        let mut out = Vec::new();
        let err = doc
            .to_writer(&mut out, &WriteOptions::default())
            .unwrap_err();
        assert!(err.code() < 0);
        assert!(out.is_empty());
    }

    #[rstest::rstest]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join("jsonflex_io_roundtrip.json");
        let mut doc = Document::parse(r#"{"k": "v"}"#);
        doc.to_file(&path, &WriteOptions::default()).unwrap();
        let back = Document::from_file(&path, &ParseOptions::default()).unwrap();
        assert_eq!(back.str_at("k", ""), "v");
        let _ = std::fs::remove_file(&path);
    }

    #[rstest::rstest]
    fn test_missing_file_is_an_io_error() {
        let result = Document::from_file(
            "/definitely/not/here.json",
            &ParseOptions::default(),
        );
        let err = result.unwrap_err();
        assert_eq!(err.code(), 0);
        assert!(err.to_string().contains("io error"));
    }
}
