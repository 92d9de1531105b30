use memchr::memchr;

use crate::error::{Fault, Location};

/// Byte cursor over the source text with line/column tracking.
///
/// The parser drives this one position at a time; the only multi-byte jumps
/// are comment skips, which stay inside `skip_*` so position accounting has
/// a single owner.
pub(crate) struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn location(&self) -> Location {
        Location {
            offset: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    pub fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    pub fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + ahead).copied()
    }

    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.src[start..end]
    }

    pub fn bump(&mut self) -> Option<char> {
        let ch = self.src[self.pos..].chars().next()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Consume to just past the next newline (or to the end).
    pub fn skip_line(&mut self) {
        match memchr(b'\n', &self.src.as_bytes()[self.pos..]) {
            Some(found) => {
                self.pos += found + 1;
                self.line += 1;
                self.column = 1;
            }
            None => {
                self.column += self.src[self.pos..].chars().count();
                self.pos = self.src.len();
            }
        }
    }

    /// Consume a `/* */` body, cursor on the `/*`. Returns whether the
    /// closing `*/` was found; an unterminated comment consumes the rest.
    pub fn skip_block_comment(&mut self) -> bool {
        self.bump();
        self.bump();
        loop {
            match self.bump() {
                None => return false,
                Some('*') if self.peek() == Some(b'/') => {
                    self.bump();
                    return true;
                }
                Some(_) => {}
            }
        }
    }

    /// Decode a quoted string, cursor on the opening quote. Handles the
    /// standard JSON escapes plus `\'`, including surrogate pairs.
    pub fn read_quoted(&mut self) -> Result<String, Fault> {
        let quote = match self.bump() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(Fault::UnterminatedString),
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(Fault::UnterminatedString),
                Some('\n') | Some('\r') => return Err(Fault::UnterminatedString),
                Some(ch) if ch == quote => return Ok(out),
                Some('\\') => out.push(self.read_escape()?),
                Some(ch) => out.push(ch),
            }
        }
    }

    fn read_escape(&mut self) -> Result<char, Fault> {
        match self.bump() {
            None => Err(Fault::UnterminatedString),
            Some('\\') => Ok('\\'),
            Some('/') => Ok('/'),
            Some('"') => Ok('"'),
            Some('\'') => Ok('\''),
            Some('t') => Ok('\t'),
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('b') => Ok('\u{0008}'),
            Some('f') => Ok('\u{000C}'),
            Some('u') => self.read_unicode_escape(),
            Some(_) => Err(Fault::BadEscape),
        }
    }

    fn read_unicode_escape(&mut self) -> Result<char, Fault> {
        let high = self.read_hex4()?;
        if (0xD800..=0xDBFF).contains(&high) {
            // high surrogate, the low half must follow immediately
            if self.bump() != Some('\\') || self.bump() != Some('u') {
                return Err(Fault::BadEscape);
            }
            let low = self.read_hex4()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(Fault::BadEscape);
            }
            let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
            return char::from_u32(combined).ok_or(Fault::BadEscape);
        }
        char::from_u32(high).ok_or(Fault::BadEscape)
    }

    fn read_hex4(&mut self) -> Result<u32, Fault> {
        let mut value = 0u32;
        for _ in 0..4 {
            let digit = match self.bump() {
                Some(ch) => ch.to_digit(16).ok_or(Fault::BadEscape)?,
                None => return Err(Fault::UnterminatedString),
            };
            value = (value << 4) | digit;
        }
        Ok(value)
    }
}
