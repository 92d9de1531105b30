use std::fmt;

use thiserror::Error as ThisError;

/// Sticky per-node failure code.
///
/// Once a node carries a fault it never recovers: reads short-circuit to
/// caller-supplied defaults and mutations refuse to touch the node. Each
/// variant maps to a distinct negative integer, `0` meaning healthy.
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    #[error("malformed literal")]
    BadLiteral,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("invalid escape sequence")]
    BadEscape,
    #[error("missing ':' after object key")]
    MissingColon,
    #[error("missing ',' or closing bracket")]
    MissingDelimiter,
    #[error("object key is not a string")]
    KeyNotString,
    #[error("unexpected trailing text")]
    TrailingText,
    #[error("child failed to serialize")]
    ChildSerialize,
    #[error("invalid type for this operation")]
    BadType,
    #[error("step limit exceeded while parsing")]
    StepLimit,
}

impl Fault {
    /// The integer status code for this fault. Always negative.
    pub const fn code(self) -> i32 {
        match self {
            Fault::BadLiteral => -1,
            Fault::UnterminatedString => -2,
            Fault::BadEscape => -3,
            Fault::MissingColon => -4,
            Fault::MissingDelimiter => -5,
            Fault::KeyNotString => -6,
            Fault::TrailingText => -7,
            Fault::ChildSerialize => -8,
            Fault::BadType => -9,
            Fault::StepLimit => -10,
        }
    }
}

/// Source position: absolute byte offset plus 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Crate-level error for operations that return `Result` (IO, mutation
/// entry points). Node-level failures travel as [`Fault`] status instead.
#[derive(Debug, Clone)]
pub struct Error {
    pub fault: Option<Fault>,
    pub message: String,
    pub location: Option<Location>,
}

impl Error {
    pub fn fault(fault: Fault, message: impl Into<String>) -> Self {
        Self {
            fault: Some(fault),
            message: message.into(),
            location: None,
        }
    }

    pub fn io(err: &std::io::Error) -> Self {
        Self {
            fault: None,
            message: format!("io error: {err}"),
            location: None,
        }
    }

    pub fn path(message: impl Into<String>) -> Self {
        Self {
            fault: None,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// The numeric status code, `0` when no fault is attached.
    pub fn code(&self) -> i32 {
        self.fault.map_or(0, Fault::code)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "{} at {location}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
