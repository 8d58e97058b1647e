use super::token::Token;
use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexerErrorKind {
    #[error("Unrecognized byte {0:?}")]
    Unrecognized(char),
    #[error("Malformed number literal")]
    MalformedNumber,
    #[error("Unterminated string literal")]
    UnterminatedString,
    #[error("Expected {expected} but got {actual}")]
    Expect {
        expected: CompactString,
        actual: Token,
    },
    #[error("Failed to read source: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind}")]
pub struct LexerError {
    #[source]
    pub kind: LexerErrorKind,
    /// 1-based source line the error was detected on.
    pub line: u32,
    /// Byte offset just past the offending input.
    pub offset: usize,
}

impl LexerError {
    pub fn code(&self) -> &'static str {
        match self.kind {
            LexerErrorKind::Unrecognized(_) => "LX001",
            LexerErrorKind::MalformedNumber => "LX002",
            LexerErrorKind::UnterminatedString => "LX003",
            LexerErrorKind::Expect { .. } => "LX004",
            LexerErrorKind::Io(_) => "LX005",
        }
    }
}
