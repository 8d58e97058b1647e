use crate::lexer::{LexerError, Token};
use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ParserErrorKind {
    #[error("Expected {expected} but got token {actual}")]
    UnexpectedToken {
        actual: Token,
        expected: &'static str,
    },
    #[error("Invalid assignment target")]
    InvalidLValue,
    #[error("Unknown class {0}")]
    UnknownClass(CompactString),
    #[error("str takes exactly one argument but got {0}")]
    StringifyArity(usize),
    #[error("Encountered a lexer error: {0}")]
    Lexer(#[from] LexerError),
}

#[derive(Debug, Error, Clone)]
#[error("[line {line}] {kind}")]
pub struct ParserError {
    #[source]
    pub kind: ParserErrorKind,
    pub line: u32,
}

impl From<LexerError> for ParserError {
    fn from(error: LexerError) -> Self {
        Self {
            line: error.line,
            kind: ParserErrorKind::Lexer(error),
        }
    }
}
