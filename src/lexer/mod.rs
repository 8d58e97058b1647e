mod error;
pub mod formatter;
mod token;

pub use error::{LexerError, LexerErrorKind};
pub use token::{Token, KEYWORD_HASHMAP};

use compact_str::{format_compact, CompactString};
use std::io::Read;

/// A stream-driven tokenizer for the language.
///
/// The lexer reads its input one byte at a time with a single byte of
/// pushback and synthesizes `Newline` / `Indent` / `Dedent` tokens from the
/// line structure of the source. Every produced token is appended to an
/// internal history so that `current_token` is always defined; construction
/// eagerly lexes the first token.
pub struct Lexer<R> {
    input: std::io::Bytes<R>,
    pushback: Option<u8>,
    tokens: Vec<Token>,
    /// Count of logical indentation levels (one level = two leading spaces).
    depth: usize,
    /// Target depth of an in-progress dedent chain.
    pending_depth: usize,
    dedent_chain: bool,
    line: u32,
    offset: usize,
}

impl<R: Read> Lexer<R> {
    pub fn new(input: R) -> Result<Self, LexerError> {
        let mut lexer = Self {
            input: input.bytes(),
            pushback: None,
            tokens: Vec::new(),
            depth: 0,
            pending_depth: 0,
            dedent_chain: false,
            line: 1,
            offset: 0,
        };
        lexer.next_token()?;
        Ok(lexer)
    }

    /// The last token produced. Defined from construction onwards.
    pub fn current_token(&self) -> &Token {
        self.tokens
            .last()
            .expect("One token is lexed at construction.")
    }

    /// Every token produced so far, in order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// 1-based line of the input position the lexer has consumed up to.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Advances one token. Once `Eof` has been produced it is returned
    /// forever.
    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        if matches!(self.tokens.last(), Some(Token::Eof)) {
            return Ok(Token::Eof);
        }
        let token = self.lex()?;
        self.tokens.push(token.clone());
        Ok(token)
    }
}

// Byte cursor
impl<R: Read> Lexer<R> {
    fn read_byte(&mut self) -> Result<Option<u8>, LexerError> {
        let byte = match self.pushback.take() {
            Some(byte) => Some(byte),
            None => match self.input.next() {
                Some(Ok(byte)) => Some(byte),
                Some(Err(e)) => return Err(self.error(LexerErrorKind::Io(e.to_string()))),
                None => None,
            },
        };
        if let Some(byte) = byte {
            self.offset += 1;
            if byte == b'\n' {
                self.line += 1;
            }
        }
        Ok(byte)
    }

    fn put_back(&mut self, byte: u8) {
        self.offset -= 1;
        if byte == b'\n' {
            self.line -= 1;
        }
        self.pushback = Some(byte);
    }

    fn error(&self, kind: LexerErrorKind) -> LexerError {
        LexerError {
            kind,
            line: self.line,
            offset: self.offset,
        }
    }
}

// Tokenization
impl<R: Read> Lexer<R> {
    fn lex(&mut self) -> Result<Token, LexerError> {
        if self.dedent_chain {
            self.depth -= 1;
            if self.depth == self.pending_depth {
                self.dedent_chain = false;
            }
            return Ok(Token::Dedent);
        }

        // At the start of a logical line, measure indentation first.
        if matches!(self.tokens.last(), None | Some(Token::Newline)) {
            let Some(spaces) = self.scan_line_start()? else {
                return Ok(self.finish());
            };
            let level = spaces / 2;
            if level > self.depth {
                // Only one level of increase is legal per line; deeper
                // indentation is tolerated but not counted further.
                self.depth += 1;
                return Ok(Token::Indent);
            }
            if level < self.depth {
                self.depth -= 1;
                self.pending_depth = level;
                self.dedent_chain = self.depth > level;
                return Ok(Token::Dedent);
            }
        }

        self.skip_spaces()?;
        let Some(byte) = self.read_byte()? else {
            return Ok(self.finish());
        };

        match byte {
            b'\n' => Ok(Token::Newline),
            b'#' => {
                self.skip_comment()?;
                // A trailing comment still terminates its line.
                Ok(Token::Newline)
            }
            b'0'..=b'9' => self.lex_number(byte),
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.lex_id_or_keyword(byte),
            b'\'' | b'"' => self.lex_string(byte),
            b'=' | b'!' | b'<' | b'>' => self.lex_relational(byte),
            b'.' | b',' | b'(' | b')' | b'*' | b'/' | b'+' | b'-' | b':' | b';' => {
                Ok(Token::Char(byte))
            }
            other => Err(self.error(LexerErrorKind::Unrecognized(other as char))),
        }
    }

    /// End-of-input normalization: a terminating `Newline` unless the stream
    /// already ended on one (or on a `Dedent`), then one `Dedent` per open
    /// indentation level, then `Eof`.
    fn finish(&mut self) -> Token {
        match self.tokens.last() {
            None | Some(Token::Newline) | Some(Token::Dedent) | Some(Token::Eof) => {}
            _ => return Token::Newline,
        }
        if self.depth > 0 {
            self.depth -= 1;
            return Token::Dedent;
        }
        Token::Eof
    }

    /// Skips blank and comment-only lines after a newline and measures the
    /// leading space count of the first line with content. The first content
    /// byte is pushed back. Returns `None` at end of input.
    fn scan_line_start(&mut self) -> Result<Option<usize>, LexerError> {
        let mut spaces = 0usize;
        while let Some(byte) = self.read_byte()? {
            match byte {
                b' ' => spaces += 1,
                b'\n' => spaces = 0,
                b'#' => {
                    self.skip_comment()?;
                    spaces = 0;
                }
                _ => {
                    self.put_back(byte);
                    return Ok(Some(spaces));
                }
            }
        }
        Ok(None)
    }

    /// Consumes a comment through its terminating newline.
    fn skip_comment(&mut self) -> Result<(), LexerError> {
        while let Some(byte) = self.read_byte()? {
            if byte == b'\n' {
                break;
            }
        }
        Ok(())
    }

    fn skip_spaces(&mut self) -> Result<(), LexerError> {
        while let Some(byte) = self.read_byte()? {
            if byte != b' ' {
                self.put_back(byte);
                break;
            }
        }
        Ok(())
    }

    fn lex_number(&mut self, first: u8) -> Result<Token, LexerError> {
        let mut digits = CompactString::default();
        digits.push(first as char);
        while let Some(byte) = self.read_byte()? {
            match byte {
                b'0'..=b'9' => digits.push(byte as char),
                b' ' | b'#' | b'\n' | b'.' | b',' | b'(' | b')' | b'*' | b'/' | b'+' | b'-'
                | b':' | b';' => {
                    self.put_back(byte);
                    break;
                }
                _ => return Err(self.error(LexerErrorKind::MalformedNumber)),
            }
        }
        let value = digits
            .parse::<i64>()
            .map_err(|_| self.error(LexerErrorKind::MalformedNumber))?;
        Ok(Token::Number(value))
    }

    fn lex_id_or_keyword(&mut self, first: u8) -> Result<Token, LexerError> {
        let mut lexeme = CompactString::default();
        lexeme.push(first as char);
        while let Some(byte) = self.read_byte()? {
            if byte.is_ascii_alphanumeric() || byte == b'_' {
                lexeme.push(byte as char);
            } else {
                self.put_back(byte);
                break;
            }
        }
        Ok(KEYWORD_HASHMAP
            .get(lexeme.as_str())
            .cloned()
            .unwrap_or(Token::Id(lexeme)))
    }

    fn lex_string(&mut self, quote: u8) -> Result<Token, LexerError> {
        let mut value = CompactString::default();
        loop {
            let Some(byte) = self.read_byte()? else {
                return Err(self.error(LexerErrorKind::UnterminatedString));
            };
            if byte == quote {
                return Ok(Token::String(value));
            }
            match byte {
                b'\n' => return Err(self.error(LexerErrorKind::UnterminatedString)),
                b'\\' => {
                    let Some(escaped) = self.read_byte()? else {
                        return Err(self.error(LexerErrorKind::UnterminatedString));
                    };
                    match escaped {
                        b'n' => value.push('\n'),
                        b't' => value.push('\t'),
                        other => value.push(other as char),
                    }
                }
                other => value.push(other as char),
            }
        }
    }

    /// `= ! < >` fuse with a trailing `=` into the two-character relational
    /// tokens; otherwise they are emitted bare as `Char`.
    fn lex_relational(&mut self, first: u8) -> Result<Token, LexerError> {
        match self.read_byte()? {
            Some(b'=') => Ok(match first {
                b'=' => Token::Eq,
                b'!' => Token::NotEq,
                b'<' => Token::LessOrEq,
                _ => Token::GreaterOrEq,
            }),
            Some(other) => {
                self.put_back(other);
                Ok(Token::Char(first))
            }
            None => Ok(Token::Char(first)),
        }
    }
}

// Typed expectations over the current token. The payload-checking forms fail
// both when the variant mismatches and when the payload does.
impl<R: Read> Lexer<R> {
    fn expect_error(&self, expected: impl Into<CompactString>) -> LexerError {
        self.error(LexerErrorKind::Expect {
            expected: expected.into(),
            actual: self.current_token().clone(),
        })
    }

    pub fn expect_number(&self) -> Result<i64, LexerError> {
        match self.current_token() {
            Token::Number(value) => Ok(*value),
            _ => Err(self.expect_error("Number")),
        }
    }

    pub fn expect_id(&self) -> Result<&str, LexerError> {
        match self.current_token() {
            Token::Id(value) => Ok(value.as_str()),
            _ => Err(self.expect_error("Id")),
        }
    }

    pub fn expect_string(&self) -> Result<&str, LexerError> {
        match self.current_token() {
            Token::String(value) => Ok(value.as_str()),
            _ => Err(self.expect_error("String")),
        }
    }

    pub fn expect_char(&self, expected: u8) -> Result<(), LexerError> {
        match self.current_token() {
            Token::Char(c) if *c == expected => Ok(()),
            _ => Err(self.expect_error(format_compact!("Char{{{}}}", expected as char))),
        }
    }

    pub fn expect_token(&self, expected: &Token) -> Result<(), LexerError> {
        if self.current_token() == expected {
            Ok(())
        } else {
            Err(self.expect_error(format_compact!("{expected}")))
        }
    }

    pub fn expect_next_number(&mut self) -> Result<i64, LexerError> {
        self.next_token()?;
        self.expect_number()
    }

    pub fn expect_next_id(&mut self) -> Result<&str, LexerError> {
        self.next_token()?;
        self.expect_id()
    }

    pub fn expect_next_string(&mut self) -> Result<&str, LexerError> {
        self.next_token()?;
        self.expect_string()
    }

    pub fn expect_next_char(&mut self, expected: u8) -> Result<(), LexerError> {
        self.next_token()?;
        self.expect_char(expected)
    }

    pub fn expect_next_token(&mut self, expected: &Token) -> Result<(), LexerError> {
        self.next_token()?;
        self.expect_token(expected)
    }
}
