use super::{LexerError, LexerErrorKind, Token};
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::path::Path;

/// Interface for creating new token formatters.
pub trait TokenFormatter {
    /// Formats a token into a string.
    fn format(&self, token: &Token) -> String;
    /// Formats a lexer error into a string.
    fn format_lexer_error(&self, error: &LexerError) -> String;
}

/// Prints the token trace form, e.g. `Number{42}` or `Indent`.
pub struct BasicFormatter;

impl TokenFormatter for BasicFormatter {
    fn format(&self, token: &Token) -> String {
        format!("{token}")
    }

    fn format_lexer_error(&self, error: &LexerError) -> String {
        format!("[line {}] {}", error.line, error)
    }
}

pub struct DebugFormatter;

impl TokenFormatter for DebugFormatter {
    fn format(&self, token: &Token) -> String {
        format!("{token:?}")
    }

    fn format_lexer_error(&self, error: &LexerError) -> String {
        format!("{error:?}")
    }
}

/// Renders errors as labelled source reports.
pub struct PrettyFormatter<'src> {
    text: &'src str,
    path: &'src Path,
}

impl<'src> PrettyFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self { text, path }
    }
}

impl<'src> TokenFormatter for PrettyFormatter<'src> {
    fn format(&self, token: &Token) -> String {
        format!("{token}")
    }

    fn format_lexer_error(&self, error: &LexerError) -> String {
        let path = self
            .path
            .to_str()
            .expect("Non-UTF8 paths are not supported!");
        let range = error.offset.saturating_sub(1)..error.offset.max(1);
        let label = match &error.kind {
            LexerErrorKind::Unrecognized(c) => {
                format!("Unrecognized byte {}", format!("{c:?}").fg(Color::BrightRed))
            }
            other => other.to_string(),
        };
        let mut output = std::io::Cursor::new(Vec::new());
        Report::build(ReportKind::Error, path, range.start)
            .with_code(error.code())
            .with_message(error.to_string())
            .with_label(
                Label::new((path, range))
                    .with_message(label)
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(self.text)), &mut output)
            .expect("Write into buffer should not fail.");
        String::from_utf8(output.into_inner()).expect("Ariadne produces valid utf-8 strings.")
    }
}
