use compact_str::CompactString;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::LazyLock;

/// The hashmap for keywords
pub static KEYWORD_HASHMAP: LazyLock<HashMap<&'static str, Token>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert("and", Token::And);
    map.insert("class", Token::Class);
    map.insert("def", Token::Def);
    map.insert("else", Token::Else);
    map.insert("if", Token::If);
    map.insert("not", Token::Not);
    map.insert("or", Token::Or);
    map.insert("print", Token::Print);
    map.insert("return", Token::Return);
    map.insert("False", Token::False);
    map.insert("None", Token::None);
    map.insert("True", Token::True);
    map
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    // Literals
    Number(i64),
    Id(CompactString),
    String(CompactString),
    /// A single punctuation character or an unfused relational character.
    Char(u8),
    // Keywords
    Class,
    Return,
    If,
    Else,
    Def,
    Print,
    And,
    Or,
    Not,
    None,
    True,
    False,
    // Line structure
    Newline,
    Indent,
    Dedent,
    // Fused relational operators
    Eq,
    NotEq,
    LessOrEq,
    GreaterOrEq,
    // End of file.
    Eof,
}

impl Token {
    /// The variant name used in token traces and expectation errors.
    pub fn name(&self) -> &'static str {
        match self {
            Token::Number(_) => "Number",
            Token::Id(_) => "Id",
            Token::String(_) => "String",
            Token::Char(_) => "Char",
            Token::Class => "Class",
            Token::Return => "Return",
            Token::If => "If",
            Token::Else => "Else",
            Token::Def => "Def",
            Token::Print => "Print",
            Token::And => "And",
            Token::Or => "Or",
            Token::Not => "Not",
            Token::None => "None",
            Token::True => "True",
            Token::False => "False",
            Token::Newline => "Newline",
            Token::Indent => "Indent",
            Token::Dedent => "Dedent",
            Token::Eq => "Eq",
            Token::NotEq => "NotEq",
            Token::LessOrEq => "LessOrEq",
            Token::GreaterOrEq => "GreaterOrEq",
            Token::Eof => "Eof",
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(value) => write!(f, "Number{{{value}}}"),
            Token::Id(value) => write!(f, "Id{{{value}}}"),
            Token::String(value) => write!(f, "String{{{value}}}"),
            Token::Char(value) => write!(f, "Char{{{}}}", *value as char),
            other => write!(f, "{}", other.name()),
        }
    }
}
