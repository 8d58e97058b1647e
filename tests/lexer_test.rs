use proptest::prelude::*;
use snek::lexer::{Lexer, LexerErrorKind, Token};

fn lex_all(input: &str) -> Vec<Token> {
    let mut scanner = Lexer::new(input.as_bytes()).expect("Lexing should succeed");
    let mut tokens = vec![scanner.current_token().clone()];
    while !matches!(tokens.last(), Some(Token::Eof)) {
        tokens.push(scanner.next_token().expect("Lexing should succeed"));
    }
    tokens
}

fn lex_until_error(input: &str) -> LexerErrorKind {
    let mut scanner = match Lexer::new(input.as_bytes()) {
        Ok(scanner) => scanner,
        Err(error) => return error.kind,
    };
    loop {
        match scanner.next_token() {
            Ok(Token::Eof) => panic!("Expected a lexer error but reached Eof"),
            Ok(_) => {}
            Err(error) => return error.kind,
        }
    }
}

fn check(input: &str, expected: &str, test_name: &str) {
    let trace: Vec<String> = lex_all(input).iter().map(|t| t.to_string()).collect();
    assert_eq!(trace.join("\n"), expected, "Failed the test {test_name}");
}

#[test]
fn smoke_test() {
    check("", "Eof", "smoke");
}

#[test]
fn lexes_assignment() {
    check(
        "x = 1\n",
        "Id{x}\nChar{=}\nNumber{1}\nNewline\nEof",
        "assignment",
    );
}

#[test]
fn lexes_arithmetic() {
    check(
        "print 1 + 2 * 3\n",
        "Print\nNumber{1}\nChar{+}\nNumber{2}\nChar{*}\nNumber{3}\nNewline\nEof",
        "arithmetic",
    );
}

#[test]
fn lexes_indented_block() {
    check(
        "if x:\n  y = 1\nz = 2\n",
        "If\nId{x}\nChar{:}\nNewline\nIndent\nId{y}\nChar{=}\nNumber{1}\nNewline\nDedent\nId{z}\nChar{=}\nNumber{2}\nNewline\nEof",
        "indented block",
    );
}

#[test]
fn lexes_dedent_chain() {
    check(
        "class A:\n  def m():\n    return 1\nx = 1\n",
        "Class\nId{A}\nChar{:}\nNewline\nIndent\nDef\nId{m}\nChar{(}\nChar{)}\nChar{:}\nNewline\nIndent\nReturn\nNumber{1}\nNewline\nDedent\nDedent\nId{x}\nChar{=}\nNumber{1}\nNewline\nEof",
        "dedent chain",
    );
}

#[test]
fn normalizes_end_of_input() {
    // A missing final newline still produces Newline, the open Dedent and Eof.
    check(
        "if x:\n  y = 1",
        "If\nId{x}\nChar{:}\nNewline\nIndent\nId{y}\nChar{=}\nNumber{1}\nNewline\nDedent\nEof",
        "eof normalization",
    );
}

#[test]
fn skips_comments_and_blank_lines() {
    check(
        "# leading comment\nx = 1 # trailing\n# whole-line comment\n\ny = 2\n",
        "Id{x}\nChar{=}\nNumber{1}\nNewline\nId{y}\nChar{=}\nNumber{2}\nNewline\nEof",
        "comments",
    );
}

#[test]
fn comment_only_file_is_empty() {
    check("# nothing here\n# or here\n", "Eof", "comment only");
}

#[test]
fn indented_comment_lines_do_not_affect_depth() {
    check(
        "if x:\n  y = 1\n    # deep comment\nz = 2\n",
        "If\nId{x}\nChar{:}\nNewline\nIndent\nId{y}\nChar{=}\nNumber{1}\nNewline\nDedent\nId{z}\nChar{=}\nNumber{2}\nNewline\nEof",
        "indented comment",
    );
}

#[test]
fn fuses_relational_operators() {
    check(
        "a == b != c <= d >= e < f > g = h\n",
        "Id{a}\nEq\nId{b}\nNotEq\nId{c}\nLessOrEq\nId{d}\nGreaterOrEq\nId{e}\nChar{<}\nId{f}\nChar{>}\nId{g}\nChar{=}\nId{h}\nNewline\nEof",
        "relational fusion",
    );
}

#[test]
fn lexes_string_escapes() {
    let tokens = lex_all("s = 'a\\nb\\tc\\\\d\\'e'\n");
    assert_eq!(
        tokens,
        vec![
            Token::Id("s".into()),
            Token::Char(b'='),
            Token::String("a\nb\tc\\d'e".into()),
            Token::Newline,
            Token::Eof,
        ]
    );
}

#[test]
fn lexes_both_quote_styles() {
    let tokens = lex_all("print 'it\\'s', \"a \\\"quote\\\"\"\n");
    assert_eq!(
        tokens,
        vec![
            Token::Print,
            Token::String("it's".into()),
            Token::Char(b','),
            Token::String("a \"quote\"".into()),
            Token::Newline,
            Token::Eof,
        ]
    );
}

#[test]
fn number_stops_at_punctuation() {
    check(
        "f(1,2)\n",
        "Id{f}\nChar{(}\nNumber{1}\nChar{,}\nNumber{2}\nChar{)}\nNewline\nEof",
        "number punctuation",
    );
}

#[test]
fn rejects_unterminated_string() {
    assert_eq!(
        lex_until_error("s = 'abc"),
        LexerErrorKind::UnterminatedString
    );
    assert_eq!(
        lex_until_error("s = 'ab\ncd'"),
        LexerErrorKind::UnterminatedString
    );
}

#[test]
fn rejects_malformed_number() {
    assert_eq!(lex_until_error("12ab\n"), LexerErrorKind::MalformedNumber);
}

#[test]
fn rejects_unknown_bytes() {
    assert_eq!(lex_until_error("x = $\n"), LexerErrorKind::Unrecognized('$'));
    // Tabs are never indentation and fail as ordinary unrecognized bytes.
    assert_eq!(
        lex_until_error("x =\t1\n"),
        LexerErrorKind::Unrecognized('\t')
    );
}

#[test]
fn lexes_all_keywords() {
    check(
        "class return if else def print and or not None True False\n",
        "Class\nReturn\nIf\nElse\nDef\nPrint\nAnd\nOr\nNot\nNone\nTrue\nFalse\nNewline\nEof",
        "keywords",
    );
}

#[test]
fn keyword_lookalikes_are_identifiers() {
    check(
        "classy ifx Nones\n",
        "Id{classy}\nId{ifx}\nId{Nones}\nNewline\nEof",
        "keyword lookalikes",
    );
}

#[test]
fn expect_interface() {
    let mut lexer = Lexer::new("x = 42\n".as_bytes()).expect("Lexing should succeed");
    assert_eq!(lexer.expect_id().unwrap(), "x");
    assert!(lexer.expect_number().is_err());
    lexer.expect_next_char(b'=').unwrap();
    assert_eq!(lexer.expect_next_number().unwrap(), 42);
    lexer.expect_next_token(&Token::Newline).unwrap();
}

#[test]
fn expect_char_fails_on_payload_mismatch() {
    let lexer = Lexer::new("(".as_bytes()).expect("Lexing should succeed");
    assert!(lexer.expect_char(b'(').is_ok());
    // The payload-checking form fails loudly on a wrong payload as well as on
    // a wrong variant.
    assert!(lexer.expect_char(b')').is_err());
    assert!(lexer.expect_number().is_err());
}

#[test]
fn eof_is_sticky() {
    let mut lexer = Lexer::new("x\n".as_bytes()).expect("Lexing should succeed");
    while !matches!(lexer.current_token(), Token::Eof) {
        lexer.next_token().expect("Lexing should succeed");
    }
    for _ in 0..3 {
        assert_eq!(lexer.next_token().expect("Eof repeats"), Token::Eof);
    }
}

#[test]
fn token_history_is_retained() {
    let mut lexer = Lexer::new("x = 1\n".as_bytes()).expect("Lexing should succeed");
    while !matches!(lexer.current_token(), Token::Eof) {
        lexer.next_token().expect("Lexing should succeed");
    }
    assert_eq!(
        lexer.tokens(),
        &[
            Token::Id("x".into()),
            Token::Char(b'='),
            Token::Number(1),
            Token::Newline,
            Token::Eof,
        ]
    );
}

// The printed trace of a token sequence re-parses to an equal sequence.

fn parse_trace_line(line: &str) -> Token {
    if let Some(payload) = line.strip_prefix("Number{").and_then(|r| r.strip_suffix('}')) {
        return Token::Number(payload.parse().expect("Traced numbers re-parse"));
    }
    if let Some(payload) = line.strip_prefix("Id{").and_then(|r| r.strip_suffix('}')) {
        return Token::Id(payload.into());
    }
    if let Some(payload) = line.strip_prefix("String{").and_then(|r| r.strip_suffix('}')) {
        return Token::String(payload.into());
    }
    if let Some(payload) = line.strip_prefix("Char{").and_then(|r| r.strip_suffix('}')) {
        return Token::Char(payload.as_bytes()[0]);
    }
    match line {
        "Class" => Token::Class,
        "Return" => Token::Return,
        "If" => Token::If,
        "Else" => Token::Else,
        "Def" => Token::Def,
        "Print" => Token::Print,
        "And" => Token::And,
        "Or" => Token::Or,
        "Not" => Token::Not,
        "None" => Token::None,
        "True" => Token::True,
        "False" => Token::False,
        "Newline" => Token::Newline,
        "Indent" => Token::Indent,
        "Dedent" => Token::Dedent,
        "Eq" => Token::Eq,
        "NotEq" => Token::NotEq,
        "LessOrEq" => Token::LessOrEq,
        "GreaterOrEq" => Token::GreaterOrEq,
        "Eof" => Token::Eof,
        other => panic!("Unknown token trace line {other:?}"),
    }
}

#[test]
fn token_trace_round_trips() {
    let source = "class Counter:\n  def inc(by):\n    self.n = self.n + by\n    return self.n\nc = Counter()\nprint c.inc(2) <= 3, 'ok'\n";
    let tokens = lex_all(source);
    let reparsed: Vec<Token> = tokens
        .iter()
        .map(|t| parse_trace_line(&t.to_string()))
        .collect();
    assert_eq!(tokens, reparsed);
}

// Property-based tests

fn keyword_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("and".to_string()),
        Just("class".to_string()),
        Just("def".to_string()),
        Just("else".to_string()),
        Just("if".to_string()),
        Just("not".to_string()),
        Just("or".to_string()),
        Just("print".to_string()),
        Just("return".to_string()),
        Just("False".to_string()),
        Just("None".to_string()),
        Just("True".to_string()),
    ]
}

fn program_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec((0usize..4, "[a-z][a-z0-9_]{0,4}"), 1..20).prop_map(|lines| {
        lines
            .into_iter()
            .map(|(indent, name)| format!("{}{} = 1", "  ".repeat(indent), name))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

proptest! {
    #[test]
    fn next_token_is_total(input in program_strategy()) {
        let mut scanner = Lexer::new(input.as_bytes()).expect("Lexing should succeed");
        let mut steps = 0usize;
        while !matches!(scanner.current_token(), Token::Eof) {
            scanner.next_token().expect("Lexing should succeed");
            steps += 1;
            prop_assert!(steps < 10_000);
        }
        for _ in 0..3 {
            prop_assert_eq!(scanner.next_token().expect("Eof repeats"), Token::Eof);
        }
    }

    #[test]
    fn indents_and_dedents_balance(input in program_strategy()) {
        let tokens = lex_all(&input);
        let indents = tokens.iter().filter(|t| matches!(t, Token::Indent)).count();
        let dedents = tokens.iter().filter(|t| matches!(t, Token::Dedent)).count();
        prop_assert_eq!(indents, dedents);
    }

    #[test]
    fn keywords_never_lex_as_identifiers(keyword in keyword_strategy()) {
        let tokens = lex_all(&format!("{keyword}\n"));
        prop_assert!(!tokens.iter().any(|t| matches!(t, Token::Id(_))));
    }

    #[test]
    fn identifiers_never_lex_as_keywords(name in "[a-z_][a-z0-9_]{0,8}") {
        prop_assume!(!snek::lexer::KEYWORD_HASHMAP.contains_key(name.as_str()));
        let tokens = lex_all(&format!("{name}\n"));
        prop_assert_eq!(&tokens[0], &Token::Id(name.as_str().into()));
    }
}
