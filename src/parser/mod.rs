mod error;

pub use error::{ParserError, ParserErrorKind};

use crate::lexer::{Lexer, Token};
use crate::runtime::{Class, Comparator, Method};
use crate::statement::Statement;
use compact_str::CompactString;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

/// A parsed program: the top-level statements in source order.
#[derive(Debug)]
pub struct Program {
    statements: Vec<Statement>,
}

impl Program {
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn into_statements(self) -> Vec<Statement> {
        self.statements
    }
}

/// Recursive-descent parser over the lexer's lookahead/expect surface.
///
/// Classes are registered as they are defined so that instantiations and
/// parent references resolve to their `Class` at parse time.
pub struct Parser<R> {
    lexer: Lexer<R>,
    classes: HashMap<CompactString, Arc<Class>>,
}

impl<R: Read> Parser<R> {
    pub fn new(input: R) -> Result<Self, ParserError> {
        Ok(Self {
            lexer: Lexer::new(input)?,
            classes: HashMap::new(),
        })
    }

    pub fn parse(mut self) -> Result<Program, ParserError> {
        let mut statements = Vec::new();
        while !matches!(self.lexer.current_token(), Token::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(Program { statements })
    }
}

// Token consumption helpers
impl<R: Read> Parser<R> {
    fn advance(&mut self) -> Result<(), ParserError> {
        self.lexer.next_token()?;
        Ok(())
    }

    fn eat_char(&mut self, expected: u8) -> Result<(), ParserError> {
        self.lexer.expect_char(expected)?;
        self.advance()
    }

    fn eat_token(&mut self, expected: &Token) -> Result<(), ParserError> {
        self.lexer.expect_token(expected)?;
        self.advance()
    }

    fn eat_if_char(&mut self, expected: u8) -> Result<bool, ParserError> {
        if matches!(self.lexer.current_token(), Token::Char(c) if *c == expected) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn eat_if_token(&mut self, expected: &Token) -> Result<bool, ParserError> {
        if self.lexer.current_token() == expected {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consumes an identifier and returns its name.
    fn eat_id(&mut self) -> Result<CompactString, ParserError> {
        let name: CompactString = self.lexer.expect_id()?.into();
        self.advance()?;
        Ok(name)
    }

    /// Consumes the `Newline` that terminates a simple statement.
    fn end_line(&mut self) -> Result<(), ParserError> {
        self.eat_token(&Token::Newline)
    }

    fn error(&self, kind: ParserErrorKind) -> ParserError {
        ParserError {
            kind,
            line: self.lexer.line(),
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParserError {
        self.error(ParserErrorKind::UnexpectedToken {
            actual: self.lexer.current_token().clone(),
            expected,
        })
    }
}

// Statements
impl<R: Read> Parser<R> {
    fn parse_statement(&mut self) -> Result<Statement, ParserError> {
        match self.lexer.current_token().clone() {
            Token::Class => self.parse_class_definition(),
            Token::If => self.parse_if(),
            Token::Print => self.parse_print(),
            Token::Return => self.parse_return(),
            _ => self.parse_simple_statement(),
        }
    }

    /// An assignment, a field assignment or a bare expression statement.
    fn parse_simple_statement(&mut self) -> Result<Statement, ParserError> {
        let expr = self.parse_expression()?;
        if !self.eat_if_char(b'=')? {
            self.end_line()?;
            return Ok(expr);
        }

        let Statement::VariableValue { mut dotted_ids } = expr else {
            return Err(self.error(ParserErrorKind::InvalidLValue));
        };
        let rv = Box::new(self.parse_expression()?);
        self.end_line()?;

        let last = dotted_ids
            .pop()
            .expect("Dotted chains contain at least one identifier.");
        if dotted_ids.is_empty() {
            Ok(Statement::Assignment { var: last, rv })
        } else {
            Ok(Statement::FieldAssignment {
                object: Box::new(Statement::VariableValue { dotted_ids }),
                field: last,
                rv,
            })
        }
    }

    fn parse_print(&mut self) -> Result<Statement, ParserError> {
        self.advance()?;
        let mut args = Vec::new();
        if !matches!(self.lexer.current_token(), Token::Newline) {
            loop {
                args.push(self.parse_expression()?);
                if !self.eat_if_char(b',')? {
                    break;
                }
            }
        }
        self.end_line()?;
        Ok(Statement::Print { args })
    }

    fn parse_return(&mut self) -> Result<Statement, ParserError> {
        self.advance()?;
        let statement = if matches!(self.lexer.current_token(), Token::Newline) {
            Box::new(Statement::None)
        } else {
            Box::new(self.parse_expression()?)
        };
        self.end_line()?;
        Ok(Statement::Return { statement })
    }

    fn parse_if(&mut self) -> Result<Statement, ParserError> {
        self.advance()?;
        let condition = Box::new(self.parse_expression()?);
        let if_body = Box::new(self.parse_suite()?);
        let else_body = if self.eat_if_token(&Token::Else)? {
            Some(Box::new(self.parse_suite()?))
        } else {
            None
        };
        Ok(Statement::IfElse {
            condition,
            if_body,
            else_body,
        })
    }

    /// `':' NEWLINE INDENT statement+ DEDENT`, as a `Compound`.
    fn parse_suite(&mut self) -> Result<Statement, ParserError> {
        self.eat_char(b':')?;
        self.eat_token(&Token::Newline)?;
        self.eat_token(&Token::Indent)?;
        let mut statements = Vec::new();
        while !matches!(self.lexer.current_token(), Token::Dedent) {
            statements.push(self.parse_statement()?);
        }
        self.advance()?;
        Ok(Statement::Compound { statements })
    }

    fn parse_class_definition(&mut self) -> Result<Statement, ParserError> {
        self.advance()?;
        let name = self.eat_id()?;
        let parent = if self.eat_if_char(b'(')? {
            let parent_name = self.eat_id()?;
            self.eat_char(b')')?;
            match self.classes.get(&parent_name).cloned() {
                Some(parent) => Some(parent),
                None => return Err(self.error(ParserErrorKind::UnknownClass(parent_name))),
            }
        } else {
            None
        };

        self.eat_char(b':')?;
        self.eat_token(&Token::Newline)?;
        self.eat_token(&Token::Indent)?;
        let mut methods = Vec::new();
        while !matches!(self.lexer.current_token(), Token::Dedent) {
            methods.push(self.parse_method()?);
        }
        self.advance()?;

        let class = Arc::new(Class::new(name.clone(), methods, parent));
        self.classes.insert(name, class.clone());
        Ok(Statement::ClassDefinition { class })
    }

    fn parse_method(&mut self) -> Result<Method, ParserError> {
        self.eat_token(&Token::Def)?;
        let name = self.eat_id()?;
        self.eat_char(b'(')?;
        let mut formal_params = Vec::new();
        if !matches!(self.lexer.current_token(), Token::Char(b')')) {
            loop {
                formal_params.push(self.eat_id()?);
                if !self.eat_if_char(b',')? {
                    break;
                }
            }
        }
        self.eat_char(b')')?;
        let body = self.parse_suite()?;
        Ok(Method {
            name,
            formal_params,
            body: Statement::MethodBody {
                body: Box::new(body),
            },
        })
    }
}

// Expressions, loosest binding first.
impl<R: Read> Parser<R> {
    fn parse_expression(&mut self) -> Result<Statement, ParserError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Statement, ParserError> {
        let mut lhs = self.parse_and()?;
        while self.eat_if_token(&Token::Or)? {
            let rhs = self.parse_and()?;
            lhs = Statement::Or {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Statement, ParserError> {
        let mut lhs = self.parse_not()?;
        while self.eat_if_token(&Token::And)? {
            let rhs = self.parse_not()?;
            lhs = Statement::And {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Statement, ParserError> {
        if self.eat_if_token(&Token::Not)? {
            Ok(Statement::Not {
                argument: Box::new(self.parse_not()?),
            })
        } else {
            self.parse_comparison()
        }
    }

    /// A single, non-chaining comparison.
    fn parse_comparison(&mut self) -> Result<Statement, ParserError> {
        let lhs = self.parse_additive()?;
        let cmp = match self.lexer.current_token() {
            Token::Eq => Some(Comparator::Equal),
            Token::NotEq => Some(Comparator::NotEqual),
            Token::Char(b'<') => Some(Comparator::Less),
            Token::Char(b'>') => Some(Comparator::Greater),
            Token::LessOrEq => Some(Comparator::LessOrEqual),
            Token::GreaterOrEq => Some(Comparator::GreaterOrEqual),
            _ => None,
        };
        let Some(cmp) = cmp else {
            return Ok(lhs);
        };
        self.advance()?;
        let rhs = self.parse_additive()?;
        Ok(Statement::Comparison {
            cmp,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_additive(&mut self) -> Result<Statement, ParserError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            if self.eat_if_char(b'+')? {
                let rhs = self.parse_multiplicative()?;
                lhs = Statement::Add {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
            } else if self.eat_if_char(b'-')? {
                let rhs = self.parse_multiplicative()?;
                lhs = Statement::Sub {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Statement, ParserError> {
        let mut lhs = self.parse_atom()?;
        loop {
            if self.eat_if_char(b'*')? {
                let rhs = self.parse_atom()?;
                lhs = Statement::Mult {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
            } else if self.eat_if_char(b'/')? {
                let rhs = self.parse_atom()?;
                lhs = Statement::Div {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Statement, ParserError> {
        let atom = match self.lexer.current_token().clone() {
            Token::Number(value) => {
                self.advance()?;
                Statement::NumericConst(value)
            }
            Token::String(value) => {
                self.advance()?;
                Statement::StringConst(value)
            }
            Token::True => {
                self.advance()?;
                Statement::BoolConst(true)
            }
            Token::False => {
                self.advance()?;
                Statement::BoolConst(false)
            }
            Token::None => {
                self.advance()?;
                Statement::None
            }
            Token::Char(b'(') => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.eat_char(b')')?;
                inner
            }
            Token::Id(first) => {
                self.advance()?;
                self.parse_chain(first)?
            }
            _ => return Err(self.unexpected("an expression")),
        };
        self.parse_postfix(atom)
    }

    /// The tail of an identifier chain: field reads, and an optional call
    /// which is a method call, a class instantiation or `str(...)`.
    fn parse_chain(&mut self, first: CompactString) -> Result<Statement, ParserError> {
        let mut ids = vec![first];
        while self.eat_if_char(b'.')? {
            ids.push(self.eat_id()?);
        }
        if !matches!(self.lexer.current_token(), Token::Char(b'(')) {
            return Ok(Statement::VariableValue { dotted_ids: ids });
        }

        self.advance()?;
        let args = self.parse_arguments()?;
        let last = ids
            .pop()
            .expect("Dotted chains contain at least one identifier.");
        if ids.is_empty() {
            if last == "str" {
                if args.len() != 1 {
                    return Err(self.error(ParserErrorKind::StringifyArity(args.len())));
                }
                let argument = args
                    .into_iter()
                    .next()
                    .expect("The argument count was just checked.");
                return Ok(Statement::Stringify {
                    argument: Box::new(argument),
                });
            }
            match self.classes.get(&last).cloned() {
                Some(class) => Ok(Statement::NewInstance { class, args }),
                None => Err(self.error(ParserErrorKind::UnknownClass(last))),
            }
        } else {
            Ok(Statement::MethodCall {
                object: Box::new(Statement::VariableValue { dotted_ids: ids }),
                method: last,
                args,
            })
        }
    }

    /// Method calls chained onto an arbitrary expression result.
    fn parse_postfix(&mut self, mut expr: Statement) -> Result<Statement, ParserError> {
        while self.eat_if_char(b'.')? {
            let method = self.eat_id()?;
            self.eat_char(b'(')?;
            let args = self.parse_arguments()?;
            expr = Statement::MethodCall {
                object: Box::new(expr),
                method,
                args,
            };
        }
        Ok(expr)
    }

    /// Call arguments; the opening parenthesis is already consumed and the
    /// closing one is consumed here.
    fn parse_arguments(&mut self) -> Result<Vec<Statement>, ParserError> {
        let mut args = Vec::new();
        if !matches!(self.lexer.current_token(), Token::Char(b')')) {
            loop {
                args.push(self.parse_expression()?);
                if !self.eat_if_char(b',')? {
                    break;
                }
            }
        }
        self.eat_char(b')')?;
        Ok(args)
    }
}
