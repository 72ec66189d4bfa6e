//! Recursive-descent parser for conditions and actions.
//!
//! Precedence, lowest first: `or`/`||`, `and`/`&&`, `not`/`!`, comparisons
//! (`==`, `!=`, `<`, `<=`, `>`, `>=`, `in`, non-associative), `+`/`-`,
//! `*`/`/`/`%`, unary `-`, primaries.

use super::ast::{BinaryOp, Builtin, Expr, Field, Program, Statement, UnaryOp};
use super::error::{ParseError, ParseErrorKind};
use super::lexer::{Token, TokenKind, tokenize};
use super::value::Value;

/// Deepest nesting of parentheses, calls, prefix operators and operator
/// chains a rule may use.
pub const MAX_DEPTH: usize = 64;

/// Parse a condition expression. Line breaks are insignificant.
///
/// # Errors
///
/// Returns a [`ParseError`] pointing at the offending token.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(source)?
        .into_iter()
        .filter(|t| t.kind != TokenKind::Newline)
        .collect();
    let mut parser = Parser::new(tokens);
    let expr = parser.expression()?;
    parser.expect_end("end of expression")?;
    Ok(expr)
}

/// Parse an action: controller calls separated by `;` or line breaks.
///
/// # Errors
///
/// Returns a [`ParseError`] pointing at the offending token, or
/// [`ParseErrorKind::EmptyProgram`] when there is nothing to run.
pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    let mut parser = Parser::new(tokenize(source)?);
    let mut statements = Vec::new();
    loop {
        while parser.eat_separator() {}
        if parser.at_end() {
            break;
        }
        statements.push(parser.statement()?);
        if !parser.eat_separator() && !parser.at_end() {
            return Err(parser.unexpected("`;` or end of line"));
        }
    }
    if statements.is_empty() {
        return Err(ParseError {
            kind: ParseErrorKind::EmptyProgram,
            position: 0,
        });
    }
    Ok(Program { statements })
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            cursor: 0,
            depth: 0,
        }
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError {
                kind: ParseErrorKind::TooDeep { limit: MAX_DEPTH },
                position: self.peek().position,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.descend()?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> &Token {
        // tokenize always terminates with Eof, which is never consumed
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.cursor += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check_ident(&self, keyword: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(name) if name == keyword)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.check_ident(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_separator(&mut self) -> bool {
        self.eat(&TokenKind::Semicolon) || self.eat(&TokenKind::Newline)
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        let token = self.peek();
        ParseError {
            kind: ParseErrorKind::UnexpectedToken {
                expected,
                found: token.kind.to_string(),
            },
            position: token.position,
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &'static str) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_end(&self, expected: &'static str) -> Result<(), ParseError> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<(String, usize), ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok((name, token.position))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        let (receiver, position) = self.expect_ident("`controller`")?;
        if receiver != "controller" {
            return Err(ParseError {
                kind: ParseErrorKind::UnknownIdentifier(receiver),
                position,
            });
        }
        self.expect(&TokenKind::Dot, "`.`")?;
        let (operation, position) = self.expect_ident("a controller operation")?;
        let mut args = self.arguments()?;
        let expected = match operation.as_str() {
            "sendCommand" | "send_command" => 2,
            "requestStatus" | "request_status" => 1,
            _ => {
                return Err(ParseError {
                    kind: ParseErrorKind::UnknownOperation(operation),
                    position,
                });
            }
        };
        if args.len() != expected {
            return Err(ParseError {
                kind: ParseErrorKind::WrongArity {
                    name: operation,
                    expected,
                    found: args.len(),
                },
                position,
            });
        }
        let device = args.remove(0);
        Ok(match args.pop() {
            Some(payload) => Statement::SendCommand { device, payload },
            None => Statement::RequestStatus { device },
        })
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(&TokenKind::LParen, "`(`")?;
        if self.eat(&TokenKind::RParen) {
            return Ok(Vec::new());
        }
        self.nested(|p| {
            let mut args = Vec::new();
            loop {
                args.push(p.expression()?);
                if p.eat(&TokenKind::RParen) {
                    return Ok(args);
                }
                p.expect(&TokenKind::Comma, "`,` or `)`")?;
            }
        })
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.or()
    }

    fn or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.and()?;
        let mut chained = 0;
        while self.eat_keyword("or") || self.eat(&TokenKind::OrOr) {
            self.descend()?;
            chained += 1;
            let rhs = self.and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        self.depth -= chained;
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.not()?;
        let mut chained = 0;
        while self.eat_keyword("and") || self.eat(&TokenKind::AndAnd) {
            self.descend()?;
            chained += 1;
            let rhs = self.not()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        self.depth -= chained;
        Ok(lhs)
    }

    fn not(&mut self) -> Result<Expr, ParseError> {
        if self.eat_keyword("not") || self.eat(&TokenKind::Bang) {
            let operand = self.nested(Self::not)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.additive()?;
        let op = match &self.peek().kind {
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::Ne,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Ge => BinaryOp::Ge,
            TokenKind::Ident(name) if name == "in" => BinaryOp::In,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.additive()?;
        Ok(binary(op, lhs, rhs))
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.multiplicative()?;
        let mut chained = 0;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => {
                    self.depth -= chained;
                    return Ok(lhs);
                }
            };
            self.advance();
            self.descend()?;
            chained += 1;
            let rhs = self.multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        let mut chained = 0;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => {
                    self.depth -= chained;
                    return Ok(lhs);
                }
            };
            self.advance();
            self.descend()?;
            chained += 1;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.eat(&TokenKind::Minus) {
            let operand = self.nested(Self::unary)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Literal(Value::Number(n)))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Literal(Value::Text(s)))
            }
            TokenKind::LParen => self.nested(|p| {
                p.advance();
                let inner = p.expression()?;
                p.expect(&TokenKind::RParen, "`)`")?;
                Ok(inner)
            }),
            TokenKind::Ident(name) => {
                self.advance();
                self.named(name, token.position)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn named(&mut self, name: String, position: usize) -> Result<Expr, ParseError> {
        match name.as_str() {
            "true" | "True" => return Ok(Expr::Literal(Value::Bool(true))),
            "false" | "False" => return Ok(Expr::Literal(Value::Bool(false))),
            "event" => {
                self.expect(&TokenKind::Dot, "`.` after `event`")?;
                let (field, position) = self.expect_ident("an event field")?;
                return Field::from_name(&field).map(Expr::Field).ok_or(ParseError {
                    kind: ParseErrorKind::UnknownField(field),
                    position,
                });
            }
            _ => {}
        }

        if self.peek().kind != TokenKind::LParen {
            return Err(ParseError {
                kind: ParseErrorKind::UnknownIdentifier(name),
                position,
            });
        }
        let Some(function) = Builtin::from_name(&name) else {
            return Err(ParseError {
                kind: ParseErrorKind::UnknownFunction(name),
                position,
            });
        };
        let args = self.arguments()?;
        if args.len() != function.arity() {
            return Err(ParseError {
                kind: ParseErrorKind::WrongArity {
                    name,
                    expected: function.arity(),
                    found: args.len(),
                },
                position,
            });
        }
        Ok(Expr::Call { function, args })
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}
