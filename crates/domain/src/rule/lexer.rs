//! Tokenizer for rule conditions and actions.

use std::fmt;

use super::error::{ParseError, ParseErrorKind};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),
    Dot,
    Comma,
    LParen,
    RParen,
    Semicolon,
    /// Only emitted outside parentheses, where it separates statements.
    Newline,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "number {n}"),
            Self::Str(s) => write!(f, "string {s:?}"),
            Self::Ident(name) => write!(f, "`{name}`"),
            Self::Dot => f.write_str("`.`"),
            Self::Comma => f.write_str("`,`"),
            Self::LParen => f.write_str("`(`"),
            Self::RParen => f.write_str("`)`"),
            Self::Semicolon => f.write_str("`;`"),
            Self::Newline => f.write_str("end of line"),
            Self::Plus => f.write_str("`+`"),
            Self::Minus => f.write_str("`-`"),
            Self::Star => f.write_str("`*`"),
            Self::Slash => f.write_str("`/`"),
            Self::Percent => f.write_str("`%`"),
            Self::EqEq => f.write_str("`==`"),
            Self::NotEq => f.write_str("`!=`"),
            Self::Lt => f.write_str("`<`"),
            Self::Le => f.write_str("`<=`"),
            Self::Gt => f.write_str("`>`"),
            Self::Ge => f.write_str("`>=`"),
            Self::AndAnd => f.write_str("`&&`"),
            Self::OrOr => f.write_str("`||`"),
            Self::Bang => f.write_str("`!`"),
            Self::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character.
    pub position: usize,
}

/// Split `source` into tokens, always terminated by [`TokenKind::Eof`].
///
/// `#` starts a comment running to the end of the line.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();
    let mut depth: usize = 0;

    while let Some(&(position, c)) = chars.peek() {
        let single = |kind| Token { kind, position };
        match c {
            '\n' => {
                chars.next();
                if depth == 0 {
                    tokens.push(single(TokenKind::Newline));
                }
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                while chars.next_if(|&(_, c)| c != '\n').is_some() {}
            }
            '0'..='9' => {
                let mut end = position;
                let mut seen_dot = false;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() || (c == '.' && !seen_dot) {
                        seen_dot |= c == '.';
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let text = &source[position..end];
                let value = text.parse::<f64>().map_err(|_| ParseError {
                    kind: ParseErrorKind::InvalidNumber(text.to_string()),
                    position,
                })?;
                tokens.push(single(TokenKind::Number(value)));
            }
            '\'' | '"' => {
                chars.next();
                let text = read_string(&mut chars, c, position)?;
                tokens.push(single(TokenKind::Str(text)));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some((_, c)) = chars.next_if(|&(_, c)| c.is_alphanumeric() || c == '_')
                {
                    name.push(c);
                }
                tokens.push(single(TokenKind::Ident(name)));
            }
            _ => {
                chars.next();
                let next = chars.peek().map(|&(_, c)| c);
                let (kind, double) = match (c, next) {
                    ('=', Some('=')) => (TokenKind::EqEq, true),
                    ('!', Some('=')) => (TokenKind::NotEq, true),
                    ('<', Some('=')) => (TokenKind::Le, true),
                    ('>', Some('=')) => (TokenKind::Ge, true),
                    ('&', Some('&')) => (TokenKind::AndAnd, true),
                    ('|', Some('|')) => (TokenKind::OrOr, true),
                    ('!', _) => (TokenKind::Bang, false),
                    ('<', _) => (TokenKind::Lt, false),
                    ('>', _) => (TokenKind::Gt, false),
                    ('+', _) => (TokenKind::Plus, false),
                    ('-', _) => (TokenKind::Minus, false),
                    ('*', _) => (TokenKind::Star, false),
                    ('/', _) => (TokenKind::Slash, false),
                    ('%', _) => (TokenKind::Percent, false),
                    ('.', _) => (TokenKind::Dot, false),
                    (',', _) => (TokenKind::Comma, false),
                    (';', _) => (TokenKind::Semicolon, false),
                    ('(', _) => {
                        depth += 1;
                        (TokenKind::LParen, false)
                    }
                    (')', _) => {
                        depth = depth.saturating_sub(1);
                        (TokenKind::RParen, false)
                    }
                    _ => {
                        return Err(ParseError {
                            kind: ParseErrorKind::UnexpectedCharacter(c),
                            position,
                        });
                    }
                };
                if double {
                    chars.next();
                }
                tokens.push(single(kind));
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        position: source.len(),
    });
    Ok(tokens)
}

fn read_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    quote: char,
    start: usize,
) -> Result<String, ParseError> {
    let mut text = String::new();
    loop {
        match chars.next().map(|(_, c)| c) {
            Some(c) if c == quote => return Ok(text),
            Some('\\') => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, other)) => text.push(other),
                None => break,
            },
            Some('\n') | None => break,
            Some(c) => text.push(c),
        }
    }
    Err(ParseError {
        kind: ParseErrorKind::UnterminatedString,
        position: start,
    })
}
