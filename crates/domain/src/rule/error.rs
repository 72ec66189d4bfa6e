//! Errors raised while parsing or evaluating rule text.

use super::ast::{BinaryOp, Builtin, UnaryOp};
use super::value::ValueKind;
use crate::error::ValidationError;

/// Rule text could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at offset {position}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Byte offset into the source text.
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unexpected character {0:?}")]
    UnexpectedCharacter(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },

    #[error("unknown event field {0:?}")]
    UnknownField(String),

    #[error("unknown function {0:?}")]
    UnknownFunction(String),

    #[error("unknown name {0:?}")]
    UnknownIdentifier(String),

    #[error("unknown controller operation {0:?}")]
    UnknownOperation(String),

    #[error("{name} takes {expected} argument(s), got {found}")]
    WrongArity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("action contains no statements")]
    EmptyProgram,

    #[error("rule nests deeper than {limit} levels")]
    TooDeep { limit: usize },
}

/// Evaluating a parsed rule against an event failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("cannot apply {op} to {lhs} and {rhs}")]
    UnsupportedOperands {
        op: BinaryOp,
        lhs: ValueKind,
        rhs: ValueKind,
    },

    #[error("cannot apply {op} to {kind}")]
    UnsupportedOperand { op: UnaryOp, kind: ValueKind },

    #[error("{function} does not accept {kind}")]
    UnsupportedArgument { function: Builtin, kind: ValueKind },

    #[error("{0:?} is not a number")]
    NotANumber(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("expected a boolean, got {0}")]
    NotBoolean(ValueKind),

    #[error("expected text or number for a command argument, got {0}")]
    NotText(ValueKind),

    #[error("invalid target device")]
    InvalidDevice(#[source] ValidationError),
}
