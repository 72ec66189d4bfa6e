//! Syntax tree for rule conditions and actions.
//!
//! Names are resolved while parsing: an [`Expr`] can only reference known
//! event fields and builtins, and a [`Statement`] can only be one of the
//! controller operations. Nothing else is reachable from rule text.

use std::fmt;

use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Field(Field),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        function: Builtin,
        args: Vec<Expr>,
    },
}

/// Fields of the `event` binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    DeviceId,
    Payload,
    /// RFC 3339 text.
    CreatedAt,
}

impl Field {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "device_id" => Some(Self::DeviceId),
            "payload" => Some(Self::Payload),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Not => "not",
            Self::Neg => "unary -",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::In => "in",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        })
    }
}

/// Functions callable from rule expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Float,
    Int,
    Str,
    Len,
    Lower,
    Upper,
    Abs,
    StartsWith,
    EndsWith,
}

impl Builtin {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "float" => Some(Self::Float),
            "int" => Some(Self::Int),
            "str" => Some(Self::Str),
            "len" => Some(Self::Len),
            "lower" => Some(Self::Lower),
            "upper" => Some(Self::Upper),
            "abs" => Some(Self::Abs),
            "startswith" => Some(Self::StartsWith),
            "endswith" => Some(Self::EndsWith),
            _ => None,
        }
    }

    pub(crate) fn arity(self) -> usize {
        match self {
            Self::StartsWith | Self::EndsWith => 2,
            _ => 1,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Str => "str",
            Self::Len => "len",
            Self::Lower => "lower",
            Self::Upper => "upper",
            Self::Abs => "abs",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
        }
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One controller call in an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `controller.sendCommand(device, payload)`
    SendCommand { device: Expr, payload: Expr },
    /// `controller.requestStatus(device)`
    RequestStatus { device: Expr },
}

/// A parsed action: statements run in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}
