//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HubError`]
//! when crossing a port boundary.

/// Top-level error returned by ports and services.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("conflict")]
    Conflict(#[from] ConflictError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("device id must not be empty")]
    EmptyDeviceId,

    #[error("device id is longer than {max} characters")]
    DeviceIdTooLong { max: usize },

    #[error("device id contains reserved character {0:?}")]
    ReservedCharacter(char),

    #[error("unknown device type {0:?}")]
    UnknownDeviceType(String),

    #[error("invalid rule condition")]
    InvalidCondition(#[source] crate::rule::ParseError),

    #[error("invalid rule action")]
    InvalidAction(#[source] crate::rule::ParseError),

    #[error("malformed identifier")]
    MalformedId(#[source] uuid::Error),
}

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A create would have broken a uniqueness invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} already exists")]
pub struct ConflictError {
    pub entity: &'static str,
    pub id: String,
}
