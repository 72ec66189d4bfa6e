//! # statehub-domain
//!
//! Pure domain model for the statehub event pipeline.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** (registered endpoints reporting state over the transport)
//! - Define **Events** (immutable status reports, append-only)
//! - Define **Rules** (condition → action pairs) and the small rule language
//!   they are written in: lexer, parser, AST and interpreter
//! - Topic shape helpers shared by the router, the transport and the simulators
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod device;
pub mod event;
pub mod rule;
pub mod topic;

use chrono::{DateTime, Utc};

/// UTC timestamp used for `last_updated`, event times, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
