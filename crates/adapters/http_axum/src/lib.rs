//! # statehub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON admin API** for the registry and the command surface
//!   (`/api/devices`, `/api/rules`, `/api/events`, device commands and
//!   status requests)
//! - Map HTTP requests into application service calls (driving adapter)
//! - Map application results and [`HubError`](statehub_domain::error::HubError)s
//!   into JSON responses
//!
//! ## Dependency rule
//! Depends on `statehub-app` (for port traits and services) and `statehub-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
