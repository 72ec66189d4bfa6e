//! # statehub-app
//!
//! Application layer: the event pipeline and the **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DeviceRepository`, `RuleRepository`: registry CRUD
//!   - `EventStore`: append & query events
//!   - `Transport`: publish/subscribe on the message bus
//!   - `ChatBackend`: outbound notifications
//! - Run the **event pipeline**:
//!   - `EventRouter`: topic routing, device validation, persistence, listener fanout
//!   - `RuleEngine`: evaluates the rule snapshot against every accepted event
//!   - `NotificationBridge`: queues events for a slow chat consumer
//! - Provide **use-case services** for the admin surface (devices, rules, events)
//!
//! ## Dependency rule
//! Depends on `statehub-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod controller;
pub mod event_router;
pub mod notification_bridge;
pub mod ports;
pub mod rule_engine;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
