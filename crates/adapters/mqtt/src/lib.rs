//! # statehub-adapter-mqtt
//!
//! MQTT transport adapter — connects statehub to the device bus.
//!
//! ## Responsibilities
//! - Connect to an MQTT broker and report startup failure to the caller
//! - Implement the [`Transport`](statehub_app::ports::Transport) port
//!   (fire-and-forget publish, subscribe)
//! - Drive the network event loop and hand every inbound message to a single
//!   [`MessageHandler`](statehub_app::ports::MessageHandler)
//! - Replay subscriptions after a reconnect
//!
//! ## Dependency rule
//! Same as other adapters: depends on `statehub-app` and `statehub-domain`.

mod client;
mod config;
mod error;

pub use client::{Delivery, MqttTransport, connect};
pub use config::MqttConfig;
pub use error::MqttError;
