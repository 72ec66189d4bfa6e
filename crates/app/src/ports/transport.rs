//! Transport port — the publish/subscribe connection at the system boundary.
//!
//! Connection and reconnection belong to the adapter. The core only sees
//! fire-and-forget publishes, subscriptions, and a single inbound handler.

use std::future::Future;
use std::sync::Arc;

use statehub_domain::error::HubError;

/// Outbound side of the message bus.
///
/// Both calls only enqueue work for the adapter's event loop, so they are
/// cheap enough to run inside a listener callback.
pub trait Transport: Send + Sync {
    /// Publish `payload` on `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Transport`] if the request cannot be queued.
    fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), HubError>;

    /// Register interest in a topic filter (MQTT `+`/`#` wildcards).
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Transport`] if the request cannot be queued.
    fn subscribe(&self, pattern: &str) -> Result<(), HubError>;
}

impl<T: Transport> Transport for Arc<T> {
    fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), HubError> {
        (**self).publish(topic, payload, retain)
    }

    fn subscribe(&self, pattern: &str) -> Result<(), HubError> {
        (**self).subscribe(pattern)
    }
}

/// Inbound side: the one consumer of every delivered message.
///
/// Implementations contain their own failures; the delivery loop never
/// sees an error.
pub trait MessageHandler: Send + Sync {
    fn handle_message(&self, topic: &str, payload: &str) -> impl Future<Output = ()> + Send;
}

impl<H: MessageHandler> MessageHandler for Arc<H> {
    fn handle_message(&self, topic: &str, payload: &str) -> impl Future<Output = ()> + Send {
        (**self).handle_message(topic, payload)
    }
}
