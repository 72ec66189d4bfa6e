//! Chat port — where the notification bridge posts events.

use std::future::Future;

use statehub_domain::error::HubError;

/// A text channel the backend knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatChannel {
    pub id: String,
    pub name: String,
    /// Whether the bot may post here.
    pub can_send: bool,
}

/// A server/workspace grouping channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatGuild {
    pub name: String,
    pub channels: Vec<ChatChannel>,
}

/// Outbound chat connection.
pub trait ChatBackend: Send + Sync {
    /// Resolve once the backend is connected and its guild list is known.
    fn wait_until_ready(&self) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Guilds visible to the bot, in the backend's order.
    fn guilds(&self) -> impl Future<Output = Result<Vec<ChatGuild>, HubError>> + Send;

    /// Post a message.
    fn send(
        &self,
        channel: &ChatChannel,
        text: &str,
    ) -> impl Future<Output = Result<(), HubError>> + Send;
}
