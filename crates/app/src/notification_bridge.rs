//! Notification bridge — forwards accepted events to a chat channel.
//!
//! The listener half only enqueues, so the router's fanout never waits on
//! chat I/O. A single consumer task drains the queue in arrival order and
//! posts one message per event.
//!
//! The queue is bounded. When the consumer falls more than `capacity`
//! events behind, the oldest undelivered events are dropped and the skip is
//! logged. If no channel can be found the consumer exits and releases the
//! queue, after which new events are discarded at enqueue time.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use statehub_domain::error::HubError;
use statehub_domain::event::Event;

use crate::ports::{ChatBackend, ChatChannel, ChatGuild, EventListener};

/// Listener half: enqueues events for the consumer task.
pub struct NotificationBridge {
    sender: broadcast::Sender<Event>,
}

/// Consumer half: owned by the task that posts to chat.
pub struct NotificationQueue {
    receiver: broadcast::Receiver<Event>,
}

impl NotificationBridge {
    /// Create a bridge holding at most `capacity` undelivered events.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, NotificationQueue) {
        let (sender, receiver) = broadcast::channel(capacity.max(1));
        (Self { sender }, NotificationQueue { receiver })
    }
}

impl EventListener for NotificationBridge {
    fn on_event(&self, event: &Event) -> Result<(), HubError> {
        if self.sender.send(event.clone()).is_err() {
            tracing::trace!(event_id = %event.id, "no notification consumer, event discarded");
        }
        Ok(())
    }
}

impl NotificationQueue {
    /// Wait for the backend, pick a channel, then post every queued event.
    ///
    /// Returns when the bridge is dropped, or immediately after readiness if
    /// no eligible channel exists.
    pub async fn run<C: ChatBackend>(mut self, chat: &C, guild_filter: Option<&str>) {
        let channel = match pick_channel(chat, guild_filter).await {
            Ok(Some(channel)) => {
                tracing::info!(
                    channel = %channel.name,
                    channel_id = %channel.id,
                    "posting notifications"
                );
                channel
            }
            Ok(None) => {
                tracing::warn!(
                    guild = ?guild_filter,
                    "no chat channel accepts messages, notifications disabled"
                );
                return;
            }
            Err(err) => {
                tracing::warn!(error = %err, "chat backend unavailable, notifications disabled");
                return;
            }
        };

        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if let Err(err) = chat.send(&channel, &format_notification(&event)).await {
                        tracing::error!(
                            event_id = %event.id,
                            error = %err,
                            "failed to post notification"
                        );
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notification queue overflowed, oldest events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!("notification queue closed");
    }
}

async fn pick_channel<C: ChatBackend>(
    chat: &C,
    guild_filter: Option<&str>,
) -> Result<Option<ChatChannel>, HubError> {
    chat.wait_until_ready().await?;
    let guilds = chat.guilds().await?;
    Ok(select_channel(&guilds, guild_filter).cloned())
}

/// First channel that accepts messages, looking only at the named guild
/// when a filter is given.
#[must_use]
pub fn select_channel<'a>(
    guilds: &'a [ChatGuild],
    guild_filter: Option<&str>,
) -> Option<&'a ChatChannel> {
    guilds
        .iter()
        .filter(|guild| guild_filter.is_none_or(|name| guild.name == name))
        .flat_map(|guild| guild.channels.iter())
        .find(|channel| channel.can_send)
}

/// Chat line for one event.
#[must_use]
pub fn format_notification(event: &Event) -> String {
    format!("📟 **{}** → `{}`", event.device_id, event.payload)
}
