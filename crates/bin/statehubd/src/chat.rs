//! Console chat backend — notifications end up in the log.

use statehub_app::ports::{ChatBackend, ChatChannel, ChatGuild};
use statehub_domain::error::HubError;

/// A single always-ready guild with one writable channel.
pub struct ConsoleChat {
    guild: ChatGuild,
}

impl Default for ConsoleChat {
    fn default() -> Self {
        Self {
            guild: ChatGuild {
                name: "console".to_string(),
                channels: vec![ChatChannel {
                    id: "stdout".to_string(),
                    name: "notifications".to_string(),
                    can_send: true,
                }],
            },
        }
    }
}

impl ChatBackend for ConsoleChat {
    async fn wait_until_ready(&self) -> Result<(), HubError> {
        Ok(())
    }

    async fn guilds(&self) -> Result<Vec<ChatGuild>, HubError> {
        Ok(vec![self.guild.clone()])
    }

    async fn send(&self, channel: &ChatChannel, text: &str) -> Result<(), HubError> {
        tracing::info!(target: "statehub::notifications", channel = %channel.name, "{text}");
        Ok(())
    }
}
