//! MQTT transport configuration.

use std::time::Duration;

use rumqttc::MqttOptions;
use serde::Deserialize;

/// Smallest keep-alive the client accepts.
const MIN_KEEP_ALIVE_SECS: u64 = 5;

/// Configuration for the MQTT transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Three-segment group prefix shared by every device topic.
    pub base_topic: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u64,
    /// How long to wait for the broker's `CONNACK` on startup, in seconds.
    pub connect_timeout_secs: u64,
    /// Capacity of the request channel between client handles and the event loop.
    pub channel_capacity: usize,
    /// Pause before polling again after a connection error, in seconds.
    pub reconnect_delay_secs: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "statehub".to_string(),
            base_topic: "statehub/0000/00".to_string(),
            keep_alive_secs: 60,
            connect_timeout_secs: 10,
            channel_capacity: 64,
            reconnect_delay_secs: 5,
        }
    }
}

impl MqttConfig {
    /// Same broker settings under another client id, for secondary
    /// connections such as the device simulators.
    #[must_use]
    pub fn with_client_id(&self, client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..self.clone()
        }
    }

    pub(crate) fn options(&self) -> MqttOptions {
        let mut options =
            MqttOptions::new(&self.client_id, &self.broker_host, self.broker_port);
        options.set_keep_alive(Duration::from_secs(
            self.keep_alive_secs.max(MIN_KEEP_ALIVE_SECS),
        ));
        options.set_clean_session(true);
        options
    }

    pub(crate) fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub(crate) fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}
