//! MQTT adapter error types.

use std::time::Duration;

use rumqttc::ConnectReturnCode;
use statehub_domain::error::HubError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// A request could not be handed to the event loop.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// The network connection to the broker failed.
    #[error("MQTT connection error")]
    Connection(#[source] rumqttc::ConnectionError),

    /// The broker answered the handshake with a refusal.
    #[error("MQTT broker refused connection: {0:?}")]
    Refused(ConnectReturnCode),

    /// No `CONNACK` arrived in time.
    #[error("no answer from MQTT broker after {0:?}")]
    ConnectTimeout(Duration),
}

impl From<MqttError> for HubError {
    fn from(err: MqttError) -> Self {
        HubError::Transport(Box::new(err))
    }
}
