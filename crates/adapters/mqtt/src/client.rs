//! Broker connection: the [`Transport`] half and the delivery loop half.
//!
//! `rumqttc` splits a connection into an [`AsyncClient`] handle, which only
//! queues requests, and an [`EventLoop`] that does the actual network IO.
//! [`MqttTransport`] wraps the former and is cheap to clone; [`Delivery`]
//! owns the latter and must be polled by exactly one task.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use rumqttc::{AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, Packet, QoS};

use statehub_app::ports::{MessageHandler, Transport};
use statehub_domain::error::HubError;

use crate::config::MqttConfig;
use crate::error::MqttError;

/// Connect to the broker and wait for its `CONNACK`.
///
/// No retry happens here: a broker that is unreachable at startup is
/// reported to the caller.
///
/// # Errors
///
/// Returns [`MqttError::Connection`] if the network connection fails,
/// [`MqttError::Refused`] if the broker rejects the handshake, and
/// [`MqttError::ConnectTimeout`] if it does not answer in time.
#[tracing::instrument(skip_all, fields(
    broker = %config.broker_host,
    port = config.broker_port,
    client_id = %config.client_id,
))]
pub async fn connect(config: &MqttConfig) -> Result<(MqttTransport, Delivery), MqttError> {
    let (client, mut eventloop) =
        AsyncClient::new(config.options(), config.channel_capacity.max(1));

    let timeout = config.connect_timeout();
    tokio::time::timeout(timeout, wait_for_connack(&mut eventloop))
        .await
        .map_err(|_| MqttError::ConnectTimeout(timeout))??;
    tracing::info!("connected to MQTT broker");

    let transport = MqttTransport::new(client);
    let delivery = Delivery {
        eventloop,
        transport: transport.clone(),
        reconnect_delay: config.reconnect_delay(),
    };
    Ok((transport, delivery))
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<(), MqttError> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return if ack.code == ConnectReturnCode::Success {
                    Ok(())
                } else {
                    Err(MqttError::Refused(ack.code))
                };
            }
            Ok(_) => {}
            Err(ConnectionError::ConnectionRefused(code)) => return Err(MqttError::Refused(code)),
            Err(err) => return Err(MqttError::Connection(err)),
        }
    }
}

/// Outbound handle on the broker connection.
///
/// Remembers every subscription so it can be replayed when the session is
/// re-established after a network failure.
#[derive(Clone)]
pub struct MqttTransport {
    client: AsyncClient,
    subscriptions: Arc<RwLock<Vec<String>>>,
}

impl MqttTransport {
    fn new(client: AsyncClient) -> Self {
        Self {
            client,
            subscriptions: Arc::default(),
        }
    }

    /// Ask the event loop to send a `DISCONNECT`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Transport`] if the event loop is gone.
    pub fn disconnect(&self) -> Result<(), HubError> {
        self.client.try_disconnect().map_err(MqttError::Client)?;
        Ok(())
    }

    fn resubscribe(&self) {
        let patterns = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for pattern in patterns {
            if let Err(err) = self.client.try_subscribe(pattern.as_str(), QoS::AtLeastOnce) {
                tracing::error!(%pattern, error = %err, "failed to restore subscription");
            }
        }
    }
}

impl Transport for MqttTransport {
    fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), HubError> {
        self.client
            .try_publish(topic, QoS::AtLeastOnce, retain, payload.to_owned())
            .map_err(MqttError::Client)?;
        tracing::debug!(%topic, %payload, "published");
        Ok(())
    }

    fn subscribe(&self, pattern: &str) -> Result<(), HubError> {
        self.client
            .try_subscribe(pattern, QoS::AtLeastOnce)
            .map_err(MqttError::Client)?;
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !subscriptions.iter().any(|s| s == pattern) {
            subscriptions.push(pattern.to_string());
        }
        tracing::info!(%pattern, "subscribed");
        Ok(())
    }
}

/// Inbound side of the connection. Owns the network event loop.
pub struct Delivery {
    eventloop: EventLoop,
    transport: MqttTransport,
    reconnect_delay: Duration,
}

impl Delivery {
    /// Poll the connection forever, handing every inbound publish to
    /// `handler` one at a time, in arrival order.
    ///
    /// Connection errors are logged and followed by a pause; the next poll
    /// reconnects and the stored subscriptions are replayed. Payloads that
    /// are not valid UTF-8 are decoded lossily.
    pub async fn run<H: MessageHandler>(mut self, handler: H) {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let topic = String::from_utf8_lossy(publish.topic.as_ref()).into_owned();
                    let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                    tracing::debug!(%topic, %payload, "message received");
                    handler.handle_message(&topic, &payload).await;
                }
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!("reconnected to MQTT broker");
                    self.transport.resubscribe();
                }
                Ok(Event::Incoming(Packet::SubAck(_))) => {
                    tracing::debug!("subscription acknowledged");
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        retry_in = ?self.reconnect_delay,
                        "MQTT connection lost"
                    );
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        }
    }
}
