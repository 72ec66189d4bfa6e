//! Event router — turns inbound status messages into persisted events and
//! fans them out to listeners.
//!
//! Routing steps for every delivered `(topic, payload)`:
//!
//! 1. `<a>/<b>/<c>/<device_id>/status` or discard (malformed / other subtopic)
//! 2. the device must already be registered, or discard; unknown ids never
//!    create records
//! 3. overwrite the device's last state, append an [`Event`]
//! 4. call every listener with the event, in registration order
//!
//! Nothing here propagates an error to the transport: every outcome is a
//! [`Disposition`] and is logged where it is decided.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use statehub_domain::error::HubError;
use statehub_domain::event::Event;
use statehub_domain::id::DeviceId;
use statehub_domain::topic::{BaseTopic, TopicError, parse_status_topic};

use crate::controller::CommandPublisher;
use crate::ports::{
    DeviceController, DeviceRepository, EventListener, EventStore, MessageHandler, Transport,
};

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Persisted and delivered to listeners.
    Accepted(Event),
    /// Not a five-segment topic.
    MalformedTopic,
    /// Five segments, but not a status report.
    UnexpectedSubtopic,
    /// Well-formed status topic for a device that is not registered.
    UnregisteredDevice,
    /// The registry failed while handling the message.
    StorageFailed,
}

impl Disposition {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Routes status messages from the transport into the registry and listeners.
pub struct EventRouter<DR, ES, T> {
    base: BaseTopic,
    devices: DR,
    events: ES,
    transport: T,
    commands: Arc<CommandPublisher<T>>,
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
}

impl<DR, ES, T> EventRouter<DR, ES, T>
where
    DR: DeviceRepository,
    ES: EventStore,
    T: Transport + Clone + 'static,
{
    /// Create a router for devices under `base`.
    pub fn new(base: BaseTopic, devices: DR, events: ES, transport: T) -> Self {
        let commands = Arc::new(CommandPublisher::new(base.clone(), transport.clone()));
        Self {
            base,
            devices,
            events,
            transport,
            commands,
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Subscribe to every device's status topic.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Transport`] if the subscription cannot be queued.
    pub fn start(&self) -> Result<(), HubError> {
        let pattern = self.base.status_subscription();
        tracing::info!(%pattern, "subscribing to device status");
        self.transport.subscribe(&pattern)
    }

    /// Handle for issuing device commands, detached from the router itself.
    #[must_use]
    pub fn controller(&self) -> Arc<dyn DeviceController> {
        self.commands.clone()
    }

    /// Append a listener. Listeners run in the order they were registered.
    pub fn register_listener(&self, listener: Arc<dyn EventListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Publish a command on `<base>/<device_id>/set`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Transport`] if the publish cannot be queued.
    pub fn send_command(&self, device_id: &DeviceId, payload: &str) -> Result<(), HubError> {
        self.commands.send_command(device_id, payload)
    }

    /// Publish `GET_STATE` on `<base>/<device_id>`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Transport`] if the publish cannot be queued.
    pub fn request_status(&self, device_id: &DeviceId) -> Result<(), HubError> {
        self.commands.request_status(device_id)
    }

    /// Route one inbound message.
    pub async fn route(&self, topic: &str, payload: &str) -> Disposition {
        let raw_id = match parse_status_topic(topic) {
            Ok(raw_id) => raw_id,
            Err(TopicError::UnexpectedSubtopic(subtopic)) => {
                tracing::warn!(%topic, %subtopic, "discarding message on unexpected subtopic");
                return Disposition::UnexpectedSubtopic;
            }
            Err(err) => {
                tracing::warn!(%topic, error = %err, "discarding message on malformed topic");
                return Disposition::MalformedTopic;
            }
        };

        let Ok(device_id) = DeviceId::new(raw_id) else {
            tracing::warn!(%topic, "discarding status for invalid device id");
            return Disposition::UnregisteredDevice;
        };

        match self.devices.get_by_id(&device_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(%device_id, "discarding status from unregistered device");
                return Disposition::UnregisteredDevice;
            }
            Err(err) => {
                tracing::error!(%device_id, error = %err, "device lookup failed");
                return Disposition::StorageFailed;
            }
        }

        let event = Event::new(device_id, payload);
        if let Err(err) = self
            .devices
            .update_state(&event.device_id, payload, event.created_at)
            .await
        {
            tracing::error!(
                device_id = %event.device_id,
                error = %err,
                "failed to record device state"
            );
            return Disposition::StorageFailed;
        }
        let event = match self.events.append(event).await {
            Ok(event) => event,
            Err(err) => {
                tracing::error!(%topic, error = %err, "failed to append event");
                return Disposition::StorageFailed;
            }
        };

        tracing::debug!(device_id = %event.device_id, payload = %event.payload, "event accepted");
        self.notify(&event);
        Disposition::Accepted(event)
    }

    fn notify(&self, event: &Event) {
        // released before calling out, so a listener may register another
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (index, listener) in listeners.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::error!(
                        listener = index,
                        event_id = %event.id,
                        error = %err,
                        "listener failed"
                    );
                }
                Err(_) => {
                    tracing::error!(listener = index, event_id = %event.id, "listener panicked");
                }
            }
        }
    }
}

impl<DR, ES, T> MessageHandler for EventRouter<DR, ES, T>
where
    DR: DeviceRepository,
    ES: EventStore,
    T: Transport + Clone + 'static,
{
    async fn handle_message(&self, topic: &str, payload: &str) {
        self.route(topic, payload).await;
    }
}
