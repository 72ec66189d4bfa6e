//! Outbound device commands over the transport.

use statehub_domain::error::HubError;
use statehub_domain::id::DeviceId;
use statehub_domain::topic::{BaseTopic, STATUS_REQUEST_PAYLOAD};

use crate::ports::{DeviceController, Transport};

/// Publishes commands and status requests under the configured base topic.
///
/// Shared between the router and the rule engine. It holds no reference
/// back to either, so the engine can be registered as a router listener
/// without a reference cycle.
pub struct CommandPublisher<T> {
    base: BaseTopic,
    transport: T,
}

impl<T: Transport> CommandPublisher<T> {
    pub fn new(base: BaseTopic, transport: T) -> Self {
        Self { base, transport }
    }
}

impl<T: Transport> DeviceController for CommandPublisher<T> {
    #[tracing::instrument(skip(self, payload), fields(device_id = %device_id))]
    fn send_command(&self, device_id: &DeviceId, payload: &str) -> Result<(), HubError> {
        let topic = self.base.command_topic(device_id);
        tracing::debug!(%topic, payload, "sending command");
        self.transport.publish(&topic, payload, false)
    }

    #[tracing::instrument(skip(self), fields(device_id = %device_id))]
    fn request_status(&self, device_id: &DeviceId) -> Result<(), HubError> {
        let topic = self.base.status_request_topic(device_id);
        tracing::debug!(%topic, "requesting status");
        self.transport
            .publish(&topic, STATUS_REQUEST_PAYLOAD, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingTransport;
    use statehub_domain::rule::Command;
    use std::sync::Arc;

    fn publisher() -> (CommandPublisher<Arc<RecordingTransport>>, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let base = BaseTopic::new("home/0000/00").unwrap();
        (CommandPublisher::new(base, Arc::clone(&transport)), transport)
    }

    #[test]
    fn should_publish_command_on_set_topic() {
        let (publisher, transport) = publisher();
        publisher
            .send_command(&DeviceId::new("boiler").unwrap(), "OFF")
            .unwrap();
        assert_eq!(
            transport.published(),
            vec![("home/0000/00/boiler/set".to_string(), "OFF".to_string())]
        );
    }

    #[test]
    fn should_publish_marker_on_bare_device_topic() {
        let (publisher, transport) = publisher();
        publisher
            .request_status(&DeviceId::new("lamp").unwrap())
            .unwrap();
        assert_eq!(
            transport.published(),
            vec![("home/0000/00/lamp".to_string(), "GET_STATE".to_string())]
        );
    }

    #[test]
    fn should_dispatch_rule_commands() {
        let (publisher, transport) = publisher();
        publisher
            .dispatch(&Command::RequestStatus {
                device_id: DeviceId::new("clock").unwrap(),
            })
            .unwrap();
        assert_eq!(transport.published().len(), 1);
    }

    #[test]
    fn should_surface_transport_failure() {
        let (publisher, transport) = publisher();
        transport.fail_publishes();
        let result = publisher.send_command(&DeviceId::new("boiler").unwrap(), "OFF");
        assert!(matches!(result, Err(HubError::Transport(_))));
    }
}
