//! Listener and controller ports — the two directions of the pipeline's
//! feedback loop.

use statehub_domain::error::HubError;
use statehub_domain::event::Event;
use statehub_domain::id::DeviceId;
use statehub_domain::rule::Command;

/// Consumer notified of every accepted event.
///
/// Called synchronously on the delivery task, in registration order.
/// Implementations must return quickly; slow work belongs on a queue.
pub trait EventListener: Send + Sync {
    /// # Errors
    ///
    /// Errors are logged by the router and do not stop later listeners.
    fn on_event(&self, event: &Event) -> Result<(), HubError>;
}

impl<F> EventListener for F
where
    F: Fn(&Event) -> Result<(), HubError> + Send + Sync,
{
    fn on_event(&self, event: &Event) -> Result<(), HubError> {
        self(event)
    }
}

/// Operations rules (and operators) may invoke on devices.
pub trait DeviceController: Send + Sync {
    /// Ask a device to change state.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Transport`] if the command could not be queued.
    fn send_command(&self, device_id: &DeviceId, payload: &str) -> Result<(), HubError>;

    /// Ask a device to republish its state. The answer arrives later as an
    /// ordinary status event; nothing correlates it with this request.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Transport`] if the request could not be queued.
    fn request_status(&self, device_id: &DeviceId) -> Result<(), HubError>;

    /// Run a command produced by a rule action.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying operation.
    fn dispatch(&self, command: &Command) -> Result<(), HubError> {
        match command {
            Command::Send { device_id, payload } => self.send_command(device_id, payload),
            Command::RequestStatus { device_id } => self.request_status(device_id),
        }
    }
}
