//! Simulated device models — sensor, switch, clock.
//!
//! Models are plain state machines with no IO; the [`Fleet`](crate::Fleet)
//! turns their outputs into publishes.

mod clock;
mod sensor;
mod switch;

pub use clock::Clock;
pub use sensor::TemperatureSensor;
pub use switch::Switch;

use rand::Rng;
use statehub_domain::id::DeviceId;
use statehub_domain::topic::STATUS_REQUEST_PAYLOAD;

/// Wrapper enum for the concrete simulator types.
pub enum Simulator {
    Sensor(TemperatureSensor),
    Switch(Switch),
    Clock(Clock),
}

impl Simulator {
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::Sensor(d) => d.device_id(),
            Self::Switch(d) => d.device_id(),
            Self::Clock(d) => d.device_id(),
        }
    }

    /// State to announce when the simulator comes online. Only the switch
    /// has one; the others report on their first tick.
    #[must_use]
    pub fn initial_report(&self) -> Option<String> {
        match self {
            Self::Switch(d) => Some(d.state().to_string()),
            Self::Sensor(_) | Self::Clock(_) => None,
        }
    }

    /// Periodic report, if this kind of device produces one.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> Option<String> {
        match self {
            Self::Sensor(d) => Some(d.read(rng)),
            Self::Clock(d) => Some(d.tick()),
            Self::Switch(_) => None,
        }
    }

    /// React to a payload on the device's `set` topic.
    pub fn on_command(&mut self, payload: &str) -> Option<String> {
        match self {
            Self::Switch(d) => d.apply(payload).map(str::to_string),
            Self::Sensor(_) | Self::Clock(_) => None,
        }
    }

    /// React to a payload on the device's status-request topic.
    pub fn on_status_request<R: Rng>(&mut self, payload: &str, rng: &mut R) -> Option<String> {
        if payload.trim() != STATUS_REQUEST_PAYLOAD {
            return None;
        }
        Some(match self {
            Self::Sensor(d) => d.current(rng),
            Self::Switch(d) => d.state().to_string(),
            Self::Clock(d) => d.current(),
        })
    }
}
