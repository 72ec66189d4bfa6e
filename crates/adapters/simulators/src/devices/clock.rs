//! Simulated clock — reports `HH:MM:SS` and advances by a fixed step.

use chrono::{NaiveTime, TimeDelta, Timelike};
use statehub_domain::id::DeviceId;

use crate::error::SimulatorError;

const FORMAT: &str = "%H:%M:%S";

/// A wall clock that moves `increment` forward on every tick, wrapping at
/// midnight.
pub struct Clock {
    device_id: DeviceId,
    next: NaiveTime,
    increment: TimeDelta,
    last: Option<String>,
}

impl Clock {
    #[must_use]
    pub fn new(device_id: DeviceId, start: NaiveTime, increment_secs: i64) -> Self {
        Self {
            device_id,
            next: start.with_nanosecond(0).unwrap_or(start),
            increment: TimeDelta::seconds(increment_secs),
            last: None,
        }
    }

    /// Start from the current local time.
    #[must_use]
    pub fn from_local_time(device_id: DeviceId, increment_secs: i64) -> Self {
        Self::new(device_id, chrono::Local::now().time(), increment_secs)
    }

    /// Parse `start` as `HH:MM:SS`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError::InvalidTime`] if `start` is not a valid time.
    pub fn starting_at(
        device_id: DeviceId,
        start: &str,
        increment_secs: i64,
    ) -> Result<Self, SimulatorError> {
        let start = NaiveTime::parse_from_str(start, FORMAT)
            .map_err(|_| SimulatorError::InvalidTime(start.to_string()))?;
        Ok(Self::new(device_id, start, increment_secs))
    }

    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Report the current time, then advance.
    pub fn tick(&mut self) -> String {
        let now = self.next.format(FORMAT).to_string();
        self.next = self.next.overflowing_add_signed(self.increment).0;
        self.last = Some(now.clone());
        now
    }

    /// The last reported time, or the upcoming one before the first tick.
    #[must_use]
    pub fn current(&self) -> String {
        self.last
            .clone()
            .unwrap_or_else(|| self.next.format(FORMAT).to_string())
    }
}
