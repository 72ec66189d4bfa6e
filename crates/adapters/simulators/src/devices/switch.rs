//! Simulated switch — responds to `ON`, `OFF` and `TOGGLE`.

use statehub_domain::id::DeviceId;

/// A two-state switch, `OFF` on creation.
pub struct Switch {
    device_id: DeviceId,
    on: bool,
}

impl Switch {
    #[must_use]
    pub fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            on: false,
        }
    }

    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    #[must_use]
    pub fn state(&self) -> &'static str {
        if self.on { "ON" } else { "OFF" }
    }

    /// Apply a command, case-insensitively. Returns the new state, or `None`
    /// when the command is not understood.
    pub fn apply(&mut self, command: &str) -> Option<&'static str> {
        match command.trim().to_ascii_uppercase().as_str() {
            "ON" => self.on = true,
            "OFF" => self.on = false,
            "TOGGLE" => self.on = !self.on,
            _ => return None,
        }
        Some(self.state())
    }
}
