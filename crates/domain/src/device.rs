//! Device — a registered endpoint that reports its state over the transport.
//!
//! Devices are created by operators; the event router only ever overwrites
//! their last known state. Status reports for unknown device ids are
//! rejected, never turned into implicit records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Timestamp;
use crate::error::{HubError, ValidationError};
use crate::id::DeviceId;

/// Kind of endpoint, used for display and by operators; the pipeline treats
/// all kinds the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Sensor,
    Switch,
    Clock,
    Other,
}

impl DeviceType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sensor => "sensor",
            Self::Switch => "switch",
            Self::Clock => "clock",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sensor" => Ok(Self::Sensor),
            "switch" => Ok(Self::Switch),
            "clock" => Ok(Self::Clock),
            "other" => Ok(Self::Other),
            _ => Err(ValidationError::UnknownDeviceType(s.to_string())),
        }
    }
}

/// A registered device and its last reported state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: DeviceId,
    pub device_type: DeviceType,
    pub last_state: Option<String>,
    pub last_updated: Option<Timestamp>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Overwrite the last known state. No history is kept on the device
    /// itself; the event log holds it.
    pub fn record_state(&mut self, payload: impl Into<String>, at: Timestamp) {
        self.last_state = Some(payload.into());
        self.last_updated = Some(at);
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    device_id: Option<String>,
    device_type: Option<DeviceType>,
    last_state: Option<String>,
    last_updated: Option<Timestamp>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    #[must_use]
    pub fn device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = Some(device_type);
        self
    }

    #[must_use]
    pub fn last_state(mut self, state: impl Into<String>, at: Timestamp) -> Self {
        self.last_state = Some(state.into());
        self.last_updated = Some(at);
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if the device id is invalid.
    pub fn build(self) -> Result<Device, HubError> {
        let device_id = DeviceId::new(self.device_id.unwrap_or_default())?;
        Ok(Device {
            device_id,
            device_type: self.device_type.unwrap_or(DeviceType::Other),
            last_state: self.last_state,
            last_updated: self.last_updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_device_without_state() {
        let device = Device::builder()
            .device_id("sensorTest")
            .device_type(DeviceType::Sensor)
            .build()
            .unwrap();
        assert_eq!(device.device_id.as_str(), "sensorTest");
        assert_eq!(device.device_type, DeviceType::Sensor);
        assert!(device.last_state.is_none());
        assert!(device.last_updated.is_none());
    }

    #[test]
    fn should_default_to_other_type_when_not_specified() {
        let device = Device::builder().device_id("thing").build().unwrap();
        assert_eq!(device.device_type, DeviceType::Other);
    }

    #[test]
    fn should_return_validation_error_when_device_id_missing() {
        let result = Device::builder().build();
        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::EmptyDeviceId))
        ));
    }

    #[test]
    fn should_overwrite_state_when_recording() {
        let mut device = Device::builder().device_id("boiler").build().unwrap();
        let first = crate::now();
        device.record_state("ON", first);
        let second = crate::now();
        device.record_state("OFF", second);
        assert_eq!(device.last_state.as_deref(), Some("OFF"));
        assert_eq!(device.last_updated, Some(second));
    }

    #[test]
    fn should_parse_device_type_case_insensitively() {
        assert_eq!("Sensor".parse::<DeviceType>().unwrap(), DeviceType::Sensor);
        assert_eq!(" SWITCH ".parse::<DeviceType>().unwrap(), DeviceType::Switch);
        assert_eq!("clock".parse::<DeviceType>().unwrap(), DeviceType::Clock);
    }

    #[test]
    fn should_reject_unknown_device_type() {
        let err = "lamp".parse::<DeviceType>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownDeviceType("lamp".to_string()));
    }

    #[test]
    fn should_serialize_device_type_as_snake_case() {
        let json = serde_json::to_string(&DeviceType::Switch).unwrap();
        assert_eq!(json, "\"switch\"");
    }
}
