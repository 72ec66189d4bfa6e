//! Event — an immutable record of a device reporting a status payload.
//!
//! Events are appended by the router and never modified afterwards.
//! Ordering by `created_at` is not guaranteed to match device send order.

use serde::{Deserialize, Serialize};

use crate::Timestamp;
use crate::id::{DeviceId, EventId};

/// A status report accepted by the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub device_id: DeviceId,
    /// Opaque payload as reported by the device.
    pub payload: String,
    pub created_at: Timestamp,
}

impl Event {
    /// Create a new event stamped with the current time.
    #[must_use]
    pub fn new(device_id: DeviceId, payload: impl Into<String>) -> Self {
        Self {
            id: EventId::new(),
            device_id,
            payload: payload.into(),
            created_at: crate::now(),
        }
    }
}
