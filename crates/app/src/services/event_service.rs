//! Event service — read access to the event log.

use statehub_domain::error::HubError;
use statehub_domain::event::Event;
use statehub_domain::id::DeviceId;

use crate::ports::EventStore;

/// Application service for querying events.
pub struct EventService<S> {
    store: S,
}

impl<S: EventStore> EventService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Most recent events across all devices, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    pub async fn recent(&self, limit: usize) -> Result<Vec<Event>, HubError> {
        self.store.get_recent(limit).await
    }

    /// Most recent events of one device, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    #[tracing::instrument(skip(self), fields(device_id = %device_id))]
    pub async fn for_device(
        &self,
        device_id: &DeviceId,
        limit: usize,
    ) -> Result<Vec<Event>, HubError> {
        self.store.find_by_device(device_id, limit).await
    }
}
