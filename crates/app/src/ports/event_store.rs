//! Event store port — append-only persistence for device events.

use std::future::Future;

use statehub_domain::error::HubError;
use statehub_domain::event::Event;
use statehub_domain::id::DeviceId;

/// Repository for persisting and querying [`Event`]s.
pub trait EventStore: Send + Sync {
    /// Append a new event.
    fn append(&self, event: Event) -> impl Future<Output = Result<Event, HubError>> + Send;

    /// Get the most recent events, ordered newest-first.
    fn get_recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Event>, HubError>> + Send;

    /// Find events for a specific device, ordered newest-first.
    fn find_by_device(
        &self,
        device_id: &DeviceId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Event>, HubError>> + Send;
}

impl<T: EventStore> EventStore for std::sync::Arc<T> {
    fn append(&self, event: Event) -> impl Future<Output = Result<Event, HubError>> + Send {
        (**self).append(event)
    }

    fn get_recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Event>, HubError>> + Send {
        (**self).get_recent(limit)
    }

    fn find_by_device(
        &self,
        device_id: &DeviceId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Event>, HubError>> + Send {
        (**self).find_by_device(device_id, limit)
    }
}
