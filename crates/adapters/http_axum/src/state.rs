//! Shared application state for axum handlers.

use std::sync::Arc;

use statehub_app::ports::{DeviceController, DeviceRepository, EventStore, RuleRepository};
use statehub_app::services::device_service::DeviceService;
use statehub_app::services::event_service::EventService;
use statehub_app::services::rule_service::RuleService;

/// Application state shared across all axum handlers.
///
/// Generic over the repository types to avoid dynamic dispatch on the
/// storage path; device commands go through the object-safe
/// [`DeviceController`].
/// `Clone` is implemented manually so the underlying types themselves do not
/// need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<DR, ES, RR> {
    /// Device registry service.
    pub device_service: Arc<DeviceService<DR>>,
    /// Event log queries.
    pub event_service: Arc<EventService<ES>>,
    /// Rule registry service, keeps the engine snapshot in sync.
    pub rule_service: Arc<RuleService<RR>>,
    /// Outbound commands and status requests.
    pub controller: Arc<dyn DeviceController>,
}

impl<DR, ES, RR> Clone for AppState<DR, ES, RR> {
    fn clone(&self) -> Self {
        Self {
            device_service: Arc::clone(&self.device_service),
            event_service: Arc::clone(&self.event_service),
            rule_service: Arc::clone(&self.rule_service),
            controller: Arc::clone(&self.controller),
        }
    }
}

impl<DR, ES, RR> AppState<DR, ES, RR>
where
    DR: DeviceRepository + 'static,
    ES: EventStore + 'static,
    RR: RuleRepository + 'static,
{
    /// Create a new application state from pre-wrapped `Arc` services.
    ///
    /// Services are shared with the daemon's background tasks, so they are
    /// handed over already wrapped.
    pub fn from_arcs(
        device_service: Arc<DeviceService<DR>>,
        event_service: Arc<EventService<ES>>,
        rule_service: Arc<RuleService<RR>>,
        controller: Arc<dyn DeviceController>,
    ) -> Self {
        Self {
            device_service,
            event_service,
            rule_service,
            controller,
        }
    }
}
