//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod events;
#[allow(clippy::missing_errors_doc)]
pub mod rules;

use axum::Router;
use axum::routing::{get, post};

use statehub_app::ports::{DeviceRepository, EventStore, RuleRepository};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<DR, ES, RR>() -> Router<AppState<DR, ES, RR>>
where
    DR: DeviceRepository + 'static,
    ES: EventStore + 'static,
    RR: RuleRepository + 'static,
{
    Router::new()
        // Devices
        .route(
            "/devices",
            get(devices::list::<DR, ES, RR>).post(devices::create::<DR, ES, RR>),
        )
        .route(
            "/devices/{device_id}",
            get(devices::get::<DR, ES, RR>)
                .put(devices::update::<DR, ES, RR>)
                .delete(devices::delete::<DR, ES, RR>),
        )
        .route(
            "/devices/{device_id}/state",
            get(devices::state::<DR, ES, RR>),
        )
        .route(
            "/devices/{device_id}/command",
            post(devices::command::<DR, ES, RR>),
        )
        .route(
            "/devices/{device_id}/status-request",
            post(devices::status_request::<DR, ES, RR>),
        )
        // Rules
        .route(
            "/rules",
            get(rules::list::<DR, ES, RR>).post(rules::create::<DR, ES, RR>),
        )
        .route("/rules/reload", post(rules::reload::<DR, ES, RR>))
        .route(
            "/rules/{id}",
            get(rules::get::<DR, ES, RR>).delete(rules::delete::<DR, ES, RR>),
        )
        // Events
        .route("/events", get(events::list::<DR, ES, RR>))
}
