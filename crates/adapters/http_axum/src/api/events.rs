//! JSON REST handlers for events.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use statehub_app::ports::{DeviceRepository, EventStore, RuleRepository};
use statehub_domain::event::Event;
use statehub_domain::id::DeviceId;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 1000;

/// Query parameters of the list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub device_id: Option<String>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Event>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/events?limit=&device_id=`, newest first.
pub async fn list<DR, ES, RR>(
    State(state): State<AppState<DR, ES, RR>>,
    Query(query): Query<ListQuery>,
) -> Result<ListResponse, ApiError>
where
    DR: DeviceRepository + 'static,
    ES: EventStore + 'static,
    RR: RuleRepository + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let events = match query.device_id {
        Some(device_id) => {
            let device_id = DeviceId::new(device_id)?;
            state.event_service.for_device(&device_id, limit).await?
        }
        None => state.event_service.recent(limit).await?,
    };
    Ok(ListResponse::Ok(Json(events)))
}
