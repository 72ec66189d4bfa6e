//! JSON REST handlers for devices and device commands.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use statehub_app::ports::{DeviceRepository, EventStore, RuleRepository};
use statehub_domain::Timestamp;
use statehub_domain::device::{Device, DeviceType};
use statehub_domain::id::DeviceId;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for registering a device.
#[derive(Deserialize)]
pub struct CreateDeviceRequest {
    pub device_id: String,
    /// `sensor`, `switch`, `clock` or `other` (default).
    pub device_type: Option<String>,
}

/// Request body for editing a device.
#[derive(Deserialize)]
pub struct UpdateDeviceRequest {
    pub device_type: String,
}

/// Request body for sending a command.
#[derive(Deserialize)]
pub struct CommandRequest {
    pub payload: String,
}

/// Last known state of a device.
#[derive(Debug, Serialize, Deserialize)]
pub struct StateBody {
    pub device_id: String,
    pub last_state: Option<String>,
    pub last_updated: Option<Timestamp>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Device>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and update endpoints.
pub enum GetResponse {
    Ok(Json<Device>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Device>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// Possible responses from the state endpoint.
pub enum StateResponse {
    Ok(Json<StateBody>),
}

impl IntoResponse for StateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the command and status-request endpoints.
///
/// The device answers asynchronously on its status topic; poll the state
/// endpoint to observe the result.
pub enum DispatchResponse {
    Accepted,
}

impl IntoResponse for DispatchResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted => StatusCode::ACCEPTED.into_response(),
        }
    }
}

/// `GET /api/devices`
pub async fn list<DR, ES, RR>(
    State(state): State<AppState<DR, ES, RR>>,
) -> Result<ListResponse, ApiError>
where
    DR: DeviceRepository + 'static,
    ES: EventStore + 'static,
    RR: RuleRepository + 'static,
{
    let devices = state.device_service.list_devices().await?;
    Ok(ListResponse::Ok(Json(devices)))
}

/// `GET /api/devices/{device_id}`
pub async fn get<DR, ES, RR>(
    State(state): State<AppState<DR, ES, RR>>,
    Path(device_id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    DR: DeviceRepository + 'static,
    ES: EventStore + 'static,
    RR: RuleRepository + 'static,
{
    let device_id = DeviceId::new(device_id)?;
    let device = state.device_service.get_device(&device_id).await?;
    Ok(GetResponse::Ok(Json(device)))
}

/// `POST /api/devices`
pub async fn create<DR, ES, RR>(
    State(state): State<AppState<DR, ES, RR>>,
    Json(req): Json<CreateDeviceRequest>,
) -> Result<CreateResponse, ApiError>
where
    DR: DeviceRepository + 'static,
    ES: EventStore + 'static,
    RR: RuleRepository + 'static,
{
    let device_type = req
        .device_type
        .as_deref()
        .map(DeviceType::from_str)
        .transpose()?
        .unwrap_or(DeviceType::Other);
    let created = state
        .device_service
        .add_device(&req.device_id, device_type)
        .await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/devices/{device_id}`
pub async fn update<DR, ES, RR>(
    State(state): State<AppState<DR, ES, RR>>,
    Path(device_id): Path<String>,
    Json(req): Json<UpdateDeviceRequest>,
) -> Result<GetResponse, ApiError>
where
    DR: DeviceRepository + 'static,
    ES: EventStore + 'static,
    RR: RuleRepository + 'static,
{
    let device_id = DeviceId::new(device_id)?;
    let device_type = DeviceType::from_str(&req.device_type)?;
    let device = state
        .device_service
        .edit_device_type(&device_id, device_type)
        .await?;
    Ok(GetResponse::Ok(Json(device)))
}

/// `DELETE /api/devices/{device_id}`
pub async fn delete<DR, ES, RR>(
    State(state): State<AppState<DR, ES, RR>>,
    Path(device_id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    DR: DeviceRepository + 'static,
    ES: EventStore + 'static,
    RR: RuleRepository + 'static,
{
    let device_id = DeviceId::new(device_id)?;
    state.device_service.delete_device(&device_id).await?;
    Ok(DeleteResponse::NoContent)
}

/// `GET /api/devices/{device_id}/state`
pub async fn state<DR, ES, RR>(
    State(state): State<AppState<DR, ES, RR>>,
    Path(device_id): Path<String>,
) -> Result<StateResponse, ApiError>
where
    DR: DeviceRepository + 'static,
    ES: EventStore + 'static,
    RR: RuleRepository + 'static,
{
    let device_id = DeviceId::new(device_id)?;
    let current = state.device_service.get_state(&device_id).await?;
    Ok(StateResponse::Ok(Json(StateBody {
        device_id: current.device_id.into(),
        last_state: current.last_state,
        last_updated: current.last_updated,
    })))
}

/// `POST /api/devices/{device_id}/command`
pub async fn command<DR, ES, RR>(
    State(state): State<AppState<DR, ES, RR>>,
    Path(device_id): Path<String>,
    Json(req): Json<CommandRequest>,
) -> Result<DispatchResponse, ApiError>
where
    DR: DeviceRepository + 'static,
    ES: EventStore + 'static,
    RR: RuleRepository + 'static,
{
    let device_id = DeviceId::new(device_id)?;
    state.controller.send_command(&device_id, &req.payload)?;
    Ok(DispatchResponse::Accepted)
}

/// `POST /api/devices/{device_id}/status-request`
///
/// Only registered devices are asked; their answer is routed like any
/// other status report.
pub async fn status_request<DR, ES, RR>(
    State(state): State<AppState<DR, ES, RR>>,
    Path(device_id): Path<String>,
) -> Result<DispatchResponse, ApiError>
where
    DR: DeviceRepository + 'static,
    ES: EventStore + 'static,
    RR: RuleRepository + 'static,
{
    let device_id = DeviceId::new(device_id)?;
    state.device_service.get_device(&device_id).await?;
    state.controller.request_status(&device_id)?;
    Ok(DispatchResponse::Accepted)
}
