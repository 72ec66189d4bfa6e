//! JSON REST handlers for rules.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use statehub_app::ports::{DeviceRepository, EventStore, RuleRepository};
use statehub_domain::id::RuleId;
use statehub_domain::rule::Rule;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a rule.
#[derive(Deserialize)]
pub struct CreateRuleRequest {
    pub name: String,
    pub condition: String,
    pub action: String,
}

/// Result of a reload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadBody {
    /// Rules active after the reload.
    pub active: usize,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Rule>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<Rule>),
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
    Created(Json<Rule>),
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

/// Possible responses from the reload endpoint.
pub enum ReloadResponse {
    Ok(Json<ReloadBody>),
}

impl IntoResponse for ReloadResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/rules`
pub async fn list<DR, ES, RR>(
    State(state): State<AppState<DR, ES, RR>>,
) -> Result<ListResponse, ApiError>
where
    DR: DeviceRepository + 'static,
    ES: EventStore + 'static,
    RR: RuleRepository + 'static,
{
    let rules = state.rule_service.list_rules().await?;
    Ok(ListResponse::Ok(Json(rules)))
}

/// `GET /api/rules/{id}`
pub async fn get<DR, ES, RR>(
    State(state): State<AppState<DR, ES, RR>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    DR: DeviceRepository + 'static,
    ES: EventStore + 'static,
    RR: RuleRepository + 'static,
{
    let rule_id = RuleId::from_str(&id)?;
    let rule = state.rule_service.get_rule(rule_id).await?;
    Ok(GetResponse::Ok(Json(rule)))
}

/// `POST /api/rules`
pub async fn create<DR, ES, RR>(
    State(state): State<AppState<DR, ES, RR>>,
    Json(req): Json<CreateRuleRequest>,
) -> Result<CreateResponse, ApiError>
where
    DR: DeviceRepository + 'static,
    ES: EventStore + 'static,
    RR: RuleRepository + 'static,
{
    let rule = state
        .rule_service
        .create_rule(&req.name, &req.condition, &req.action)
        .await?;
    Ok(CreateResponse::Created(Json(rule)))
}

/// `DELETE /api/rules/{id}`
pub async fn delete<DR, ES, RR>(
    State(state): State<AppState<DR, ES, RR>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    DR: DeviceRepository + 'static,
    ES: EventStore + 'static,
    RR: RuleRepository + 'static,
{
    let rule_id = RuleId::from_str(&id)?;
    state.rule_service.delete_rule(rule_id).await?;
    Ok(DeleteResponse::NoContent)
}

/// `POST /api/rules/reload`
pub async fn reload<DR, ES, RR>(
    State(state): State<AppState<DR, ES, RR>>,
) -> Result<ReloadResponse, ApiError>
where
    DR: DeviceRepository + 'static,
    ES: EventStore + 'static,
    RR: RuleRepository + 'static,
{
    let active = state.rule_service.reload().await?;
    Ok(ReloadResponse::Ok(Json(ReloadBody { active })))
}
