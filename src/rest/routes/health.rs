//! Health check and status endpoints.

use axum::{extract::State, Json};

use crate::rest::dto::{HealthResponse, StatusResponse};
use crate::rest::error::ApiError;
use crate::rest::state::ApiState;
use crate::store::SURVEY_KEY_PREFIX;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get service status with backend info
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "Health",
    responses(
        (status = 200, description = "Service status with backend info", body = StatusResponse)
    )
)]
pub async fn status(State(state): State<ApiState>) -> Result<Json<StatusResponse>, ApiError> {
    let published_surveys = state.store.list_keys(SURVEY_KEY_PREFIX).await?.len();

    Ok(Json(StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: state.store.name().to_string(),
        identity: state.identity.name().to_string(),
        published_surveys,
        open_drafts: state.sessions.drafts.len().await,
        open_signups: state.sessions.signups.len().await,
    }))
}
