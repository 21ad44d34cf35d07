//! The signed-in user's saved organization profile.

use axum::{extract::State, Json};

use crate::organization::{load_profile, save_profile};
use crate::rest::error::ApiError;
use crate::rest::extract::{AuthUser, Lang};
use crate::rest::state::ApiState;
use crate::survey::OrganizationRef;

/// Get the saved organization profile
#[utoipa::path(
    get,
    path = "/api/v1/organization",
    tag = "Account",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Saved profile", body = OrganizationRef),
        (status = 401, description = "Not signed in", body = crate::rest::error::ErrorResponse),
        (status = 404, description = "No profile saved yet", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn get_one(
    State(state): State<ApiState>,
    user: AuthUser,
) -> Result<Json<OrganizationRef>, ApiError> {
    load_profile(state.store.as_ref(), &user.user.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No organization profile saved".to_string()))
}

/// Replace the saved organization profile
#[utoipa::path(
    put,
    path = "/api/v1/organization",
    tag = "Account",
    security(("bearer" = [])),
    request_body = OrganizationRef,
    responses(
        (status = 200, description = "Profile saved", body = OrganizationRef),
        (status = 400, description = "Invalid fields", body = crate::rest::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn update(
    State(state): State<ApiState>,
    user: AuthUser,
    lang: Lang,
    Json(mut organization): Json<OrganizationRef>,
) -> Result<Json<OrganizationRef>, ApiError> {
    organization.name = organization.name.trim().to_string();
    save_profile(state.store.as_ref(), &user.user.id, &organization)
        .await
        .map_err(|e| lang.profile(e))?;
    Ok(Json(organization))
}
