//! Sign-in, sign-out and the signed-in user's own details.

use axum::{extract::State, http::StatusCode, Json};

use crate::identity::{with_timeout, UserInfo, UserMetadata, UserUpdate};
use crate::rest::dto::{ProfileRequest, ProfileResponse, SignInRequest, SignInResponse};
use crate::rest::error::ApiError;
use crate::rest::extract::{AuthUser, Lang};
use crate::rest::state::ApiState;
use crate::validation::{is_valid_email, ValidationErrors};

/// Exchange email and password for an access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/signin",
    tag = "Account",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 401, description = "Invalid credentials", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn sign_in(
    State(state): State<ApiState>,
    lang: Lang,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, ApiError> {
    let session = with_timeout(
        state.identity.name(),
        state.identity_timeout(),
        state
            .identity
            .sign_in_with_password(request.email.trim(), &request.password),
    )
    .await
    .map_err(|e| lang.identity(e))?;

    tracing::info!(user_id = %session.user.id, "user signed in");
    let response = SignInResponse {
        access_token: session.access_token.clone(),
        user: session.user.clone(),
        message: lang.t("notifications.signedIn"),
    };
    state
        .sessions
        .auth
        .insert(session.access_token.clone(), session)
        .await;
    Ok(Json(response))
}

/// Forget the caller's access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/signout",
    tag = "Account",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Not signed in", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn sign_out(State(state): State<ApiState>, user: AuthUser) -> StatusCode {
    state.sessions.auth.remove(&user.access_token).await;
    StatusCode::NO_CONTENT
}

/// The signed-in user
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "Account",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Not signed in", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn me(user: AuthUser) -> Json<UserInfo> {
    Json(user.user)
}

fn validate_profile(request: &ProfileRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.require("firstName", &request.first_name);
    errors.require("lastName", &request.last_name);
    errors.require("jobTitle", &request.job_title);
    if !is_valid_email(&request.email) {
        errors.add("email", "invalid_email");
    }
    errors.into_result()
}

/// Update the signed-in user's contact details
#[utoipa::path(
    put,
    path = "/api/v1/me",
    tag = "Account",
    security(("bearer" = [])),
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Invalid fields", body = crate::rest::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn update_profile(
    State(state): State<ApiState>,
    user: AuthUser,
    lang: Lang,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    validate_profile(&request).map_err(|e| lang.validation(&e))?;

    let email = request.email.trim().to_string();
    let update = UserUpdate {
        email: (email != user.user.email).then_some(email),
        metadata: UserMetadata {
            first_name: Some(request.first_name.trim().to_string()),
            last_name: Some(request.last_name.trim().to_string()),
            job_title: Some(request.job_title.trim().to_string()),
            organization_name: None,
        },
    };
    let updated = with_timeout(
        state.identity.name(),
        state.identity_timeout(),
        state.identity.update_user(&user.access_token, update),
    )
    .await
    .map_err(|e| lang.identity(e))?;

    state
        .sessions
        .auth
        .update(&user.access_token, |session| session.user = updated.clone())
        .await;
    tracing::info!(user_id = %updated.id, "profile updated");

    Ok(Json(ProfileResponse {
        user: updated,
        message: lang.t("notifications.profileUpdated"),
    }))
}
