//! Account signup wizard endpoints.
//!
//! Each signup session keeps its wizard server-side. Advancing from the
//! account step creates the account; on success the organization answers
//! are saved as the new user's organization profile.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::organization::save_profile;
use crate::rest::dto::{SignupJumpRequest, SignupView};
use crate::rest::error::ApiError;
use crate::rest::extract::Lang;
use crate::rest::state::ApiState;
use crate::wizard::{advance_signup, SignupStep, SignupStepInput, SignupWizard};

/// Start a signup session
#[utoipa::path(
    post,
    path = "/api/v1/signup",
    tag = "Signup",
    responses(
        (status = 201, description = "Signup session created", body = SignupView)
    )
)]
pub async fn start(
    State(state): State<ApiState>,
    lang: Lang,
) -> (StatusCode, Json<SignupView>) {
    let id = Uuid::new_v4();
    let wizard = SignupWizard::new(state.config.email_redirect_url());
    let view = SignupView::new(id, &wizard, &lang);
    state
        .sessions
        .signups
        .insert(id, Arc::new(Mutex::new(wizard)))
        .await;
    tracing::debug!(signup_id = %id, "signup session started");
    (StatusCode::CREATED, Json(view))
}

/// Get a signup session
#[utoipa::path(
    get,
    path = "/api/v1/signup/{id}",
    tag = "Signup",
    params(("id" = Uuid, Path, description = "Signup session id")),
    responses(
        (status = 200, description = "Signup state", body = SignupView),
        (status = 404, description = "Unknown session", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn get_one(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    lang: Lang,
) -> Result<Json<SignupView>, ApiError> {
    let wizard = state.signup(id).await?;
    let wizard = wizard.lock().await;
    Ok(Json(SignupView::new(id, &wizard, &lang)))
}

/// Submit the current step's answers and move forward
#[utoipa::path(
    post,
    path = "/api/v1/signup/{id}/advance",
    tag = "Signup",
    params(("id" = Uuid, Path, description = "Signup session id")),
    request_body = SignupStepInput,
    responses(
        (status = 200, description = "Moved to the next step", body = SignupView),
        (status = 400, description = "Invalid answers", body = crate::rest::error::ErrorResponse),
        (status = 409, description = "Account creation already running", body = crate::rest::error::ErrorResponse),
        (status = 502, description = "Identity backend failed", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn advance(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    lang: Lang,
    Json(input): Json<SignupStepInput>,
) -> Result<Json<SignupView>, ApiError> {
    let wizard = state.signup(id).await?;
    let step = advance_signup(
        &wizard,
        state.identity.as_ref(),
        state.identity_timeout(),
        input,
    )
    .await
    .map_err(|e| lang.wizard(e))?;

    let wizard = wizard.lock().await;
    if step == SignupStep::Verification {
        save_signup_profile(&state, &wizard).await;
        // Nothing left to do in the wizard once the account exists
        state.sessions.signups.remove(&id).await;
        tracing::debug!(signup_id = %id, "signup session finished");
    }
    Ok(Json(SignupView::new(id, &wizard, &lang)))
}

/// The account exists at this point, so a profile that fails to save is
/// logged rather than reported. The user can save it again later.
async fn save_signup_profile(state: &ApiState, wizard: &SignupWizard) {
    let draft = wizard.draft();
    let (Some(user), Some(organization)) = (&draft.user, &draft.organization) else {
        return;
    };
    if let Err(e) = save_profile(
        state.store.as_ref(),
        &user.id,
        &organization.to_organization(),
    )
    .await
    {
        tracing::warn!(user_id = %user.id, error = %e, "could not save organization profile");
    }
}

/// Go back one step
#[utoipa::path(
    post,
    path = "/api/v1/signup/{id}/retreat",
    tag = "Signup",
    params(("id" = Uuid, Path, description = "Signup session id")),
    responses(
        (status = 200, description = "Moved to the previous step", body = SignupView),
        (status = 400, description = "Cannot go back from here", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn retreat(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    lang: Lang,
) -> Result<Json<SignupView>, ApiError> {
    let wizard = state.signup(id).await?;
    let mut wizard = wizard.lock().await;
    wizard.retreat().map_err(|e| lang.wizard(e))?;
    Ok(Json(SignupView::new(id, &wizard, &lang)))
}

/// Jump to an already visited step
#[utoipa::path(
    post,
    path = "/api/v1/signup/{id}/jump",
    tag = "Signup",
    params(("id" = Uuid, Path, description = "Signup session id")),
    request_body = SignupJumpRequest,
    responses(
        (status = 200, description = "Moved to the requested step", body = SignupView),
        (status = 400, description = "Step not visited yet", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn jump(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    lang: Lang,
    Json(request): Json<SignupJumpRequest>,
) -> Result<Json<SignupView>, ApiError> {
    let wizard = state.signup(id).await?;
    let mut wizard = wizard.lock().await;
    wizard.jump_to(request.step).map_err(|e| lang.wizard(e))?;
    Ok(Json(SignupView::new(id, &wizard, &lang)))
}
