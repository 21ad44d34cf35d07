//! Public survey pages and anonymous response sessions. No sign-in needed.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::response::{load_survey, ResponseSession};
use crate::rest::dto::{AnswerRequest, ResponseSessionView, SubmitResponse, SurveyView};
use crate::rest::error::ApiError;
use crate::rest::extract::Lang;
use crate::rest::state::ApiState;

/// Get a published survey that is still open
#[utoipa::path(
    get,
    path = "/api/v1/surveys/{survey_id}",
    tag = "Responses",
    params(("survey_id" = String, Path, description = "Published survey id")),
    responses(
        (status = 200, description = "Survey questions", body = SurveyView),
        (status = 404, description = "Unknown or expired survey", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn get_survey(
    State(state): State<ApiState>,
    Path(survey_id): Path<String>,
    lang: Lang,
) -> Result<Json<SurveyView>, ApiError> {
    let survey = load_survey(state.store.as_ref(), &survey_id)
        .await
        .map_err(|e| lang.response(e))?;
    Ok(Json(SurveyView::from(&survey)))
}

/// Start answering a survey
#[utoipa::path(
    post,
    path = "/api/v1/surveys/{survey_id}/responses",
    tag = "Responses",
    params(("survey_id" = String, Path, description = "Published survey id")),
    responses(
        (status = 201, description = "Response session started", body = ResponseSessionView),
        (status = 404, description = "Unknown or expired survey", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn start(
    State(state): State<ApiState>,
    Path(survey_id): Path<String>,
    lang: Lang,
) -> Result<(StatusCode, Json<ResponseSessionView>), ApiError> {
    let survey = load_survey(state.store.as_ref(), &survey_id)
        .await
        .map_err(|e| lang.response(e))?;
    let session = ResponseSession::new(survey);
    let view = ResponseSessionView::from(&session);
    state
        .sessions
        .responses
        .insert(session.id(), Arc::new(Mutex::new(session)))
        .await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Get a response session
#[utoipa::path(
    get,
    path = "/api/v1/responses/{id}",
    tag = "Responses",
    params(("id" = Uuid, Path, description = "Response session id")),
    responses(
        (status = 200, description = "Answers so far", body = ResponseSessionView),
        (status = 404, description = "Unknown session", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn get_one(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResponseSessionView>, ApiError> {
    let session = state.response_session(id).await?;
    let session = session.lock().await;
    Ok(Json(ResponseSessionView::from(&*session)))
}

/// Record or change one answer
#[utoipa::path(
    put,
    path = "/api/v1/responses/{id}/answers",
    tag = "Responses",
    params(("id" = Uuid, Path, description = "Response session id")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = ResponseSessionView),
        (status = 400, description = "Unknown question or label", body = crate::rest::error::ErrorResponse),
        (status = 404, description = "Unknown session", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn answer(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    lang: Lang,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<ResponseSessionView>, ApiError> {
    let session = state.response_session(id).await?;
    let mut session = session.lock().await;
    session
        .record_answer(&request.question_id, &request.label)
        .map_err(|e| lang.response(e))?;
    Ok(Json(ResponseSessionView::from(&*session)))
}

/// Submit the answers. The session is closed afterwards.
#[utoipa::path(
    post,
    path = "/api/v1/responses/{id}/submit",
    tag = "Responses",
    params(("id" = Uuid, Path, description = "Response session id")),
    responses(
        (status = 200, description = "Responses stored", body = SubmitResponse),
        (status = 404, description = "Unknown session or expired survey", body = crate::rest::error::ErrorResponse),
        (status = 422, description = "Required questions unanswered", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn submit(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    lang: Lang,
) -> Result<Json<SubmitResponse>, ApiError> {
    let session = state.response_session(id).await?;
    let survey_id = {
        let mut session = session.lock().await;
        session
            .submit(state.store.as_ref(), Utc::now())
            .await
            .map_err(|e| lang.response(e))?;
        session.survey().id.clone()
    };
    state.sessions.responses.remove(&id).await;

    Ok(Json(SubmitResponse {
        survey_id,
        message: lang.t("notifications.responseSubmitted"),
    }))
}
