//! Survey creation wizard endpoints.
//!
//! Drafts live in memory, one wizard per draft, and belong to the user who
//! created them. Publishing writes the draft to the store and returns its
//! public link.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::organization::load_profile;
use crate::rest::dto::{
    DepartmentRequest, DepartmentsResponse, DraftView, PublishResponse, ReorderRequest,
    ReorderResponse, SelectionResponse, SurveyJumpRequest, ToggleRequest,
};
use crate::rest::error::ApiError;
use crate::rest::extract::{AuthUser, Lang};
use crate::rest::state::{ApiState, DraftEntry};
use crate::survey::{DepartmentPatch, SurveyDraft};
use crate::wizard::{SurveyStepInput, SurveyWizard};

fn departments_of(wizard: &SurveyWizard) -> Vec<crate::survey::Department> {
    wizard
        .draft()
        .organization
        .as_ref()
        .map(|o| o.departments.clone())
        .unwrap_or_default()
}

/// Start a survey draft, pre-filled with the saved organization profile
#[utoipa::path(
    post,
    path = "/api/v1/drafts",
    tag = "Drafts",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Draft created", body = DraftView),
        (status = 401, description = "Not signed in", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn create(
    State(state): State<ApiState>,
    user: AuthUser,
    lang: Lang,
) -> Result<(StatusCode, Json<DraftView>), ApiError> {
    let wizard = match load_profile(state.store.as_ref(), &user.user.id).await? {
        Some(profile) => SurveyWizard::with_organization(profile),
        None => SurveyWizard::new(),
    };

    let id = Uuid::new_v4();
    let view = DraftView::new(id, &wizard, &lang);
    state
        .sessions
        .drafts
        .insert(
            id,
            DraftEntry {
                owner: user.user.id.clone(),
                wizard: Arc::new(Mutex::new(wizard)),
            },
        )
        .await;
    tracing::info!(draft_id = %id, user_id = %user.user.id, "survey draft started");
    Ok((StatusCode::CREATED, Json(view)))
}

/// Get a draft
#[utoipa::path(
    get,
    path = "/api/v1/drafts/{id}",
    tag = "Drafts",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Draft id")),
    responses(
        (status = 200, description = "Draft state", body = DraftView),
        (status = 404, description = "Unknown draft", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn get_one(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    lang: Lang,
) -> Result<Json<DraftView>, ApiError> {
    let wizard = state.draft(id, &user.user.id).await?;
    let wizard = wizard.lock().await;
    Ok(Json(DraftView::new(id, &wizard, &lang)))
}

/// Discard a draft
#[utoipa::path(
    delete,
    path = "/api/v1/drafts/{id}",
    tag = "Drafts",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Draft id")),
    responses(
        (status = 204, description = "Draft discarded"),
        (status = 404, description = "Unknown draft", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn discard(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<StatusCode, ApiError> {
    // Ownership check before removal
    state.draft(id, &user.user.id).await?;
    state.sessions.drafts.remove(&id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Submit the current step's answers and move forward
#[utoipa::path(
    post,
    path = "/api/v1/drafts/{id}/advance",
    tag = "Drafts",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Draft id")),
    request_body = SurveyStepInput,
    responses(
        (status = 200, description = "Moved to the next step", body = DraftView),
        (status = 400, description = "Invalid answers", body = crate::rest::error::ErrorResponse),
        (status = 409, description = "Draft already published", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn advance(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    lang: Lang,
    Json(input): Json<SurveyStepInput>,
) -> Result<Json<DraftView>, ApiError> {
    let wizard = state.draft(id, &user.user.id).await?;
    let mut wizard = wizard.lock().await;
    wizard.advance(input).map_err(|e| lang.wizard(e))?;
    Ok(Json(DraftView::new(id, &wizard, &lang)))
}

/// Go back one step
#[utoipa::path(
    post,
    path = "/api/v1/drafts/{id}/retreat",
    tag = "Drafts",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Draft id")),
    responses(
        (status = 200, description = "Moved to the previous step", body = DraftView),
        (status = 400, description = "Already at the first step", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn retreat(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    lang: Lang,
) -> Result<Json<DraftView>, ApiError> {
    let wizard = state.draft(id, &user.user.id).await?;
    let mut wizard = wizard.lock().await;
    wizard.retreat().map_err(|e| lang.wizard(e))?;
    Ok(Json(DraftView::new(id, &wizard, &lang)))
}

/// Jump to an already visited step
#[utoipa::path(
    post,
    path = "/api/v1/drafts/{id}/jump",
    tag = "Drafts",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Draft id")),
    request_body = SurveyJumpRequest,
    responses(
        (status = 200, description = "Moved to the requested step", body = DraftView),
        (status = 400, description = "Step not visited yet", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn jump(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    lang: Lang,
    Json(request): Json<SurveyJumpRequest>,
) -> Result<Json<DraftView>, ApiError> {
    let wizard = state.draft(id, &user.user.id).await?;
    let mut wizard = wizard.lock().await;
    wizard.jump_to(request.step).map_err(|e| lang.wizard(e))?;
    Ok(Json(DraftView::new(id, &wizard, &lang)))
}

/// Move one question in the builder
#[utoipa::path(
    post,
    path = "/api/v1/drafts/{id}/reorder",
    tag = "Drafts",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Draft id")),
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Question order", body = ReorderResponse),
        (status = 400, description = "Not at the builder step", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn reorder(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    lang: Lang,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<ReorderResponse>, ApiError> {
    let wizard = state.draft(id, &user.user.id).await?;
    let mut wizard = wizard.lock().await;
    let moved = wizard
        .reorder(request.from, request.to)
        .map_err(|e| lang.wizard(e))?;
    Ok(Json(ReorderResponse {
        moved,
        questions: wizard.draft().questions.clone(),
    }))
}

/// Select or deselect one demographic question
#[utoipa::path(
    post,
    path = "/api/v1/drafts/{id}/demographics/toggle",
    tag = "Drafts",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Draft id")),
    request_body = ToggleRequest,
    responses(
        (status = 200, description = "Current selection", body = SelectionResponse),
        (status = 400, description = "Unknown question or wrong step", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn toggle_demographic(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    lang: Lang,
    Json(request): Json<ToggleRequest>,
) -> Result<Json<SelectionResponse>, ApiError> {
    let wizard = state.draft(id, &user.user.id).await?;
    let mut wizard = wizard.lock().await;
    wizard
        .toggle_demographic(&request.id)
        .map_err(|e| lang.wizard(e))?;
    Ok(Json(SelectionResponse {
        selected: wizard.draft().selected_demographics.clone(),
    }))
}

/// Select every demographic question, or clear a full selection
#[utoipa::path(
    post,
    path = "/api/v1/drafts/{id}/demographics/toggle-all",
    tag = "Drafts",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Draft id")),
    responses(
        (status = 200, description = "Current selection", body = SelectionResponse),
        (status = 400, description = "Not at the demographics step", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn toggle_all_demographics(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    lang: Lang,
) -> Result<Json<SelectionResponse>, ApiError> {
    let wizard = state.draft(id, &user.user.id).await?;
    let mut wizard = wizard.lock().await;
    let selected = wizard
        .toggle_all_demographics()
        .map_err(|e| lang.wizard(e))?
        .clone();
    Ok(Json(SelectionResponse { selected }))
}

/// Add a department, or a sub-department when `parentId` is set
#[utoipa::path(
    post,
    path = "/api/v1/drafts/{id}/departments",
    tag = "Drafts",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Draft id")),
    request_body = DepartmentRequest,
    responses(
        (status = 201, description = "Department added", body = DepartmentsResponse),
        (status = 400, description = "Missing name or wrong step", body = crate::rest::error::ErrorResponse),
        (status = 404, description = "Unknown parent department", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn add_department(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    lang: Lang,
    Json(request): Json<DepartmentRequest>,
) -> Result<(StatusCode, Json<DepartmentsResponse>), ApiError> {
    let wizard = state.draft(id, &user.user.id).await?;
    let mut wizard = wizard.lock().await;
    let created = match &request.parent_id {
        Some(parent) => wizard
            .add_sub_department(parent, &request.name, request.size)
            .map_err(|e| lang.wizard(e))?
            .ok_or_else(|| ApiError::NotFound(format!("Department '{}' not found", parent)))?,
        None => wizard
            .add_department(&request.name, request.size)
            .map_err(|e| lang.wizard(e))?,
    };
    Ok((
        StatusCode::CREATED,
        Json(DepartmentsResponse {
            id: Some(created),
            departments: departments_of(&wizard),
        }),
    ))
}

/// Rename or resize a department
#[utoipa::path(
    put,
    path = "/api/v1/drafts/{id}/departments/{department_id}",
    tag = "Drafts",
    security(("bearer" = [])),
    params(
        ("id" = Uuid, Path, description = "Draft id"),
        ("department_id" = String, Path, description = "Department id")
    ),
    request_body = DepartmentPatch,
    responses(
        (status = 200, description = "Department updated", body = DepartmentsResponse),
        (status = 404, description = "Unknown department", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn update_department(
    State(state): State<ApiState>,
    Path((id, department_id)): Path<(Uuid, String)>,
    user: AuthUser,
    lang: Lang,
    Json(patch): Json<DepartmentPatch>,
) -> Result<Json<DepartmentsResponse>, ApiError> {
    let wizard = state.draft(id, &user.user.id).await?;
    let mut wizard = wizard.lock().await;
    if !wizard
        .update_department(&department_id, patch)
        .map_err(|e| lang.wizard(e))?
    {
        return Err(ApiError::NotFound(format!(
            "Department '{}' not found",
            department_id
        )));
    }
    Ok(Json(DepartmentsResponse {
        id: None,
        departments: departments_of(&wizard),
    }))
}

/// Remove a department and its sub-departments
#[utoipa::path(
    delete,
    path = "/api/v1/drafts/{id}/departments/{department_id}",
    tag = "Drafts",
    security(("bearer" = [])),
    params(
        ("id" = Uuid, Path, description = "Draft id"),
        ("department_id" = String, Path, description = "Department id")
    ),
    responses(
        (status = 200, description = "Department removed", body = DepartmentsResponse),
        (status = 404, description = "Unknown department", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn remove_department(
    State(state): State<ApiState>,
    Path((id, department_id)): Path<(Uuid, String)>,
    user: AuthUser,
    lang: Lang,
) -> Result<Json<DepartmentsResponse>, ApiError> {
    let wizard = state.draft(id, &user.user.id).await?;
    let mut wizard = wizard.lock().await;
    if !wizard
        .remove_department(&department_id)
        .map_err(|e| lang.wizard(e))?
    {
        return Err(ApiError::NotFound(format!(
            "Department '{}' not found",
            department_id
        )));
    }
    Ok(Json(DepartmentsResponse {
        id: None,
        departments: departments_of(&wizard),
    }))
}

/// Publish the draft and get its public link
#[utoipa::path(
    post,
    path = "/api/v1/drafts/{id}/publish",
    tag = "Drafts",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Draft id")),
    responses(
        (status = 200, description = "Survey published", body = PublishResponse),
        (status = 400, description = "Not at the review step", body = crate::rest::error::ErrorResponse),
        (status = 409, description = "Survey id already taken", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn publish(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    lang: Lang,
) -> Result<Json<PublishResponse>, ApiError> {
    let wizard = state.draft(id, &user.user.id).await?;
    let mut wizard = wizard.lock().await;
    let outcome = wizard
        .publish(
            state.store.as_ref(),
            &state.config.server.public_origin,
            Utc::now(),
        )
        .await
        .map_err(|e| lang.wizard(e))?;
    Ok(Json(PublishResponse::new(outcome, &lang)))
}

/// Draft contents only, for clients that render a summary
#[utoipa::path(
    get,
    path = "/api/v1/drafts/{id}/summary",
    tag = "Drafts",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Draft id")),
    responses(
        (status = 200, description = "Draft contents", body = SurveyDraft),
        (status = 404, description = "Unknown draft", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn summary(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<Json<SurveyDraft>, ApiError> {
    let wizard = state.draft(id, &user.user.id).await?;
    let wizard = wizard.lock().await;
    Ok(Json(wizard.draft().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locale;
    use crate::identity::{UserInfo, UserMetadata};
    use crate::organization::save_profile;
    use crate::rest::state::tests::test_state;
    use crate::survey::{OrganizationRef, SurveyType};
    use crate::wizard::{BuilderInput, DemographicsInput, SurveyStep, TypeInput};

    fn user(id: &str) -> AuthUser {
        AuthUser {
            access_token: format!("token-{id}"),
            user: UserInfo {
                id: id.to_string(),
                email: format!("{id}@mirs.test"),
                metadata: UserMetadata::default(),
            },
        }
    }

    fn lang(state: &ApiState) -> Lang {
        Lang::new(Locale::En, state.translator.clone())
    }

    fn profile() -> OrganizationRef {
        OrganizationRef {
            name: "MIRS Inc".into(),
            employee_count: "100-499".into(),
            survey_employee_count: "100-499".into(),
            organization_type: "À but lucratif".into(),
            sector: "Secteur privé".into(),
            union_status: "Syndicat".into(),
            industry: "Fabrication".into(),
            departments: Vec::new(),
        }
    }

    async fn created(state: &ApiState, owner: &str) -> Uuid {
        let (_, Json(view)) = create(State(state.clone()), user(owner), lang(state))
            .await
            .unwrap();
        view.id
    }

    async fn step(state: &ApiState, id: Uuid, input: SurveyStepInput) -> DraftView {
        let Json(view) = advance(State(state.clone()), Path(id), user("u1"), lang(state), Json(input))
            .await
            .unwrap();
        view
    }

    #[tokio::test]
    async fn test_draft_prefilled_from_profile() {
        let state = test_state();
        save_profile(state.store.as_ref(), "u1", &profile())
            .await
            .unwrap();
        let id = created(&state, "u1").await;

        let Json(view) = get_one(State(state.clone()), Path(id), user("u1"), lang(&state))
            .await
            .unwrap();
        assert_eq!(view.draft.organization_name(), Some("MIRS Inc"));
        assert_eq!(view.current_step, SurveyStep::Type);
    }

    #[tokio::test]
    async fn test_other_users_cannot_see_draft() {
        let state = test_state();
        let id = created(&state, "u1").await;
        let err = get_one(State(state.clone()), Path(id), user("u2"), lang(&state))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = discard(State(state.clone()), Path(id), user("u2"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(
            discard(State(state), Path(id), user("u1")).await.unwrap(),
            StatusCode::NO_CONTENT
        );
    }

    #[tokio::test]
    async fn test_full_wizard_to_publish() {
        let state = test_state();
        let id = created(&state, "u1").await;

        step(
            &state,
            id,
            SurveyStepInput::Type(TypeInput {
                name: "Sondage printemps".into(),
                survey_type: Some(SurveyType::Quick),
                end_date: None,
            }),
        )
        .await;
        let department = || {
            Json(DepartmentRequest {
                name: "RH".into(),
                size: 12,
                parent_id: None,
            })
        };
        let (status, Json(depts)) = add_department(
            State(state.clone()),
            Path(id),
            user("u1"),
            lang(&state),
            department(),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(depts.departments.len(), 1);

        // Departments entered in place survive a form submit without them
        let view = step(&state, id, SurveyStepInput::Organization(profile())).await;
        assert_eq!(view.draft.organization.unwrap().departments.len(), 1);

        // Departments can only be edited at the organization step
        let err = add_department(
            State(state.clone()),
            Path(id),
            user("u1"),
            lang(&state),
            department(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let Json(selection) = toggle_demographic(
            State(state.clone()),
            Path(id),
            user("u1"),
            lang(&state),
            Json(ToggleRequest { id: "age".into() }),
        )
        .await
        .unwrap();
        assert!(selection.selected.contains("age"));

        step(
            &state,
            id,
            SurveyStepInput::Demographics(DemographicsInput { selected: None }),
        )
        .await;

        let Json(order) = reorder(
            State(state.clone()),
            Path(id),
            user("u1"),
            lang(&state),
            Json(ReorderRequest { from: 0, to: 5 }),
        )
        .await
        .unwrap();
        assert!(order.moved);
        assert_eq!(order.questions[5].id, "q1");

        let view = step(&state, id, SurveyStepInput::Builder(BuilderInput::default())).await;
        assert_eq!(view.current_step, SurveyStep::Review);

        let Json(published) = publish(State(state.clone()), Path(id), user("u1"), lang(&state))
            .await
            .unwrap();
        assert!(published.created);
        assert!(published.id.starts_with("mirs-inc-"));
        assert_eq!(
            published.link,
            format!("http://localhost:7080/survey/{}", published.id)
        );

        let Json(again) = publish(State(state.clone()), Path(id), user("u1"), lang(&state))
            .await
            .unwrap();
        assert!(!again.created);
        assert_eq!(again.id, published.id);
    }
}
