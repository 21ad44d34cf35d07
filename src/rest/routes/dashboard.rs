//! Published surveys of the signed-in user's organization.

use axum::{extract::State, Json};
use chrono::Utc;

use crate::dashboard::list_surveys;
use crate::organization::load_profile;
use crate::rest::dto::DashboardResponse;
use crate::rest::error::ApiError;
use crate::rest::extract::AuthUser;
use crate::rest::state::ApiState;

/// List the organization's surveys, newest first
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "Dashboard",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Organization surveys", body = DashboardResponse),
        (status = 401, description = "Not signed in", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn list(
    State(state): State<ApiState>,
    user: AuthUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    // The saved profile wins over the name recorded at signup
    let organization = match load_profile(state.store.as_ref(), &user.user.id).await? {
        Some(profile) => profile.name,
        None => user.user.metadata.organization_name.clone().unwrap_or_default(),
    };
    if organization.trim().is_empty() {
        return Ok(Json(DashboardResponse {
            organization,
            surveys: Vec::new(),
        }));
    }

    let surveys = list_surveys(
        state.store.as_ref(),
        &organization,
        &state.config.server.public_origin,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(Json(DashboardResponse {
        organization,
        surveys,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{UserInfo, UserMetadata};
    use crate::rest::state::tests::test_state;
    use crate::survey::{publish_draft, OrganizationRef, SurveyDraft, SurveyType};

    fn user(organization: Option<&str>) -> AuthUser {
        AuthUser {
            access_token: "t".into(),
            user: UserInfo {
                id: "u1".into(),
                email: "a@b.test".into(),
                metadata: UserMetadata {
                    organization_name: organization.map(str::to_string),
                    ..Default::default()
                },
            },
        }
    }

    #[tokio::test]
    async fn test_lists_surveys_for_signup_organization() {
        let state = test_state();
        let draft = SurveyDraft {
            name: "Pulse".into(),
            survey_type: Some(SurveyType::Quick),
            organization: Some(OrganizationRef {
                name: "MIRS Inc".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        publish_draft(state.store.as_ref(), &draft, Utc::now())
            .await
            .unwrap();

        let Json(resp) = list(State(state.clone()), user(Some("MIRS Inc")))
            .await
            .unwrap();
        assert_eq!(resp.organization, "MIRS Inc");
        assert_eq!(resp.surveys.len(), 1);
        assert_eq!(resp.surveys[0].name, "Pulse");

        let Json(resp) = list(State(state), user(None)).await.unwrap();
        assert!(resp.surveys.is_empty());
    }
}
