//! Data Transfer Objects for the REST API.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::catalog::organization::{
    EMPLOYEE_COUNT_OPTIONS, INDUSTRIES, MIN_REPORT_RESPONDENTS, ORGANIZATION_TYPES,
    SECTOR_TYPES, SIGNUP_COUNTRIES, UNION_STATUS,
};
use crate::catalog::{
    question_bank, DemographicInput, DemographicQuestion, DEMOGRAPHIC_QUESTIONS,
};
use crate::catalog::demographics::RECOMMENDED_MIN_RESPONDENTS;
use crate::dashboard::DashboardEntry;
use crate::identity::UserInfo;
use crate::response::ResponseSession;
use crate::rest::extract::Lang;
use crate::survey::{
    Department, PublishedSurvey, Question, ScaleLabel, SurveyDraft, SurveyType,
};
use crate::wizard::{
    PublishOutcome, SignupDraft, SignupStep, SignupWizard, SurveyStep, SurveyWizard, WizardStep,
};

// =============================================================================
// Health DTOs
// =============================================================================

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Service status with backend info
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub store: String,
    pub identity: String,
    pub published_surveys: usize,
    pub open_drafts: usize,
    pub open_signups: usize,
}

// =============================================================================
// Wizard DTOs
// =============================================================================

/// One entry of a wizard's step indicator
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StepInfo {
    pub step: String,
    /// Localized label
    pub title: String,
    pub current: bool,
    /// Whether the step can be jumped to
    pub visited: bool,
}

fn step_infos<S: WizardStep>(current: S, visited: &[S], lang: &Lang) -> Vec<StepInfo> {
    S::ORDER
        .iter()
        .map(|step| StepInfo {
            step: step.name().to_string(),
            title: lang.t(step.title_key()),
            current: *step == current,
            visited: visited.contains(step),
        })
        .collect()
}

/// Signup wizard state
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupView {
    pub id: Uuid,
    pub current_step: SignupStep,
    pub steps: Vec<StepInfo>,
    pub submitting: bool,
    pub draft: SignupDraft,
    /// Localized notice, set once the account is created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SignupView {
    pub fn new(id: Uuid, wizard: &SignupWizard, lang: &Lang) -> Self {
        let current = wizard.current_step();
        let message = current
            .is_terminal()
            .then(|| lang.t("notifications.accountCreated"));
        Self {
            id,
            current_step: current,
            steps: step_infos(current, &wizard.visited(), lang),
            submitting: wizard.is_submitting(),
            draft: wizard.draft().clone(),
            message,
        }
    }
}

/// Survey creation wizard state
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub id: Uuid,
    pub current_step: SurveyStep,
    pub steps: Vec<StepInfo>,
    pub draft: SurveyDraft,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_id: Option<String>,
}

impl DraftView {
    pub fn new(id: Uuid, wizard: &SurveyWizard, lang: &Lang) -> Self {
        let current = wizard.current_step();
        Self {
            id,
            current_step: current,
            steps: step_infos(current, &wizard.visited(), lang),
            draft: wizard.draft().clone(),
            published_id: wizard.published().map(|p| p.id.clone()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SurveyJumpRequest {
    pub step: SurveyStep,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignupJumpRequest {
    pub step: SignupStep,
}

/// Move the question at `from` to `to`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReorderRequest {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReorderResponse {
    /// False when either index was out of range
    pub moved: bool,
    pub questions: Vec<Question>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ToggleRequest {
    pub id: String,
}

/// Demographic selection after a toggle
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SelectionResponse {
    pub selected: BTreeSet<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentRequest {
    pub name: String,
    #[serde(default)]
    pub size: u32,
    /// Add as a sub-department of this department
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DepartmentsResponse {
    /// Id of the department that was created, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub departments: Vec<Department>,
}

/// Result of publishing a draft
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub id: String,
    pub link: String,
    /// False when the draft had already been published
    pub created: bool,
    pub created_at: DateTime<Utc>,
    pub message: String,
}

impl PublishResponse {
    pub fn new(outcome: PublishOutcome, lang: &Lang) -> Self {
        Self {
            id: outcome.survey.id,
            link: outcome.link,
            created: outcome.created,
            created_at: outcome.survey.created_at,
            message: lang.t("notifications.surveyActivated"),
        }
    }
}

// =============================================================================
// Account DTOs
// =============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub access_token: String,
    pub user: UserInfo,
    pub message: String,
}

/// Contact details of the signed-in user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub job_title: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserInfo,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub organization: String,
    pub surveys: Vec<DashboardEntry>,
}

// =============================================================================
// Respondent DTOs
// =============================================================================

/// What a respondent sees of a published survey
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyView {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub survey_type: Option<SurveyType>,
    pub organization_name: Option<String>,
    pub end_date: Option<NaiveDate>,
    pub questions: Vec<Question>,
}

impl From<&PublishedSurvey> for SurveyView {
    fn from(published: &PublishedSurvey) -> Self {
        Self {
            id: published.id.clone(),
            name: published.survey.name.clone(),
            survey_type: published.survey.survey_type,
            organization_name: published.survey.organization_name().map(str::to_string),
            end_date: published.survey.end_date,
            questions: published.survey.questions.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub question_id: String,
    /// One of the question's scale labels (e.g. "Souvent")
    pub label: String,
}

/// A respondent's in-progress answers
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSessionView {
    pub id: Uuid,
    pub survey: SurveyView,
    pub answers: BTreeMap<String, ScaleLabel>,
    pub answered: usize,
    pub required: usize,
    pub can_submit: bool,
}

impl From<&ResponseSession> for ResponseSessionView {
    fn from(session: &ResponseSession) -> Self {
        Self {
            id: session.id(),
            survey: SurveyView::from(session.survey()),
            answers: session.answers().clone(),
            answered: session.answered_required(),
            required: session.required_count(),
            can_submit: session.can_submit(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub survey_id: String,
    pub message: String,
}

// =============================================================================
// Catalog DTOs
// =============================================================================

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyTypeInfo {
    #[serde(rename = "type")]
    pub survey_type: SurveyType,
    pub label: String,
    pub description: String,
    pub estimated_time: String,
    pub question_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DemographicView {
    pub id: String,
    pub text: String,
    /// "select" or "radio"
    #[serde(rename = "type")]
    pub input: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&DemographicQuestion> for DemographicView {
    fn from(q: &DemographicQuestion) -> Self {
        Self {
            id: q.id.to_string(),
            text: q.text.to_string(),
            input: match q.input {
                DemographicInput::Select => "select".to_string(),
                DemographicInput::Radio => "radio".to_string(),
            },
            options: q.options.iter().map(|o| o.to_string()).collect(),
            description: q.description.map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CountryOption {
    pub code: String,
    pub name: String,
}

/// Reference data for building survey and signup forms
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub survey_types: Vec<SurveyTypeInfo>,
    pub demographics: Vec<DemographicView>,
    pub employee_counts: Vec<String>,
    pub organization_types: Vec<String>,
    pub sectors: Vec<String>,
    pub union_statuses: Vec<String>,
    pub industries: Vec<String>,
    pub countries: Vec<CountryOption>,
    /// Demographic questions are recommended from this many respondents up
    pub recommended_min_respondents: u32,
    /// Results are reported only from this many responses up
    pub min_report_respondents: u32,
}

fn owned(options: &[&str]) -> Vec<String> {
    options.iter().map(|o| o.to_string()).collect()
}

impl CatalogResponse {
    pub fn build() -> Self {
        Self {
            survey_types: SurveyType::all()
                .iter()
                .map(|t| SurveyTypeInfo {
                    survey_type: *t,
                    label: t.label().to_string(),
                    description: t.description().to_string(),
                    estimated_time: t.estimated_time().to_string(),
                    question_count: question_bank(*t).len(),
                })
                .collect(),
            demographics: DEMOGRAPHIC_QUESTIONS.iter().map(DemographicView::from).collect(),
            employee_counts: owned(EMPLOYEE_COUNT_OPTIONS),
            organization_types: owned(ORGANIZATION_TYPES),
            sectors: owned(SECTOR_TYPES),
            union_statuses: owned(UNION_STATUS),
            industries: owned(INDUSTRIES),
            countries: SIGNUP_COUNTRIES
                .iter()
                .map(|(code, name)| CountryOption {
                    code: code.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            recommended_min_respondents: RECOMMENDED_MIN_RESPONDENTS,
            min_report_respondents: MIN_REPORT_RESPONDENTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locale;
    use crate::rest::state::tests::test_state;

    fn lang(locale: Locale) -> Lang {
        Lang::new(locale, test_state().translator.clone())
    }

    #[test]
    fn test_draft_view_step_indicator() {
        let wizard = SurveyWizard::new();
        let view = DraftView::new(Uuid::new_v4(), &wizard, &lang(Locale::Fr));

        assert_eq!(view.current_step, SurveyStep::Type);
        assert_eq!(view.steps.len(), 5);
        assert!(view.steps[0].current);
        assert!(view.steps[0].visited);
        assert!(!view.steps[1].visited);
        assert_eq!(view.steps[0].step, "type");
        assert!(view.published_id.is_none());
    }

    #[test]
    fn test_signup_view_has_no_message_before_verification() {
        let wizard = SignupWizard::new(None);
        let view = SignupView::new(Uuid::new_v4(), &wizard, &lang(Locale::En));
        assert_eq!(view.current_step, SignupStep::Personal);
        assert_eq!(view.steps.len(), 4);
        assert!(view.message.is_none());
        assert!(!view.submitting);
    }

    #[test]
    fn test_catalog_lists_reference_data() {
        let catalog = CatalogResponse::build();
        assert_eq!(catalog.survey_types.len(), SurveyType::all().len());
        assert_eq!(catalog.demographics.len(), DEMOGRAPHIC_QUESTIONS.len());
        assert_eq!(catalog.countries[0].code, "CA");
        assert!(catalog.employee_counts.contains(&"1000+".to_string()));

        let json = serde_json::to_value(&catalog).unwrap();
        assert!(json["surveyTypes"][0]["type"].is_string());
        assert!(json["demographics"][0]["type"].is_string());
    }
}
