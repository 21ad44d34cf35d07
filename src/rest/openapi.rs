//! OpenAPI specification builder using utoipa.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::dashboard::{DashboardEntry, SurveyStatus};
use crate::rest::dto::{
    AnswerRequest, CatalogResponse, DepartmentRequest, DepartmentsResponse, DraftView,
    HealthResponse, ProfileRequest, ProfileResponse, PublishResponse, ReorderRequest,
    ReorderResponse, ResponseSessionView, SelectionResponse, SignInRequest, SignInResponse,
    SignupJumpRequest, SignupView, StatusResponse, StepInfo, SubmitResponse, SurveyJumpRequest,
    SurveyView, ToggleRequest,
};
use crate::rest::error::{ErrorResponse, FieldMessage};
use crate::survey::{Department, DepartmentPatch, OrganizationRef, Question, SurveyDraft};
use crate::wizard::{SignupStepInput, SurveyStepInput};

/// Registers the bearer token scheme used by authenticated routes
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// OpenAPI documentation for the surveyor REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Surveyor API",
        version = "0.1.0",
        description = "REST API for creating workplace psychological health surveys, publishing them and collecting anonymous responses.",
        license(name = "MIT")
    ),
    modifiers(&BearerAuth),
    paths(
        // Health endpoints
        crate::rest::routes::health::health,
        crate::rest::routes::health::status,
        // Reference data
        crate::rest::routes::catalog::catalog,
        crate::rest::routes::catalog::translations,
        // Signup wizard
        crate::rest::routes::signup::start,
        crate::rest::routes::signup::get_one,
        crate::rest::routes::signup::advance,
        crate::rest::routes::signup::retreat,
        crate::rest::routes::signup::jump,
        // Account
        crate::rest::routes::auth::sign_in,
        crate::rest::routes::auth::sign_out,
        crate::rest::routes::auth::me,
        crate::rest::routes::auth::update_profile,
        crate::rest::routes::organization::get_one,
        crate::rest::routes::organization::update,
        crate::rest::routes::dashboard::list,
        // Survey creation wizard
        crate::rest::routes::drafts::create,
        crate::rest::routes::drafts::get_one,
        crate::rest::routes::drafts::discard,
        crate::rest::routes::drafts::summary,
        crate::rest::routes::drafts::advance,
        crate::rest::routes::drafts::retreat,
        crate::rest::routes::drafts::jump,
        crate::rest::routes::drafts::reorder,
        crate::rest::routes::drafts::toggle_demographic,
        crate::rest::routes::drafts::toggle_all_demographics,
        crate::rest::routes::drafts::add_department,
        crate::rest::routes::drafts::update_department,
        crate::rest::routes::drafts::remove_department,
        crate::rest::routes::drafts::publish,
        // Respondents
        crate::rest::routes::responses::get_survey,
        crate::rest::routes::responses::start,
        crate::rest::routes::responses::get_one,
        crate::rest::routes::responses::answer,
        crate::rest::routes::responses::submit,
    ),
    components(
        schemas(
            // Response types
            HealthResponse,
            StatusResponse,
            CatalogResponse,
            StepInfo,
            SignupView,
            DraftView,
            PublishResponse,
            ReorderResponse,
            SelectionResponse,
            DepartmentsResponse,
            SignInResponse,
            ProfileResponse,
            DashboardEntry,
            SurveyStatus,
            SurveyView,
            ResponseSessionView,
            SubmitResponse,
            ErrorResponse,
            FieldMessage,
            // Domain types
            SurveyDraft,
            OrganizationRef,
            Department,
            Question,
            // Request types
            SignupStepInput,
            SurveyStepInput,
            SignupJumpRequest,
            SurveyJumpRequest,
            SignInRequest,
            ProfileRequest,
            ReorderRequest,
            ToggleRequest,
            DepartmentRequest,
            DepartmentPatch,
            AnswerRequest,
        )
    ),
    tags(
        (name = "Health", description = "Health check and status endpoints"),
        (name = "Catalog", description = "Form reference data and translations"),
        (name = "Signup", description = "Account signup wizard"),
        (name = "Account", description = "Sign-in, profile and organization"),
        (name = "Dashboard", description = "Published surveys of the user's organization"),
        (name = "Drafts", description = "Survey creation wizard and publication"),
        (name = "Responses", description = "Anonymous survey responses"),
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI specification as a JSON string
    pub fn json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }

    /// Generate the OpenAPI specification as a YAML string
    pub fn yaml() -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&Self::openapi())
    }
}
