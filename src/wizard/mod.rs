//! Step-by-step state machines for survey creation and account signup.
//!
//! Each wizard owns its draft. Step handlers take a typed input for the
//! current step, validate it and merge it into the draft before moving on.

use thiserror::Error;

mod signup;
mod survey;
mod types;


pub use signup::{advance_signup, AccountTicket, SignupAdvance, SignupWizard};
pub use survey::{PublishOutcome, SurveyWizard};
pub use types::{
    AccountInput, BuilderInput, DemographicsInput, PersonalInput, SignupDraft,
    SignupOrganizationInput, SignupStep, SignupStepInput, StepTracker, SurveyStep,
    SurveyStepInput, TypeInput, WizardStep,
};
pub use crate::validation::{FieldError, ValidationErrors};

use crate::identity::IdentityError;
use crate::survey::PublishError;

/// Errors surfaced by wizard operations
#[derive(Debug, Error)]
pub enum WizardError {
    /// Step input failed validation; the wizard did not move
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The identity backend call failed; the draft is kept for retry
    #[error("remote operation failed: {0}")]
    Remote(#[from] IdentityError),

    #[error("cannot move from '{from}' to '{to}'")]
    InvalidNavigation { from: String, to: String },

    #[error("operation requires step '{expected}', wizard is at '{current}'")]
    WrongStep {
        expected: &'static str,
        current: &'static str,
    },

    #[error("a submission is already in progress")]
    SubmissionPending,

    /// A remote result arrived after the wizard moved on
    #[error("stale completion for navigation token {0}")]
    StaleCompletion(u64),

    #[error("survey already published as '{0}'")]
    AlreadyPublished(String),

    #[error(transparent)]
    Publish(PublishError),
}

impl WizardError {
    pub fn navigation(from: &str, to: &str) -> Self {
        WizardError::InvalidNavigation {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn wrong_step<S: WizardStep>(expected: S, current: S) -> Self {
        WizardError::WrongStep {
            expected: expected.name(),
            current: current.name(),
        }
    }

    /// Field errors, when this is a validation failure
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            WizardError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for WizardError {
    fn from(errors: ValidationErrors) -> Self {
        WizardError::Validation(errors)
    }
}

impl From<PublishError> for WizardError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::MissingOrganization => {
                WizardError::Validation(ValidationErrors::single("organization.name", "required"))
            }
            PublishError::EmptySlug(_) => {
                WizardError::Validation(ValidationErrors::single("organization.name", "empty_slug"))
            }
            other => WizardError::Publish(other),
        }
    }
}
