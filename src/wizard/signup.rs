//! Account signup wizard: `Personal → Organization → Account → Verification`
//!
//! Advancing from `Account` creates the account through the identity
//! backend. That call is split in two halves so no lock is held while it
//! runs: [`SignupWizard::begin_account_submission`] hands out a ticket bound
//! to the current navigation token, and
//! [`SignupWizard::complete_account_submission`] applies the result only if
//! the wizard has not moved in the meantime.

use std::time::Duration;

use tokio::sync::Mutex;

use super::types::{
    AccountInput, PersonalInput, SignupDraft, SignupOrganizationInput, SignupStep,
    SignupStepInput, StepTracker, WizardStep,
};
use super::WizardError;
use crate::catalog::organization::{
    EMPLOYEE_COUNT_OPTIONS, INDUSTRIES, ORGANIZATION_TYPES, SECTOR_TYPES, SIGNUP_COUNTRIES,
    UNION_STATUS,
};
use crate::identity::{
    with_timeout, IdentityError, IdentityProvider, SignUpRequest, UserInfo, UserMetadata,
};
use crate::validation::{is_valid_email, FieldError, ValidationErrors, MIN_PASSWORD_LEN};

/// Pending account creation, bound to the navigation token at issue time
#[derive(Debug, Clone)]
pub struct AccountTicket {
    token: u64,
    pub request: SignUpRequest,
}

impl AccountTicket {
    pub fn token(&self) -> u64 {
        self.token
    }
}

/// What `SignupWizard::advance` did
#[derive(Debug, Clone)]
pub enum SignupAdvance {
    /// Moved to the given step
    Moved(SignupStep),
    /// Account step validated; the caller must run the ticket's request
    Submit(AccountTicket),
}

#[derive(Debug, Clone, Default)]
pub struct SignupWizard {
    steps: StepTracker<SignupStep>,
    draft: SignupDraft,
    /// Token of the submission in flight, if any
    in_flight: Option<u64>,
    email_redirect_to: Option<String>,
}

impl SignupWizard {
    pub fn new(email_redirect_to: Option<String>) -> Self {
        Self {
            email_redirect_to,
            ..Self::default()
        }
    }

    pub fn current_step(&self) -> SignupStep {
        self.steps.current()
    }

    pub fn visited(&self) -> Vec<SignupStep> {
        self.steps.visited()
    }

    pub fn draft(&self) -> &SignupDraft {
        &self.draft
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Validate `input` for the current step and merge it. `Personal` and
    /// `Organization` move forward immediately; `Account` returns a ticket.
    pub fn advance(&mut self, input: SignupStepInput) -> Result<SignupAdvance, WizardError> {
        if self.in_flight.is_some() {
            return Err(WizardError::SubmissionPending);
        }
        let current = self.steps.current();
        if current.is_terminal() {
            return Err(WizardError::navigation(current.name(), "next"));
        }
        if input.step() != current {
            return Err(ValidationErrors::single("step", "wrong_step").into());
        }

        match input {
            SignupStepInput::Personal(personal) => {
                validate_personal(&personal)?;
                self.draft.personal = Some(personal);
            }
            SignupStepInput::Organization(organization) => {
                validate_organization(&organization)?;
                self.draft.organization = Some(organization);
            }
            SignupStepInput::Account(account) => {
                return self.begin_account_submission(account).map(SignupAdvance::Submit);
            }
        }
        Ok(SignupAdvance::Moved(self.steps.forward()?))
    }

    /// Validate credentials, mark a submission in flight and build the
    /// sign-up request
    pub fn begin_account_submission(
        &mut self,
        account: AccountInput,
    ) -> Result<AccountTicket, WizardError> {
        if self.in_flight.is_some() {
            return Err(WizardError::SubmissionPending);
        }
        let current = self.steps.current();
        if current != SignupStep::Account {
            return Err(WizardError::wrong_step(SignupStep::Account, current));
        }
        validate_account(&account)?;

        let metadata = UserMetadata {
            first_name: self.draft.personal.as_ref().map(|p| p.first_name.clone()),
            last_name: self.draft.personal.as_ref().map(|p| p.last_name.clone()),
            job_title: self.draft.personal.as_ref().map(|p| p.job_title.clone()),
            organization_name: self
                .draft
                .organization
                .as_ref()
                .map(|o| o.organization.trim().to_string()),
        };
        let request = SignUpRequest {
            email: account.email.trim().to_string(),
            password: account.password.clone(),
            metadata,
            email_redirect_to: self.email_redirect_to.clone(),
        };
        self.draft.account = Some(account);

        let token = self.steps.token();
        self.in_flight = Some(token);
        Ok(AccountTicket { token, request })
    }

    /// Apply the identity backend's answer for `ticket`.
    ///
    /// Success moves to `Verification`. Failure keeps the step and the draft.
    /// A ticket issued before the latest navigation is discarded.
    pub fn complete_account_submission(
        &mut self,
        ticket: &AccountTicket,
        result: Result<UserInfo, IdentityError>,
    ) -> Result<SignupStep, WizardError> {
        if self.in_flight != Some(ticket.token) || self.steps.token() != ticket.token {
            tracing::debug!(token = ticket.token, "dropping stale signup completion");
            return Err(WizardError::StaleCompletion(ticket.token));
        }
        self.in_flight = None;

        match result {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "account created");
                self.draft.user = Some(user);
                Ok(self.steps.forward()?)
            }
            Err(e) => {
                tracing::warn!(error = %e, "account creation failed");
                Err(WizardError::Remote(e))
            }
        }
    }

    /// Clear the in-flight flag for a submission whose result will never
    /// be applied
    pub fn abandon_submission(&mut self, token: u64) {
        if self.in_flight == Some(token) {
            tracing::debug!(token, "abandoning signup submission");
            self.in_flight = None;
        }
    }

    /// Previous step. Abandons any submission in flight.
    pub fn retreat(&mut self) -> Result<SignupStep, WizardError> {
        if self.steps.current().is_terminal() {
            return Err(WizardError::navigation(self.steps.current().name(), "previous"));
        }
        let step = self.steps.back()?;
        self.in_flight = None;
        Ok(step)
    }

    pub fn jump_to(&mut self, step: SignupStep) -> Result<SignupStep, WizardError> {
        if self.steps.current().is_terminal() {
            return Err(WizardError::navigation(self.steps.current().name(), step.name()));
        }
        let step = self.steps.jump_to(step)?;
        self.in_flight = None;
        Ok(step)
    }
}

/// Releases the in-flight flag when `advance_signup` is dropped before the
/// backend answers
struct InFlightGuard<'a> {
    wizard: &'a Mutex<SignupWizard>,
    token: Option<u64>,
}

impl<'a> InFlightGuard<'a> {
    fn new(wizard: &'a Mutex<SignupWizard>, token: u64) -> Self {
        Self {
            wizard,
            token: Some(token),
        }
    }

    fn disarm(mut self) {
        self.token = None;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let Some(token) = self.token else {
            return;
        };
        match self.wizard.try_lock() {
            Ok(mut wizard) => wizard.abandon_submission(token),
            Err(_) => tracing::warn!(token, "wizard busy, signup submission left pending"),
        }
    }
}

/// Run one `advance` against a shared wizard, performing the account
/// creation call without holding the lock.
pub async fn advance_signup(
    wizard: &Mutex<SignupWizard>,
    identity: &dyn IdentityProvider,
    limit: Duration,
    input: SignupStepInput,
) -> Result<SignupStep, WizardError> {
    let ticket = match wizard.lock().await.advance(input)? {
        SignupAdvance::Moved(step) => return Ok(step),
        SignupAdvance::Submit(ticket) => ticket,
    };

    let guard = InFlightGuard::new(wizard, ticket.token());
    let result = with_timeout(
        identity.name(),
        limit,
        identity.sign_up(ticket.request.clone()),
    )
    .await;

    let mut wizard = wizard.lock().await;
    guard.disarm();
    wizard.complete_account_submission(&ticket, result)
}

fn validate_personal(input: &PersonalInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.require("firstName", &input.first_name);
    errors.require("lastName", &input.last_name);
    errors.require("jobTitle", &input.job_title);
    errors.require("phone", &input.phone);
    errors.require("address", &input.address);
    errors.require("city", &input.city);
    errors.require("postalCode", &input.postal_code);

    let countries: Vec<&str> = SIGNUP_COUNTRIES.iter().map(|(code, _)| *code).collect();
    errors.require_option("country", &input.country, &countries);
    errors.into_result()
}

fn validate_organization(input: &SignupOrganizationInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.require("organization", &input.organization);
    errors.require_option("employeeCount", &input.employee_count, EMPLOYEE_COUNT_OPTIONS);
    errors.require_option(
        "surveyEmployeeCount",
        &input.survey_employee_count,
        EMPLOYEE_COUNT_OPTIONS,
    );
    errors.require_option(
        "organizationType",
        &input.organization_type,
        ORGANIZATION_TYPES,
    );
    errors.require_option("sector", &input.sector, SECTOR_TYPES);
    errors.require_option("unionStatus", &input.union_status, UNION_STATUS);
    errors.require_option("industry", &input.industry, INDUSTRIES);
    errors.into_result()
}

fn validate_account(input: &AccountInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if !is_valid_email(&input.email) {
        errors.add("email", "invalid_email");
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(
            FieldError::new("password", "password_too_short").with_param("min", MIN_PASSWORD_LEN),
        );
    }
    if input.password != input.confirm_password {
        errors.add("confirmPassword", "password_mismatch");
    }
    if !input.terms_accepted {
        errors.add("termsAccepted", "terms_required");
    }
    errors.into_result()
}
