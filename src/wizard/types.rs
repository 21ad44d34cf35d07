//! Step enums, per-step inputs and the navigation tracker shared by both
//! wizards.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::identity::UserInfo;
use crate::survey::{OrganizationRef, SurveyType};

use super::WizardError;

/// Ordered, linear step sequence
pub trait WizardStep: Copy + Ord + fmt::Debug + 'static {
    /// Steps in presentation order
    const ORDER: &'static [Self];

    /// Wire name (`snake_case`)
    fn name(&self) -> &'static str;

    /// Translation key for the step indicator label
    fn title_key(&self) -> &'static str;

    fn position(&self) -> usize {
        Self::ORDER.iter().position(|s| s == self).unwrap_or(0)
    }

    fn next(&self) -> Option<Self> {
        Self::ORDER.get(self.position() + 1).copied()
    }

    fn previous(&self) -> Option<Self> {
        self.position().checked_sub(1).map(|i| Self::ORDER[i])
    }

    fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

/// Survey creation steps
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SurveyStep {
    /// Name, format and end date
    Type,
    /// Organization profile and departments
    Organization,
    /// Optional respondent-attribute questions
    Demographics,
    /// Question ordering
    Builder,
    /// Summary and publication
    Review,
}

impl WizardStep for SurveyStep {
    const ORDER: &'static [Self] = &[
        SurveyStep::Type,
        SurveyStep::Organization,
        SurveyStep::Demographics,
        SurveyStep::Builder,
        SurveyStep::Review,
    ];

    fn name(&self) -> &'static str {
        match self {
            SurveyStep::Type => "type",
            SurveyStep::Organization => "organization",
            SurveyStep::Demographics => "demographics",
            SurveyStep::Builder => "builder",
            SurveyStep::Review => "review",
        }
    }

    fn title_key(&self) -> &'static str {
        match self {
            SurveyStep::Type => "wizard.survey.type",
            SurveyStep::Organization => "wizard.survey.organization",
            SurveyStep::Demographics => "wizard.survey.demographics",
            SurveyStep::Builder => "wizard.survey.builder",
            SurveyStep::Review => "wizard.survey.review",
        }
    }
}

/// Account signup steps
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SignupStep {
    Personal,
    Organization,
    /// Credentials; advancing creates the account remotely
    Account,
    /// Waiting for email confirmation
    Verification,
}

impl WizardStep for SignupStep {
    const ORDER: &'static [Self] = &[
        SignupStep::Personal,
        SignupStep::Organization,
        SignupStep::Account,
        SignupStep::Verification,
    ];

    fn name(&self) -> &'static str {
        match self {
            SignupStep::Personal => "personal",
            SignupStep::Organization => "organization",
            SignupStep::Account => "account",
            SignupStep::Verification => "verification",
        }
    }

    fn title_key(&self) -> &'static str {
        match self {
            SignupStep::Personal => "wizard.signup.personal",
            SignupStep::Organization => "wizard.signup.organization",
            SignupStep::Account => "wizard.signup.account",
            SignupStep::Verification => "wizard.signup.verification",
        }
    }
}

/// Current step, visited set and navigation token.
///
/// The token changes on every move so that results of remote calls started
/// on an earlier step can be recognized and dropped.
#[derive(Debug, Clone, Serialize)]
pub struct StepTracker<S: WizardStep> {
    current: S,
    visited: BTreeSet<S>,
    token: u64,
}

impl<S: WizardStep + Serialize> StepTracker<S> {
    pub fn new() -> Self {
        let first = S::ORDER[0];
        Self {
            current: first,
            visited: BTreeSet::from([first]),
            token: 0,
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    /// Visited steps in presentation order
    pub fn visited(&self) -> Vec<S> {
        self.visited.iter().copied().collect()
    }

    pub fn is_visited(&self, step: S) -> bool {
        self.visited.contains(&step)
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    fn move_to(&mut self, step: S) {
        self.current = step;
        self.visited.insert(step);
        self.token += 1;
    }

    /// Move exactly one step forward
    pub fn forward(&mut self) -> Result<S, WizardError> {
        let next = self
            .current
            .next()
            .ok_or_else(|| WizardError::navigation(self.current.name(), "next"))?;
        self.move_to(next);
        Ok(next)
    }

    pub fn back(&mut self) -> Result<S, WizardError> {
        let previous = self
            .current
            .previous()
            .ok_or_else(|| WizardError::navigation(self.current.name(), "previous"))?;
        self.move_to(previous);
        Ok(previous)
    }

    /// Jump to a step already reached
    pub fn jump_to(&mut self, step: S) -> Result<S, WizardError> {
        if !self.visited.contains(&step) {
            return Err(WizardError::navigation(self.current.name(), step.name()));
        }
        self.move_to(step);
        Ok(step)
    }
}

impl<S: WizardStep + Serialize> Default for StepTracker<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Input for the `Type` step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypeInput {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub survey_type: Option<SurveyType>,
    /// Omitted keeps the end date already on the draft. Set dates are
    /// replaced, never cleared.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Input for the `Demographics` step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DemographicsInput {
    /// Replaces the current selection when present
    #[serde(default)]
    pub selected: Option<BTreeSet<String>>,
}

/// Input for the `Builder` step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BuilderInput {
    /// Full question order by id; must list every question exactly once
    #[serde(default)]
    pub order: Option<Vec<String>>,
}

/// Payload for `SurveyWizard::advance`, keyed by the step it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SurveyStepInput {
    Type(TypeInput),
    Organization(OrganizationRef),
    Demographics(DemographicsInput),
    Builder(BuilderInput),
}

impl SurveyStepInput {
    pub fn step(&self) -> SurveyStep {
        match self {
            SurveyStepInput::Type(_) => SurveyStep::Type,
            SurveyStepInput::Organization(_) => SurveyStep::Organization,
            SurveyStepInput::Demographics(_) => SurveyStep::Demographics,
            SurveyStepInput::Builder(_) => SurveyStep::Builder,
        }
    }
}

/// Signup `Personal` step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInput {
    pub personal_title: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
    pub department: Option<String>,
    pub phone: String,
    pub address: String,
    pub city: String,
    /// ISO country code (`CA`, `FR`, `BE`)
    pub country: String,
    pub postal_code: String,
}

/// Signup `Organization` step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupOrganizationInput {
    /// Organization name
    pub organization: String,
    pub employee_count: String,
    pub survey_employee_count: String,
    pub organization_type: String,
    pub sector: String,
    pub union_status: String,
    pub industry: String,
}

impl SignupOrganizationInput {
    /// Organization profile seeded from signup answers
    pub fn to_organization(&self) -> OrganizationRef {
        OrganizationRef {
            name: self.organization.trim().to_string(),
            employee_count: self.employee_count.clone(),
            survey_employee_count: self.survey_employee_count.clone(),
            organization_type: self.organization_type.clone(),
            sector: self.sector.clone(),
            union_status: self.union_status.clone(),
            industry: self.industry.clone(),
            departments: Vec::new(),
        }
    }
}

/// Signup `Account` step. Secrets are accepted but never echoed back.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountInput {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub confirm_password: String,
    pub terms_accepted: bool,
}

impl fmt::Debug for AccountInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountInput")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("terms_accepted", &self.terms_accepted)
            .finish()
    }
}

/// Payload for `SignupWizard::advance`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SignupStepInput {
    Personal(PersonalInput),
    Organization(SignupOrganizationInput),
    Account(AccountInput),
}

impl SignupStepInput {
    pub fn step(&self) -> SignupStep {
        match self {
            SignupStepInput::Personal(_) => SignupStep::Personal,
            SignupStepInput::Organization(_) => SignupStep::Organization,
            SignupStepInput::Account(_) => SignupStep::Account,
        }
    }
}

/// Everything entered during signup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupDraft {
    pub personal: Option<PersonalInput>,
    pub organization: Option<SignupOrganizationInput>,
    pub account: Option<AccountInput>,
    /// Account returned by the identity backend once created
    pub user: Option<UserInfo>,
}
