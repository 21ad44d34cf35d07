//! Survey creation wizard: `Type → Organization → Demographics → Builder → Review`

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::types::{
    BuilderInput, DemographicsInput, StepTracker, SurveyStep, SurveyStepInput, TypeInput,
    WizardStep,
};
use super::WizardError;
use crate::catalog::{all_demographic_ids, demographic, question_bank, DEPARTMENT_QUESTION_ID};
use crate::organization::validate_organization;
use crate::store::KeyValueStore;
use crate::survey::departments::{self, DepartmentPatch};
use crate::survey::{
    publish_draft, reorder, survey_link, OrganizationRef, PublishedSurvey, SurveyDraft,
};
use crate::validation::{FieldError, ValidationErrors};

/// Result of `SurveyWizard::publish`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub survey: PublishedSurvey,
    pub link: String,
    /// False when the survey had already been published by this wizard
    pub created: bool,
}

/// Survey creation state machine. The draft is the only state carried
/// between steps.
#[derive(Debug, Clone, Default)]
pub struct SurveyWizard {
    steps: StepTracker<SurveyStep>,
    draft: SurveyDraft,
    published: Option<PublishedSurvey>,
}

impl SurveyWizard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the organization step pre-filled from a saved profile
    pub fn with_organization(organization: OrganizationRef) -> Self {
        let mut wizard = Self::new();
        wizard.draft.organization = Some(organization);
        wizard
    }

    pub fn current_step(&self) -> SurveyStep {
        self.steps.current()
    }

    pub fn visited(&self) -> Vec<SurveyStep> {
        self.steps.visited()
    }

    pub fn draft(&self) -> &SurveyDraft {
        &self.draft
    }

    pub fn published(&self) -> Option<&PublishedSurvey> {
        self.published.as_ref()
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        match &self.published {
            Some(published) => Err(WizardError::AlreadyPublished(published.id.clone())),
            None => Ok(()),
        }
    }

    fn ensure_step(&self, expected: SurveyStep) -> Result<(), WizardError> {
        let current = self.steps.current();
        if current == expected {
            Ok(())
        } else {
            Err(WizardError::wrong_step(expected, current))
        }
    }

    /// Validate `input` for the current step, merge it and move forward
    pub fn advance(&mut self, input: SurveyStepInput) -> Result<SurveyStep, WizardError> {
        self.advance_on(input, Utc::now().date_naive())
    }

    /// `advance` with an explicit current date for end-date checks
    pub fn advance_on(
        &mut self,
        input: SurveyStepInput,
        today: NaiveDate,
    ) -> Result<SurveyStep, WizardError> {
        self.ensure_editable()?;
        let current = self.steps.current();
        if current.is_terminal() {
            return Err(WizardError::navigation(current.name(), "next"));
        }
        if input.step() != current {
            return Err(ValidationErrors::single("step", "wrong_step").into());
        }

        match input {
            SurveyStepInput::Type(input) => self.apply_type(input, today)?,
            SurveyStepInput::Organization(input) => self.apply_organization(input)?,
            SurveyStepInput::Demographics(input) => self.apply_demographics(input)?,
            SurveyStepInput::Builder(input) => self.apply_builder(input)?,
        }

        let next = self.steps.forward()?;
        tracing::debug!(step = next.name(), "survey wizard advanced");
        Ok(next)
    }

    fn apply_type(&mut self, input: TypeInput, today: NaiveDate) -> Result<(), WizardError> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &input.name);
        if input.survey_type.is_none() {
            errors.add("type", "required");
        }
        if input.end_date.is_some_and(|end| end < today) {
            errors.add("endDate", "end_date_in_past");
        }
        errors.into_result()?;

        let type_changed = input.survey_type != self.draft.survey_type;
        self.draft.name = input.name.trim().to_string();
        self.draft.survey_type = input.survey_type;
        // An omitted end date keeps the one already set
        if input.end_date.is_some() {
            self.draft.end_date = input.end_date;
        }

        if let Some(survey_type) = self.draft.survey_type {
            if self.draft.questions.is_empty() || type_changed {
                self.draft.questions = question_bank(survey_type);
            }
        }
        Ok(())
    }

    fn apply_organization(&mut self, input: OrganizationRef) -> Result<(), WizardError> {
        validate_organization(&input)?;

        let mut organization = input;
        organization.name = organization.name.trim().to_string();
        // Departments edited in place survive a form submit that omits them
        if organization.departments.is_empty() {
            if let Some(existing) = &self.draft.organization {
                organization.departments = existing.departments.clone();
            }
        }
        self.draft.organization = Some(organization);
        Ok(())
    }

    fn has_departments(&self) -> bool {
        self.draft
            .organization
            .as_ref()
            .is_some_and(|o| !o.departments.is_empty())
    }

    fn validate_selection(&self, selection: &BTreeSet<String>) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for id in selection {
            if demographic(id).is_none() {
                errors.push(
                    FieldError::new("selectedDemographics", "unknown_demographic")
                        .with_param("id", id),
                );
            }
        }
        if selection.contains(DEPARTMENT_QUESTION_ID) && !self.has_departments() {
            errors.add(
                "selectedDemographics",
                "department_question_requires_departments",
            );
        }
        errors.into_result()
    }

    fn apply_demographics(&mut self, input: DemographicsInput) -> Result<(), WizardError> {
        let selection = input
            .selected
            .unwrap_or_else(|| self.draft.selected_demographics.clone());
        self.validate_selection(&selection)?;
        self.draft.selected_demographics = selection;
        Ok(())
    }

    fn apply_builder(&mut self, input: BuilderInput) -> Result<(), WizardError> {
        if self.draft.questions.is_empty() {
            return Err(ValidationErrors::single("questions", "required").into());
        }
        let Some(order) = input.order else {
            return Ok(());
        };

        let mut current: Vec<&str> = self.draft.questions.iter().map(|q| q.id.as_str()).collect();
        let mut requested: Vec<&str> = order.iter().map(String::as_str).collect();
        current.sort_unstable();
        requested.sort_unstable();
        if current != requested {
            return Err(ValidationErrors::single("order", "invalid_order").into());
        }

        let mut remaining = std::mem::take(&mut self.draft.questions);
        for id in &order {
            if let Some(pos) = remaining.iter().position(|q| &q.id == id) {
                self.draft.questions.push(remaining.swap_remove(pos));
            }
        }
        Ok(())
    }

    /// Previous step, without validation. The draft is left untouched.
    pub fn retreat(&mut self) -> Result<SurveyStep, WizardError> {
        self.ensure_editable()?;
        self.steps.back()
    }

    /// Go to an already visited step
    pub fn jump_to(&mut self, step: SurveyStep) -> Result<SurveyStep, WizardError> {
        self.ensure_editable()?;
        self.steps.jump_to(step)
    }

    /// Add or remove one demographic question from the selection. Returns
    /// whether it is now selected.
    pub fn toggle_demographic(&mut self, id: &str) -> Result<bool, WizardError> {
        self.ensure_editable()?;
        self.ensure_step(SurveyStep::Demographics)?;
        if demographic(id).is_none() {
            return Err(ValidationErrors::single("selectedDemographics", "unknown_demographic").into());
        }

        if self.draft.selected_demographics.remove(id) {
            Ok(false)
        } else {
            self.draft.selected_demographics.insert(id.to_string());
            Ok(true)
        }
    }

    /// Select every demographic question, or clear the selection when all
    /// are already selected
    pub fn toggle_all_demographics(&mut self) -> Result<&BTreeSet<String>, WizardError> {
        self.ensure_editable()?;
        self.ensure_step(SurveyStep::Demographics)?;

        let all_selected =
            all_demographic_ids().all(|id| self.draft.selected_demographics.contains(id));
        if all_selected {
            self.draft.selected_demographics.clear();
        } else {
            self.draft.selected_demographics = all_demographic_ids().map(String::from).collect();
        }
        Ok(&self.draft.selected_demographics)
    }

    /// Move a question. Returns false, leaving the order as is, when either
    /// index is out of range.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<bool, WizardError> {
        self.ensure_editable()?;
        self.ensure_step(SurveyStep::Builder)?;
        Ok(reorder(&mut self.draft.questions, from, to))
    }

    fn departments_mut(&mut self) -> Result<&mut Vec<crate::survey::Department>, WizardError> {
        self.ensure_editable()?;
        self.ensure_step(SurveyStep::Organization)?;
        Ok(&mut self
            .draft
            .organization
            .get_or_insert_with(OrganizationRef::default)
            .departments)
    }

    fn require_department_name(name: &str) -> Result<(), WizardError> {
        let mut errors = ValidationErrors::new();
        errors.require("name", name);
        Ok(errors.into_result()?)
    }

    pub fn add_department(&mut self, name: &str, size: u32) -> Result<String, WizardError> {
        Self::require_department_name(name)?;
        let tree = self.departments_mut()?;
        Ok(departments::add_department(tree, name.trim(), size))
    }

    /// Returns `None` when the parent does not exist
    pub fn add_sub_department(
        &mut self,
        parent_id: &str,
        name: &str,
        size: u32,
    ) -> Result<Option<String>, WizardError> {
        Self::require_department_name(name)?;
        let tree = self.departments_mut()?;
        Ok(departments::add_sub_department(tree, parent_id, name.trim(), size))
    }

    pub fn update_department(
        &mut self,
        id: &str,
        patch: DepartmentPatch,
    ) -> Result<bool, WizardError> {
        if let Some(name) = &patch.name {
            Self::require_department_name(name)?;
        }
        let tree = self.departments_mut()?;
        Ok(departments::update_department(tree, id, patch))
    }

    /// Removing the last department also drops the department demographic
    /// question from the selection.
    pub fn remove_department(&mut self, id: &str) -> Result<bool, WizardError> {
        let tree = self.departments_mut()?;
        let removed = departments::remove_department(tree, id);
        if removed && tree.is_empty() {
            self.draft.selected_demographics.remove(DEPARTMENT_QUESTION_ID);
        }
        Ok(removed)
    }

    /// Persist the draft and return its public link.
    ///
    /// Only allowed at `Review`. Calling again after success returns the same
    /// survey without writing anything.
    pub async fn publish(
        &mut self,
        store: &dyn KeyValueStore,
        origin: &str,
        at: DateTime<Utc>,
    ) -> Result<PublishOutcome, WizardError> {
        if let Some(survey) = &self.published {
            return Ok(PublishOutcome {
                link: survey_link(origin, &survey.id),
                survey: survey.clone(),
                created: false,
            });
        }
        self.ensure_step(SurveyStep::Review)?;

        let survey = publish_draft(store, &self.draft, at).await?;
        let link = survey_link(origin, &survey.id);
        self.published = Some(survey.clone());
        Ok(PublishOutcome {
            survey,
            link,
            created: true,
        })
    }
}
