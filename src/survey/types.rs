//! Core survey data model: drafts, questions, organizations and published snapshots.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The two survey formats offered by the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SurveyType {
    /// In-depth assessment (full question bank)
    Comprehensive,
    /// Short pulse check
    Quick,
}

impl SurveyType {
    pub fn all() -> &'static [SurveyType] {
        &[SurveyType::Comprehensive, SurveyType::Quick]
    }

    pub fn label(&self) -> &'static str {
        match self {
            SurveyType::Comprehensive => "Comprehensive Assessment",
            SurveyType::Quick => "Quick Pulse Check",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SurveyType::Comprehensive => {
                "In-depth psychological health evaluation with detailed insights"
            }
            SurveyType::Quick => "Brief assessment for rapid psychological health monitoring",
        }
    }

    /// Advertised completion time shown on the type selector
    pub fn estimated_time(&self) -> &'static str {
        match self {
            SurveyType::Comprehensive => "15-20 minutes",
            SurveyType::Quick => "2-3 minutes",
        }
    }
}

/// Fixed 5-point frequency scale used by every scale question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum ScaleLabel {
    Toujours,
    Souvent,
    Parfois,
    Rarement,
    Jamais,
}

impl ScaleLabel {
    /// All labels in presentation order
    pub const ALL: [ScaleLabel; 5] = [
        ScaleLabel::Toujours,
        ScaleLabel::Souvent,
        ScaleLabel::Parfois,
        ScaleLabel::Rarement,
        ScaleLabel::Jamais,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleLabel::Toujours => "Toujours",
            ScaleLabel::Souvent => "Souvent",
            ScaleLabel::Parfois => "Parfois",
            ScaleLabel::Rarement => "Rarement",
            ScaleLabel::Jamais => "Jamais",
        }
    }

    /// Parse a label exactly as displayed
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.as_str() == label)
    }
}

impl std::fmt::Display for ScaleLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of survey item. Only scale questions exist today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    #[default]
    Scale,
}

/// A single survey item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Question {
    /// Unique within a survey
    pub id: String,
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
    pub options: Vec<ScaleLabel>,
    #[serde(default)]
    pub required: bool,
}

impl Question {
    /// Build a required scale question offering the full label set
    pub fn scale(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind: QuestionKind::Scale,
            options: ScaleLabel::ALL.to_vec(),
            required: true,
        }
    }

    pub fn accepts(&self, label: ScaleLabel) -> bool {
        self.options.contains(&label)
    }
}

/// A department node. Departments form a tree through `sub_departments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: String,
    pub name: String,
    /// Headcount
    #[serde(default)]
    pub size: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schema(no_recursion)]
    pub sub_departments: Vec<Department>,
}

/// Organization the survey is administered to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganizationRef {
    pub name: String,
    /// Total headcount bucket (e.g. "100-499")
    pub employee_count: String,
    /// Headcount bucket the survey will be sent to
    pub survey_employee_count: String,
    #[serde(rename = "type")]
    pub organization_type: String,
    pub sector: String,
    pub union_status: String,
    pub industry: String,
    pub departments: Vec<Department>,
}

/// In-progress survey configuration accumulated by the creation wizard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub survey_type: Option<SurveyType>,
    pub end_date: Option<NaiveDate>,
    pub organization: Option<OrganizationRef>,
    #[serde(rename = "selectedDemographics", default)]
    pub selected_demographics: BTreeSet<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl SurveyDraft {
    /// Questions a respondent must answer before submitting
    pub fn required_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| q.required)
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn organization_name(&self) -> Option<&str> {
        self.organization.as_ref().map(|o| o.name.as_str())
    }
}

/// Immutable, publicly addressable snapshot of a draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishedSurvey {
    pub id: String,
    pub survey: SurveyDraft,
    pub created_at: DateTime<Utc>,
}

impl PublishedSurvey {
    /// Whether respondents may still answer on `today`
    pub fn is_open(&self, today: NaiveDate) -> bool {
        self.survey.end_date.is_none_or(|end| today <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_label_roundtrip_strings() {
        for label in ScaleLabel::ALL {
            assert_eq!(ScaleLabel::parse(label.as_str()), Some(label));
        }
        assert_eq!(ScaleLabel::parse("toujours"), None);
    }

    #[test]
    fn test_draft_serializes_with_client_field_names() {
        let draft = SurveyDraft {
            name: "Q2".to_string(),
            survey_type: Some(SurveyType::Quick),
            ..Default::default()
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["type"], "quick");
        assert!(json.get("selectedDemographics").is_some());
        assert!(json.get("endDate").is_some());
    }

    #[test]
    fn test_question_serializes_type_field() {
        let q = Question::scale("q1", "Text");
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["type"], "scale");
        assert_eq!(json["options"][0], "Toujours");
        assert_eq!(json["required"], true);
    }

    #[test]
    fn test_published_survey_open_until_end_date() {
        let published = PublishedSurvey {
            id: "acme-1".to_string(),
            survey: SurveyDraft {
                end_date: NaiveDate::from_ymd_opt(2024, 6, 30),
                ..Default::default()
            },
            created_at: Utc::now(),
        };
        assert!(published.is_open(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()));
        assert!(!published.is_open(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));
    }
}
