//! Public read path for published surveys and anonymous respondent sessions.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::store::{KeyValueStore, StoreError, RESPONSE_KEY_PREFIX};
use crate::survey::{load_published, PublishedSurvey, ScaleLabel};
use crate::validation::{FieldError, ValidationErrors};

#[derive(Debug, Error)]
pub enum ResponseError {
    /// Unknown, malformed, unreadable or expired survey id
    #[error("survey '{0}' not found")]
    NotFound(String),

    #[error("invalid answer: {0}")]
    Validation(ValidationErrors),

    #[error("{answered} of {required} required questions answered")]
    IncompleteSubmission { answered: usize, required: usize },

    #[error("responses were already submitted")]
    AlreadySubmitted,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode response: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Fetch a survey that respondents can currently answer
pub async fn load_survey(
    store: &dyn KeyValueStore,
    id: &str,
) -> Result<PublishedSurvey, ResponseError> {
    load_survey_on(store, id, Utc::now().date_naive()).await
}

/// `load_survey` with an explicit current date
pub async fn load_survey_on(
    store: &dyn KeyValueStore,
    id: &str,
    today: NaiveDate,
) -> Result<PublishedSurvey, ResponseError> {
    let survey = load_published(store, id)
        .await?
        .ok_or_else(|| ResponseError::NotFound(id.to_string()))?;
    if !survey.is_open(today) {
        tracing::debug!(survey_id = %id, "survey expired");
        return Err(ResponseError::NotFound(id.to_string()));
    }
    Ok(survey)
}

fn responses_prefix(survey_id: &str) -> String {
    format!("{RESPONSE_KEY_PREFIX}{survey_id}-")
}

/// Number of submitted response sets for a survey
pub async fn count_responses(
    store: &dyn KeyValueStore,
    survey_id: &str,
) -> Result<usize, StoreError> {
    let prefix = responses_prefix(survey_id);
    let keys = store.list_keys(&prefix).await?;
    // Another survey id may extend this one (`acme-1` / `acme-1-2`); only a
    // bare response id may follow the prefix
    Ok(keys
        .iter()
        .filter_map(|k| k.strip_prefix(&prefix))
        .filter(|rest| rest.len() == 32 && rest.chars().all(|c| c.is_ascii_hexdigit()))
        .count())
}

/// A completed answer set as persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSet {
    pub survey_id: String,
    /// Question id to chosen label
    pub answers: BTreeMap<String, ScaleLabel>,
    pub submitted_at: DateTime<Utc>,
}

/// One respondent's in-progress answers
#[derive(Debug, Clone)]
pub struct ResponseSession {
    id: Uuid,
    survey: PublishedSurvey,
    answers: BTreeMap<String, ScaleLabel>,
    submitted: bool,
}

impl ResponseSession {
    pub fn new(survey: PublishedSurvey) -> Self {
        Self {
            id: Uuid::new_v4(),
            survey,
            answers: BTreeMap::new(),
            submitted: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn survey(&self) -> &PublishedSurvey {
        &self.survey
    }

    pub fn answers(&self) -> &BTreeMap<String, ScaleLabel> {
        &self.answers
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Set or replace the answer to one question. The label must be one of
    /// the question's options.
    pub fn record_answer(&mut self, question_id: &str, label: &str) -> Result<(), ResponseError> {
        if self.submitted {
            return Err(ResponseError::AlreadySubmitted);
        }
        let Some(question) = self.survey.survey.question(question_id) else {
            return Err(ResponseError::Validation(ValidationErrors::single(
                "questionId",
                "unknown_question",
            )));
        };
        let accepted = ScaleLabel::parse(label).filter(|l| question.accepts(*l));
        let Some(label) = accepted else {
            let mut errors = ValidationErrors::new();
            errors.push(FieldError::new("label", "invalid_answer").with_param("label", label));
            return Err(ResponseError::Validation(errors));
        };
        self.answers.insert(question.id.clone(), label);
        Ok(())
    }

    /// Number of required questions
    pub fn required_count(&self) -> usize {
        self.survey.survey.required_questions().count()
    }

    /// Number of required questions with an answer
    pub fn answered_required(&self) -> usize {
        self.survey
            .survey
            .required_questions()
            .filter(|q| self.answers.contains_key(&q.id))
            .count()
    }

    pub fn can_submit(&self) -> bool {
        !self.submitted && self.answered_required() == self.required_count()
    }

    /// Persist the answers under `response-<survey id>-<response id>` and
    /// close the session. Returns the storage key.
    pub async fn submit(
        &mut self,
        store: &dyn KeyValueStore,
        at: DateTime<Utc>,
    ) -> Result<String, ResponseError> {
        if self.submitted {
            return Err(ResponseError::AlreadySubmitted);
        }
        let (answered, required) = (self.answered_required(), self.required_count());
        if answered < required {
            return Err(ResponseError::IncompleteSubmission { answered, required });
        }
        if !self.survey.is_open(at.date_naive()) {
            return Err(ResponseError::NotFound(self.survey.id.clone()));
        }

        let record = ResponseSet {
            survey_id: self.survey.id.clone(),
            answers: self.answers.clone(),
            submitted_at: at,
        };
        let key = format!(
            "{}{}",
            responses_prefix(&self.survey.id),
            self.id.simple()
        );
        store.put(&key, serde_json::to_string(&record)?).await?;
        self.submitted = true;
        tracing::info!(survey_id = %self.survey.id, response_id = %self.id, "responses submitted");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::question_bank;
    use crate::store::MemoryStore;
    use crate::survey::{publish_draft, OrganizationRef, SurveyDraft, SurveyType};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn quick_draft() -> SurveyDraft {
        SurveyDraft {
            name: "Pulse".to_string(),
            survey_type: Some(SurveyType::Quick),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30),
            organization: Some(OrganizationRef {
                name: "MIRS Inc".to_string(),
                ..Default::default()
            }),
            questions: question_bank(SurveyType::Quick),
            ..Default::default()
        }
    }

    async fn published_quick(store: &MemoryStore) -> PublishedSurvey {
        publish_draft(store, &quick_draft(), at()).await.unwrap()
    }

    #[tokio::test]
    async fn test_load_nonexistent_survey_is_not_found() {
        let store = MemoryStore::new();
        let err = load_survey(&store, "nonexistent-id").await.unwrap_err();
        assert!(matches!(err, ResponseError::NotFound(id) if id == "nonexistent-id"));
    }

    #[tokio::test]
    async fn test_load_expired_survey_is_not_found() {
        let store = MemoryStore::new();
        let survey = published_quick(&store).await;

        let open = load_survey_on(&store, &survey.id, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
            .await
            .unwrap();
        assert_eq!(open.id, survey.id);

        let err = load_survey_on(&store, &survey.id, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ResponseError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_quick_survey_needs_all_six_answers() {
        let store = MemoryStore::new();
        let mut session = ResponseSession::new(published_quick(&store).await);
        assert_eq!(session.required_count(), 6);

        for id in ["q1", "q2", "q3", "q4", "q5"] {
            session.record_answer(id, "Souvent").unwrap();
        }
        assert!(!session.can_submit());
        let err = session.submit(&store, at()).await.unwrap_err();
        assert!(matches!(
            err,
            ResponseError::IncompleteSubmission {
                answered: 5,
                required: 6
            }
        ));

        session.record_answer("q6", "Jamais").unwrap();
        assert!(session.can_submit());
        let key = session.submit(&store, at()).await.unwrap();

        assert!(key.starts_with(&format!("response-{}-", session.survey().id)));
        let stored: ResponseSet =
            serde_json::from_str(&store.get(&key).await.unwrap().unwrap()).unwrap();
        assert_eq!(stored.answers.len(), 6);
        assert_eq!(stored.answers["q6"], ScaleLabel::Jamais);
        assert!(session.is_submitted());
    }

    #[tokio::test]
    async fn test_record_answer_upserts() {
        let store = MemoryStore::new();
        let mut session = ResponseSession::new(published_quick(&store).await);
        session.record_answer("q1", "Toujours").unwrap();
        session.record_answer("q1", "Rarement").unwrap();
        assert_eq!(session.answers().len(), 1);
        assert_eq!(session.answers()["q1"], ScaleLabel::Rarement);
    }

    #[tokio::test]
    async fn test_record_answer_rejects_unknown_question_and_label() {
        let store = MemoryStore::new();
        let mut session = ResponseSession::new(published_quick(&store).await);

        let err = session.record_answer("q99", "Toujours").unwrap_err();
        assert!(matches!(err, ResponseError::Validation(e) if e.has("questionId")));

        let err = session.record_answer("q1", "Sometimes").unwrap_err();
        assert!(matches!(err, ResponseError::Validation(e) if e.has("label")));
        assert!(session.answers().is_empty());
    }

    #[tokio::test]
    async fn test_label_outside_declared_options_rejected() {
        let store = MemoryStore::new();
        let mut draft = quick_draft();
        draft.questions[0].options = vec![ScaleLabel::Toujours, ScaleLabel::Jamais];
        let survey = publish_draft(&store, &draft, at()).await.unwrap();

        let mut session = ResponseSession::new(survey);
        assert!(session.record_answer("q1", "Parfois").is_err());
        assert!(session.record_answer("q1", "Jamais").is_ok());
    }

    #[tokio::test]
    async fn test_submit_twice_rejected() {
        let store = MemoryStore::new();
        let mut session = ResponseSession::new(published_quick(&store).await);
        for id in ["q1", "q2", "q3", "q4", "q5", "q6"] {
            session.record_answer(id, "Parfois").unwrap();
        }
        session.submit(&store, at()).await.unwrap();
        assert!(matches!(
            session.submit(&store, at()).await,
            Err(ResponseError::AlreadySubmitted)
        ));
        assert!(session.record_answer("q1", "Jamais").is_err());
    }

    #[tokio::test]
    async fn test_count_responses_ignores_longer_ids() {
        let store = MemoryStore::new();
        let id = "acme-1";
        store
            .put(&format!("response-{id}-{}", Uuid::new_v4().simple()), "{}".to_string())
            .await
            .unwrap();
        store
            .put(
                &format!("response-{id}-2-{}", Uuid::new_v4().simple()),
                "{}".to_string(),
            )
            .await
            .unwrap();
        assert_eq!(count_responses(&store, id).await.unwrap(), 1);
        assert_eq!(count_responses(&store, "acme-1-2").await.unwrap(), 1);
    }
}
