//! Published surveys belonging to the signed-in user's organization.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::response::count_responses;
use crate::store::{KeyValueStore, StoreError, SURVEY_KEY_PREFIX};
use crate::survey::{load_published, survey_link, SurveyType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SurveyStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub survey_type: Option<SurveyType>,
    pub created_at: DateTime<Utc>,
    pub end_date: Option<NaiveDate>,
    pub status: SurveyStatus,
    pub response_count: usize,
    pub link: String,
}

fn same_organization(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Surveys published for `organization_name`, newest first
pub async fn list_surveys(
    store: &dyn KeyValueStore,
    organization_name: &str,
    origin: &str,
    today: NaiveDate,
) -> Result<Vec<DashboardEntry>, StoreError> {
    let mut entries = Vec::new();
    for key in store.list_keys(SURVEY_KEY_PREFIX).await? {
        let Some(id) = key.strip_prefix(SURVEY_KEY_PREFIX) else {
            continue;
        };
        let Some(published) = load_published(store, id).await? else {
            continue;
        };
        let matches = published
            .survey
            .organization_name()
            .is_some_and(|name| same_organization(name, organization_name));
        if !matches {
            continue;
        }

        entries.push(DashboardEntry {
            status: if published.is_open(today) {
                SurveyStatus::Open
            } else {
                SurveyStatus::Closed
            },
            response_count: count_responses(store, &published.id).await?,
            link: survey_link(origin, &published.id),
            name: published.survey.name,
            survey_type: published.survey.survey_type,
            end_date: published.survey.end_date,
            created_at: published.created_at,
            id: published.id,
        });
    }
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::survey::{publish_draft, OrganizationRef, SurveyDraft};
    use chrono::TimeZone;

    fn draft(org: &str, name: &str, end: Option<NaiveDate>) -> SurveyDraft {
        SurveyDraft {
            name: name.to_string(),
            survey_type: Some(SurveyType::Quick),
            end_date: end,
            organization: Some(OrganizationRef {
                name: org.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_lists_own_surveys_newest_first() {
        let store = MemoryStore::new();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();

        publish_draft(&store, &draft("MIRS Inc", "Hiver", NaiveDate::from_ymd_opt(2024, 2, 1)), t0)
            .await
            .unwrap();
        publish_draft(&store, &draft("MIRS Inc", "Printemps", None), t1)
            .await
            .unwrap();
        publish_draft(&store, &draft("Other Co", "Autre", None), t1)
            .await
            .unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let entries = list_surveys(&store, "mirs inc", "https://x.test", today)
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Printemps");
        assert_eq!(entries[0].status, SurveyStatus::Open);
        assert_eq!(entries[1].name, "Hiver");
        assert_eq!(entries[1].status, SurveyStatus::Closed);
        assert_eq!(
            entries[0].link,
            format!("https://x.test/survey/{}", entries[0].id)
        );
        assert_eq!(entries[0].response_count, 0);
    }

    #[tokio::test]
    async fn test_skips_unreadable_records() {
        let store = MemoryStore::new();
        store
            .put("survey-mirs-inc-1", "garbage".to_string())
            .await
            .unwrap();
        let entries = list_surveys(&store, "MIRS Inc", "https://x.test", Utc::now().date_naive())
            .await
            .unwrap();
        assert!(entries.is_empty());
    }
}
