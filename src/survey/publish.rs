//! Public survey id derivation and snapshot persistence.
//!
//! An id is `slugify(organization name) + "-" + unix millis`. There is no
//! collision retry: two publications for the same organization name within
//! the same millisecond derive the same id, and the second one is rejected
//! with [`PublishError::Collision`] instead of overwriting the first.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::types::{PublishedSurvey, SurveyDraft};
use crate::store::{survey_key, KeyValueStore, StoreError};

static SURVEY_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9._~-]*[a-z0-9]+[a-z0-9._~-]*-([0-9]{1,18})$").expect("valid regex")
});

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("survey has no organization name")]
    MissingOrganization,

    #[error("organization name '{0}' has no URL-safe characters")]
    EmptySlug(String),

    #[error("survey id '{0}' is already taken")]
    Collision(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to serialize survey: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Lowercase, collapse each whitespace run into one hyphen, and drop
/// characters outside the RFC 3986 unreserved set.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        for lower in c.to_lowercase() {
            if lower.is_ascii_alphanumeric() || matches!(lower, '-' | '_' | '.' | '~') {
                slug.push(lower);
            }
        }
    }
    slug
}

/// Derive the public id for an organization at a given instant
pub fn derive_survey_id(organization_name: &str, at: DateTime<Utc>) -> Result<String, PublishError> {
    if organization_name.trim().is_empty() {
        return Err(PublishError::MissingOrganization);
    }
    let slug = slugify(organization_name);
    if !slug.chars().any(|c| c.is_ascii_alphanumeric()) {
        return Err(PublishError::EmptySlug(organization_name.to_string()));
    }
    Ok(format!("{}-{}", slug, at.timestamp_millis()))
}

/// Public link for a survey id under `origin`
pub fn survey_link(origin: &str, id: &str) -> String {
    format!("{}/survey/{}", origin.trim_end_matches('/'), id)
}

/// Whether `id` has the shape produced by [`derive_survey_id`]
pub fn is_well_formed_id(id: &str) -> bool {
    SURVEY_ID_RE.is_match(id)
}

/// Recover the publication instant encoded in an id
pub fn created_at_from_id(id: &str) -> Option<DateTime<Utc>> {
    let millis: i64 = SURVEY_ID_RE.captures(id)?.get(1)?.as_str().parse().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

/// Persist a draft snapshot under a freshly derived id.
///
/// The stored value is the JSON draft itself; id and creation time are
/// carried by the key.
pub async fn publish_draft(
    store: &dyn KeyValueStore,
    draft: &SurveyDraft,
    at: DateTime<Utc>,
) -> Result<PublishedSurvey, PublishError> {
    let org_name = draft
        .organization_name()
        .ok_or(PublishError::MissingOrganization)?;
    let id = derive_survey_id(org_name, at)?;
    let key = survey_key(&id);

    if store.contains(&key).await? {
        tracing::warn!(survey_id = %id, "survey id collision");
        return Err(PublishError::Collision(id));
    }

    store.put(&key, serde_json::to_string(draft)?).await?;
    tracing::info!(survey_id = %id, store = store.name(), "survey published");

    Ok(PublishedSurvey {
        id,
        survey: draft.clone(),
        // Round to what the id can represent
        created_at: Utc
            .timestamp_millis_opt(at.timestamp_millis())
            .single()
            .unwrap_or(at),
    })
}

/// Read a published snapshot back. `Ok(None)` when the id is malformed or
/// not stored.
pub async fn load_published(
    store: &dyn KeyValueStore,
    id: &str,
) -> Result<Option<PublishedSurvey>, StoreError> {
    let Some(created_at) = created_at_from_id(id) else {
        return Ok(None);
    };
    let Some(raw) = store.get(&survey_key(id)).await? else {
        return Ok(None);
    };
    match serde_json::from_str::<SurveyDraft>(&raw) {
        Ok(survey) => Ok(Some(PublishedSurvey {
            id: id.to_string(),
            survey,
            created_at,
        })),
        Err(e) => {
            tracing::warn!(survey_id = %id, error = %e, "stored survey does not parse");
            Ok(None)
        }
    }
}
