//! Saved organization profiles.
//!
//! A signed-in user keeps one profile under `organization-<user id>`. New
//! survey wizards start from it, and the dashboard uses its name to find the
//! user's surveys.

use std::collections::HashSet;

use thiserror::Error;

use crate::catalog::organization::{
    EMPLOYEE_COUNT_OPTIONS, INDUSTRIES, ORGANIZATION_TYPES, SECTOR_TYPES, UNION_STATUS,
};
use crate::store::{KeyValueStore, StoreError, ORGANIZATION_KEY_PREFIX};
use crate::survey::departments::walk;
use crate::survey::OrganizationRef;
use crate::validation::{FieldError, ValidationErrors};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode organization profile: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Check the profile fields against the catalog option lists. Field names
/// are reported under `organization.`.
pub fn validate_organization(org: &OrganizationRef) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.require("organization.name", &org.name);
    errors.require_option(
        "organization.employeeCount",
        &org.employee_count,
        EMPLOYEE_COUNT_OPTIONS,
    );
    errors.require_option(
        "organization.surveyEmployeeCount",
        &org.survey_employee_count,
        EMPLOYEE_COUNT_OPTIONS,
    );
    errors.require_option(
        "organization.type",
        &org.organization_type,
        ORGANIZATION_TYPES,
    );
    errors.require_option("organization.sector", &org.sector, SECTOR_TYPES);
    errors.require_option("organization.unionStatus", &org.union_status, UNION_STATUS);
    errors.require_option("organization.industry", &org.industry, INDUSTRIES);
    validate_departments(org, &mut errors);
    errors.into_result()
}

/// Every node in a submitted tree needs a name and an id not used elsewhere
/// in the tree, since edits address nodes by id.
fn validate_departments(org: &OrganizationRef, errors: &mut ValidationErrors) {
    let mut seen = HashSet::new();
    walk(&org.departments, &mut |dept| {
        if dept.name.trim().is_empty() {
            errors.add("organization.departments", "required");
        }
        if dept.id.trim().is_empty() || !seen.insert(dept.id.clone()) {
            errors.push(
                FieldError::new("organization.departments", "duplicate_department")
                    .with_param("id", &dept.id),
            );
        }
    });
}

fn profile_key(user_id: &str) -> String {
    format!("{ORGANIZATION_KEY_PREFIX}{user_id}")
}

/// Validate and store the profile for `user_id`
pub async fn save_profile(
    store: &dyn KeyValueStore,
    user_id: &str,
    org: &OrganizationRef,
) -> Result<(), ProfileError> {
    validate_organization(org).map_err(ProfileError::Validation)?;
    store
        .put(&profile_key(user_id), serde_json::to_string(org)?)
        .await?;
    tracing::info!(%user_id, "organization profile saved");
    Ok(())
}

/// Saved profile for `user_id`. A stored value that no longer parses is
/// treated as absent.
pub async fn load_profile(
    store: &dyn KeyValueStore,
    user_id: &str,
) -> Result<Option<OrganizationRef>, StoreError> {
    let Some(raw) = store.get(&profile_key(user_id)).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(org) => Ok(Some(org)),
        Err(e) => {
            tracing::warn!(%user_id, error = %e, "stored organization profile does not parse");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::survey::Department;

    fn profile() -> OrganizationRef {
        OrganizationRef {
            name: "MIRS Inc".to_string(),
            employee_count: "1000+".to_string(),
            survey_employee_count: "500-999".to_string(),
            organization_type: "Sans but lucratif".to_string(),
            sector: "Secteur public".to_string(),
            union_status: "Un mélange des deux".to_string(),
            industry: "Services publics".to_string(),
            departments: Vec::new(),
        }
    }

    #[test]
    fn test_validate_organization() {
        assert!(validate_organization(&profile()).is_ok());

        let errors = validate_organization(&OrganizationRef::default()).unwrap_err();
        assert_eq!(errors.len(), 7);

        let mut bad = profile();
        bad.employee_count = "12".to_string();
        let errors = validate_organization(&bad).unwrap_err();
        assert!(errors.has("organization.employeeCount"));
        assert_eq!(errors.iter().next().unwrap().code, "invalid_option");
    }

    #[test]
    fn test_department_tree_needs_names_and_distinct_ids() {
        let mut org = profile();
        let mut parent = Department::new("Ventes", 10);
        parent.id = "d".to_string();
        parent.sub_departments.push(Department {
            id: "d".to_string(),
            name: "Est".to_string(),
            size: 4,
            sub_departments: Vec::new(),
        });
        let mut unnamed = Department::new("  ", 2);
        unnamed.id = "d".to_string();
        org.departments = vec![unnamed, parent];

        let errors = validate_organization(&org).unwrap_err();
        let codes: Vec<&str> = errors.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["required", "duplicate_department", "duplicate_department"]);
        assert!(errors.iter().all(|e| e.field == "organization.departments"));

        org.departments = vec![Department::new("Ventes", 10), Department::new("RH", 3)];
        assert!(validate_organization(&org).is_ok());
    }

    #[tokio::test]
    async fn test_profile_with_duplicate_department_ids_not_saved() {
        let store = MemoryStore::new();
        let mut org = profile();
        let dept = Department::new("RH", 3);
        org.departments = vec![dept.clone(), dept];
        assert!(matches!(
            save_profile(&store, "u1", &org).await,
            Err(ProfileError::Validation(_))
        ));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_save_and_load_profile() {
        let store = MemoryStore::new();
        assert!(load_profile(&store, "u1").await.unwrap().is_none());

        save_profile(&store, "u1", &profile()).await.unwrap();
        assert_eq!(load_profile(&store, "u1").await.unwrap(), Some(profile()));
        assert!(store.get("organization-u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_invalid_profile_not_saved() {
        let store = MemoryStore::new();
        let err = save_profile(&store, "u1", &OrganizationRef::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::Validation(_)));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_unparsable_profile_is_absent() {
        let store = MemoryStore::new();
        store.put("organization-u1", "{".to_string()).await.unwrap();
        assert!(load_profile(&store, "u1").await.unwrap().is_none());
    }
}
