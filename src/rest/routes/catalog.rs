//! Reference data and translation tables.

use axum::{extract::Path, extract::State, Json};
use serde_json::Value;

use crate::i18n::Locale;
use crate::rest::dto::CatalogResponse;
use crate::rest::error::ApiError;
use crate::rest::state::ApiState;

/// Survey types, demographic questions and organization form options
#[utoipa::path(
    get,
    path = "/api/v1/catalog",
    tag = "Catalog",
    responses(
        (status = 200, description = "Form reference data", body = CatalogResponse)
    )
)]
pub async fn catalog() -> Json<CatalogResponse> {
    Json(CatalogResponse::build())
}

/// Whole translation table for a locale
#[utoipa::path(
    get,
    path = "/api/v1/i18n/{locale}",
    tag = "Catalog",
    params(
        ("locale" = String, Path, description = "Locale code (en, fr)")
    ),
    responses(
        (status = 200, description = "Translation table", body = serde_json::Value),
        (status = 404, description = "Unsupported locale")
    )
)]
pub async fn translations(
    State(state): State<ApiState>,
    Path(locale): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Locale::from_tag(&locale)
        .and_then(|l| state.translator.table(l))
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Locale '{}' not supported", locale)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::state::tests::test_state;

    #[tokio::test]
    async fn test_translations_by_locale() {
        let state = test_state();
        let table = translations(State(state.clone()), Path("fr-CA".to_string()))
            .await
            .unwrap();
        assert!(table["wizard"]["survey"]["type"].is_string());

        let err = translations(State(state), Path("de".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
