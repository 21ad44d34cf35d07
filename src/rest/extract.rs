//! Request extractors: caller locale and signed-in user.
//!
//! [`Lang`] also turns domain errors into localized [`ApiError`]s so every
//! handler reports failures the same way.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{ACCEPT_LANGUAGE, AUTHORIZATION};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::i18n::{Locale, Translator};
use crate::identity::{AuthSession, IdentityError, UserInfo};
use crate::organization::ProfileError;
use crate::response::ResponseError;
use crate::rest::error::{ApiError, FieldMessage};
use crate::rest::state::ApiState;
use crate::survey::PublishError;
use crate::validation::ValidationErrors;
use crate::wizard::WizardError;

/// Caller's display locale, from `Accept-Language` or the configured default
#[derive(Clone)]
pub struct Lang {
    pub locale: Locale,
    translator: Arc<Translator>,
}

impl Lang {
    pub fn new(locale: Locale, translator: Arc<Translator>) -> Self {
        Self { locale, translator }
    }

    fn from_headers(headers: &HeaderMap, state: &ApiState) -> Self {
        let locale = headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .and_then(Locale::from_accept_language)
            .unwrap_or(state.config.locale.default);
        Self::new(locale, state.translator.clone())
    }

    pub fn t(&self, key: &str) -> String {
        self.translator.t(self.locale, key)
    }

    pub fn t_with(&self, key: &str, params: &HashMap<&str, String>) -> String {
        self.translator.t_with(self.locale, key, params)
    }

    pub fn validation(&self, errors: &ValidationErrors) -> ApiError {
        let fields: Vec<FieldMessage> = errors
            .iter()
            .map(|e| FieldMessage {
                field: e.field.clone(),
                code: e.code.clone(),
                message: e.message(&self.translator, self.locale),
            })
            .collect();
        let message = fields
            .iter()
            .map(|f| f.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        ApiError::Validation { message, fields }
    }

    pub fn identity(&self, err: IdentityError) -> ApiError {
        tracing::warn!(provider = err.provider_name(), error = %err, "identity call failed");
        match err {
            IdentityError::Unauthorized { .. } => {
                ApiError::Unauthorized(self.t("errors.invalidCredentials"))
            }
            IdentityError::Rejected { message, .. } => {
                ApiError::BadRequest(self.t_with("errors.remote", &HashMap::from([("message", message)])))
            }
            other => ApiError::Remote(
                self.t_with("errors.remote", &HashMap::from([("message", other.to_string())])),
            ),
        }
    }

    pub fn wizard(&self, err: WizardError) -> ApiError {
        match err {
            WizardError::Validation(errors) => self.validation(&errors),
            WizardError::Remote(e) => self.identity(e),
            e @ (WizardError::InvalidNavigation { .. } | WizardError::WrongStep { .. }) => {
                tracing::debug!(error = %e, "rejected wizard navigation");
                ApiError::BadRequest(self.t("errors.navigation"))
            }
            WizardError::SubmissionPending => ApiError::Conflict(self.t("errors.pending")),
            WizardError::StaleCompletion(_) => ApiError::Conflict(self.t("errors.stale")),
            WizardError::AlreadyPublished(_) => {
                ApiError::Conflict(self.t("errors.alreadyPublished"))
            }
            WizardError::Publish(PublishError::Collision(id)) => {
                tracing::warn!(survey_id = %id, "survey id collision");
                ApiError::Conflict(self.t("errors.conflict"))
            }
            WizardError::Publish(e) => self.internal(&e),
        }
    }

    pub fn response(&self, err: ResponseError) -> ApiError {
        match err {
            ResponseError::NotFound(_) => ApiError::NotFound(self.t("errors.notFound")),
            ResponseError::Validation(errors) => self.validation(&errors),
            ResponseError::IncompleteSubmission { answered, required } => {
                ApiError::Incomplete(self.t_with(
                    "errors.incomplete",
                    &HashMap::from([
                        ("answered", answered.to_string()),
                        ("required", required.to_string()),
                    ]),
                ))
            }
            ResponseError::AlreadySubmitted => {
                ApiError::Conflict(self.t("errors.alreadySubmitted"))
            }
            e @ (ResponseError::Store(_) | ResponseError::Serialize(_)) => self.internal(&e),
        }
    }

    pub fn profile(&self, err: ProfileError) -> ApiError {
        match err {
            ProfileError::Validation(errors) => self.validation(&errors),
            e => self.internal(&e),
        }
    }

    pub fn unauthorized(&self) -> ApiError {
        ApiError::Unauthorized(self.t("errors.unauthorized"))
    }

    fn internal(&self, err: &dyn std::error::Error) -> ApiError {
        tracing::error!(error = %err, "request failed");
        ApiError::InternalError(self.t("errors.internal"))
    }
}

#[async_trait]
impl FromRequestParts<ApiState> for Lang {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers, state))
    }
}

/// Signed-in caller, resolved from `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub access_token: String,
    pub user: UserInfo,
}

impl From<AuthSession> for AuthUser {
    fn from(session: AuthSession) -> Self {
        Self {
            access_token: session.access_token,
            user: session.user,
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<ApiState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        let lang = Lang::from_headers(&parts.headers, state);
        let token = bearer_token(&parts.headers).ok_or_else(|| lang.unauthorized())?;
        let session = state
            .sessions
            .auth
            .get(&token.to_string())
            .await
            .ok_or_else(|| lang.unauthorized())?;
        Ok(session.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::state::tests::test_state;
    use axum::http::HeaderValue;

    #[test]
    fn test_lang_from_accept_language() {
        let state = test_state();
        let mut headers = HeaderMap::new();
        assert_eq!(Lang::from_headers(&headers, &state).locale, Locale::En);

        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("fr-CA,fr;q=0.9,en;q=0.5"));
        assert_eq!(Lang::from_headers(&headers, &state).locale, Locale::Fr);
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_incomplete_submission_message_is_localized() {
        let state = test_state();
        let lang = Lang::new(Locale::En, state.translator.clone());
        let err = lang.response(ResponseError::IncompleteSubmission {
            answered: 5,
            required: 6,
        });
        match err {
            ApiError::Incomplete(msg) => assert!(msg.contains("(5/6)")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_validation_messages_per_field() {
        let state = test_state();
        let lang = Lang::new(Locale::En, state.translator.clone());
        let mut errors = ValidationErrors::new();
        errors.add("email", "invalid_email");
        errors.add("firstName", "required");

        match lang.validation(&errors) {
            ApiError::Validation { message, fields } => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].message, "The email address is invalid");
                assert_eq!(fields[1].message, "firstName is required");
                assert!(message.contains("; "));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_wizard_collision_is_conflict() {
        let state = test_state();
        let lang = Lang::new(Locale::En, state.translator.clone());
        let err = lang.wizard(WizardError::Publish(PublishError::Collision("a-1".into())));
        assert!(matches!(err, ApiError::Conflict(_)));
        let err = lang.identity(IdentityError::unauthorized("memory"));
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
