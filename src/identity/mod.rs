//! Identity backend abstraction.
//!
//! The service never authenticates users itself. Account creation, password
//! sign-in and profile updates go through an [`IdentityProvider`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

mod error;
mod http;
mod memory;

pub use error::IdentityError;
pub use http::HttpIdentityProvider;
pub use memory::InMemoryIdentity;

use crate::config::{IdentityConfig, IdentityProviderKind};

/// Profile attributes stored alongside the account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
}

impl UserMetadata {
    /// Overlay the fields set in `other`
    pub fn merge(&mut self, other: UserMetadata) {
        if other.first_name.is_some() {
            self.first_name = other.first_name;
        }
        if other.last_name.is_some() {
            self.last_name = other.last_name;
        }
        if other.job_title.is_some() {
            self.job_title = other.job_title;
        }
        if other.organization_name.is_some() {
            self.organization_name = other.organization_name;
        }
    }
}

/// An account as reported by the identity backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    #[serde(default, alias = "user_metadata")]
    pub metadata: UserMetadata,
}

/// Account creation request
#[derive(Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub metadata: UserMetadata,
    /// Absolute URL the confirmation email links back to
    pub email_redirect_to: Option<String>,
}

impl std::fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("metadata", &self.metadata)
            .field("email_redirect_to", &self.email_redirect_to)
            .finish()
    }
}

/// Result of a successful sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: UserInfo,
}

/// Attributes accepted by `update_user`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub metadata: UserMetadata,
}

/// Hosted identity capability consumed by the signup wizard and the
/// authenticated routes
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider name for logs (e.g. "gotrue", "memory")
    fn name(&self) -> &str;

    /// Create an account. The backend may require email confirmation before
    /// the account can sign in.
    async fn sign_up(&self, request: SignUpRequest) -> Result<UserInfo, IdentityError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError>;

    async fn update_user(
        &self,
        access_token: &str,
        update: UserUpdate,
    ) -> Result<UserInfo, IdentityError>;
}

/// Run a remote call with an upper time bound
pub async fn with_timeout<T, F>(
    provider: &str,
    limit: Duration,
    call: F,
) -> Result<T, IdentityError>
where
    F: Future<Output = Result<T, IdentityError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(provider, timeout_secs = limit.as_secs(), "identity call timed out");
            Err(IdentityError::timeout(provider, limit.as_secs()))
        }
    }
}

/// Build the configured provider
pub fn from_config(config: &IdentityConfig) -> Result<Arc<dyn IdentityProvider>, IdentityError> {
    match config.provider {
        IdentityProviderKind::Memory => {
            tracing::warn!("using in-memory identity provider; accounts are not persisted");
            Ok(Arc::new(InMemoryIdentity::new()))
        }
        IdentityProviderKind::Http => Ok(Arc::new(HttpIdentityProvider::from_config(config)?)),
    }
}
