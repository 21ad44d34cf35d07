//! Process-local identity provider for development and tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthSession, IdentityError, IdentityProvider, SignUpRequest, UserInfo, UserUpdate};

const PROVIDER_NAME: &str = "memory";

struct Account {
    user: UserInfo,
    salt: String,
    password_hash: String,
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Accounts and sessions kept in memory. Sign-up confirms immediately.
#[derive(Default)]
pub struct InMemoryIdentity {
    /// Keyed by lowercased email
    accounts: RwLock<HashMap<String, Account>>,
    /// Access token -> lowercased email
    sessions: RwLock<HashMap<String, String>>,
    offline: AtomicBool,
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable backend: every call fails with a network error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), IdentityError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(IdentityError::network(PROVIDER_NAME, "connection refused"))
        } else {
            Ok(())
        }
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentity {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn sign_up(&self, request: SignUpRequest) -> Result<UserInfo, IdentityError> {
        self.check_online()?;
        let key = request.email.trim().to_lowercase();

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            return Err(IdentityError::rejected(PROVIDER_NAME, "User already registered"));
        }

        let salt = Uuid::new_v4().simple().to_string();
        let user = UserInfo {
            id: Uuid::new_v4().to_string(),
            email: request.email.trim().to_string(),
            metadata: request.metadata,
        };
        accounts.insert(
            key,
            Account {
                user: user.clone(),
                password_hash: hash_password(&salt, &request.password),
                salt,
            },
        );
        tracing::debug!(user_id = %user.id, "account created");
        Ok(user)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        self.check_online()?;
        let key = email.trim().to_lowercase();

        let user = {
            let accounts = self.accounts.read().await;
            let account = accounts
                .get(&key)
                .filter(|a| a.password_hash == hash_password(&a.salt, password))
                .ok_or_else(|| IdentityError::unauthorized(PROVIDER_NAME))?;
            account.user.clone()
        };

        let access_token = Uuid::new_v4().simple().to_string();
        self.sessions
            .write()
            .await
            .insert(access_token.clone(), key);
        Ok(AuthSession { access_token, user })
    }

    async fn update_user(
        &self,
        access_token: &str,
        update: UserUpdate,
    ) -> Result<UserInfo, IdentityError> {
        self.check_online()?;
        let key = self
            .sessions
            .read()
            .await
            .get(access_token)
            .cloned()
            .ok_or_else(|| IdentityError::unauthorized(PROVIDER_NAME))?;

        let mut accounts = self.accounts.write().await;
        let mut account = accounts
            .remove(&key)
            .ok_or_else(|| IdentityError::unauthorized(PROVIDER_NAME))?;

        let new_key = match update.email {
            Some(email) if email.trim().to_lowercase() != key => {
                let new_key = email.trim().to_lowercase();
                if accounts.contains_key(&new_key) {
                    accounts.insert(key, account);
                    return Err(IdentityError::rejected(
                        PROVIDER_NAME,
                        "Email address already in use",
                    ));
                }
                account.user.email = email.trim().to_string();
                new_key
            }
            _ => key.clone(),
        };
        account.user.metadata.merge(update.metadata);
        let user = account.user.clone();
        accounts.insert(new_key.clone(), account);
        drop(accounts);

        if new_key != key {
            let mut sessions = self.sessions.write().await;
            for owner in sessions.values_mut().filter(|owner| **owner == key) {
                owner.clone_from(&new_key);
            }
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::UserMetadata;

    fn request(email: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.to_string(),
            password: "correct horse".to_string(),
            metadata: UserMetadata {
                first_name: Some("Ada".to_string()),
                organization_name: Some("MIRS Inc".to_string()),
                ..Default::default()
            },
            email_redirect_to: None,
        }
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let identity = InMemoryIdentity::new();
        let user = identity.sign_up(request("ada@mirs.ca")).await.unwrap();

        let session = identity
            .sign_in_with_password("ADA@mirs.ca", "correct horse")
            .await
            .unwrap();
        assert_eq!(session.user, user);
        assert!(!session.access_token.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_rejected() {
        let identity = InMemoryIdentity::new();
        identity.sign_up(request("ada@mirs.ca")).await.unwrap();
        let err = identity.sign_up(request("ada@mirs.ca")).await.unwrap_err();
        assert!(matches!(err, IdentityError::Rejected { .. }));
        assert_eq!(identity.account_count().await, 1);
    }

    #[tokio::test]
    async fn test_wrong_password_unauthorized() {
        let identity = InMemoryIdentity::new();
        identity.sign_up(request("ada@mirs.ca")).await.unwrap();
        let err = identity
            .sign_in_with_password("ada@mirs.ca", "wrong")
            .await
            .unwrap_err();
        assert!(err.is_auth_error());
    }

    #[tokio::test]
    async fn test_update_user_merges_metadata_and_email() {
        let identity = InMemoryIdentity::new();
        identity.sign_up(request("ada@mirs.ca")).await.unwrap();
        let session = identity
            .sign_in_with_password("ada@mirs.ca", "correct horse")
            .await
            .unwrap();

        let updated = identity
            .update_user(
                &session.access_token,
                UserUpdate {
                    email: Some("ada@new.ca".to_string()),
                    metadata: UserMetadata {
                        job_title: Some("Directrice RH".to_string()),
                        ..Default::default()
                    },
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "ada@new.ca");
        assert_eq!(updated.metadata.first_name.as_deref(), Some("Ada"));
        assert_eq!(updated.metadata.job_title.as_deref(), Some("Directrice RH"));

        // Old session follows the account
        let again = identity
            .update_user(&session.access_token, UserUpdate::default())
            .await
            .unwrap();
        assert_eq!(again.email, "ada@new.ca");
        assert!(identity
            .sign_in_with_password("ada@new.ca", "correct horse")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_update_user_unknown_token() {
        let identity = InMemoryIdentity::new();
        let err = identity
            .update_user("nope", UserUpdate::default())
            .await
            .unwrap_err();
        assert!(err.is_auth_error());
    }

    #[tokio::test]
    async fn test_offline_fails_with_network_error() {
        let identity = InMemoryIdentity::new();
        identity.set_offline(true);
        let err = identity.sign_up(request("ada@mirs.ca")).await.unwrap_err();
        assert!(matches!(err, IdentityError::NetworkError { .. }));
        identity.set_offline(false);
        assert!(identity.sign_up(request("ada@mirs.ca")).await.is_ok());
    }
}
