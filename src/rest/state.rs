//! API state management for the REST server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::{Config, SessionsConfig};
use crate::i18n::Translator;
use crate::identity::{AuthSession, IdentityProvider};
use crate::response::ResponseSession;
use crate::rest::error::ApiError;
use crate::rest::sessions::SessionMap;
use crate::store::KeyValueStore;
use crate::wizard::{SignupWizard, SurveyWizard};

/// A survey wizard and the user it belongs to
#[derive(Clone)]
pub struct DraftEntry {
    pub owner: String,
    pub wizard: Arc<Mutex<SurveyWizard>>,
}

/// Per-session wizard and respondent state. Each session has its own lock;
/// the maps are only locked long enough to clone an entry out.
pub struct Sessions {
    pub signups: SessionMap<Uuid, Arc<Mutex<SignupWizard>>>,
    pub drafts: SessionMap<Uuid, DraftEntry>,
    pub responses: SessionMap<Uuid, Arc<Mutex<ResponseSession>>>,
    /// Access token -> signed-in session
    pub auth: SessionMap<String, AuthSession>,
}

impl Sessions {
    pub fn new(config: &SessionsConfig) -> Self {
        let idle = Duration::from_secs(config.idle_minutes * 60);
        let auth_idle = Duration::from_secs(config.auth_idle_minutes * 60);
        let cap = config.max_per_kind;
        Self {
            signups: SessionMap::new(idle, cap),
            drafts: SessionMap::new(idle, cap),
            responses: SessionMap::new(idle, cap),
            auth: SessionMap::new(auth_idle, cap),
        }
    }

    /// Drop idle sessions of every kind. Returns how many went.
    pub async fn sweep(&self) -> usize {
        self.signups.sweep().await
            + self.drafts.sweep().await
            + self.responses.sweep().await
            + self.auth.sweep().await
    }
}

/// Shared state for the REST API
#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    pub store: Arc<dyn KeyValueStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub translator: Arc<Translator>,
    pub sessions: Arc<Sessions>,
}

impl ApiState {
    pub fn new(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        identity: Arc<dyn IdentityProvider>,
        translator: Translator,
    ) -> Self {
        let sessions = Sessions::new(&config.sessions);
        Self {
            config: Arc::new(config),
            store,
            identity,
            translator: Arc::new(translator),
            sessions: Arc::new(sessions),
        }
    }

    /// Build storage and identity backends from config
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        use anyhow::Context;

        let store = crate::store::from_config(&config.storage)
            .context("Failed to open survey storage")?;
        let identity = crate::identity::from_config(&config.identity)
            .context("Failed to configure identity provider")?;
        let translator = Translator::embedded().context("Failed to load locale tables")?;
        tracing::info!(
            store = store.name(),
            identity = identity.name(),
            "API state ready"
        );
        Ok(Self::new(config, store, identity, translator))
    }

    /// Upper bound for identity backend calls
    pub fn identity_timeout(&self) -> Duration {
        Duration::from_secs(self.config.identity.timeout_secs)
    }

    pub async fn signup(&self, id: Uuid) -> Result<Arc<Mutex<SignupWizard>>, ApiError> {
        self.sessions
            .signups
            .get(&id)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("Signup session '{}' not found", id)))
    }

    /// Draft wizard owned by `user_id`. Other users' drafts look absent.
    pub async fn draft(&self, id: Uuid, user_id: &str) -> Result<Arc<Mutex<SurveyWizard>>, ApiError> {
        self.sessions
            .drafts
            .get(&id)
            .await
            .filter(|entry| entry.owner == user_id)
            .map(|entry| entry.wizard.clone())
            .ok_or_else(|| ApiError::NotFound(format!("Survey draft '{}' not found", id)))
    }

    pub async fn response_session(
        &self,
        id: Uuid,
    ) -> Result<Arc<Mutex<ResponseSession>>, ApiError> {
        self.sessions
            .responses
            .get(&id)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("Response session '{}' not found", id)))
    }
}
