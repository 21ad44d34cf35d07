//! Pluggable key-value persistence for published surveys, responses and
//! organization profiles.
//!
//! Values are JSON text. Backends only need `put`, `get` and prefix listing,
//! so a network-backed store can replace the local ones without touching the
//! wizard or publication code.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::config::{StorageBackend, StorageConfig};

/// Key prefix for published survey snapshots
pub const SURVEY_KEY_PREFIX: &str = "survey-";
/// Key prefix for submitted response sets
pub const RESPONSE_KEY_PREFIX: &str = "response-";
/// Key prefix for saved organization profiles
pub const ORGANIZATION_KEY_PREFIX: &str = "organization-";

/// Errors raised by storage backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Minimal key-value interface used by the service
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Backend name for logs (e.g. "memory", "file")
    fn name(&self) -> &str;

    /// Insert or overwrite `key`
    async fn put(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Fetch the value for `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Keys starting with `prefix`, sorted
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    async fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Storage key for a published survey id
pub fn survey_key(id: &str) -> String {
    format!("{SURVEY_KEY_PREFIX}{id}")
}

/// Keys are restricted to characters that are safe as file names and URL
/// path segments.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Build the configured backend
pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageBackend::File => Ok(Arc::new(FileStore::open(config.path.clone())?)),
    }
}
