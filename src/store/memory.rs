use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{validate_key, KeyValueStore, StoreError};

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StoreError> {
        validate_key(key)?;
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_overwrite() {
        let store = MemoryStore::new();
        assert_eq!(store.get("survey-a").await.unwrap(), None);

        store.put("survey-a", "1".to_string()).await.unwrap();
        store.put("survey-a", "2".to_string()).await.unwrap();

        assert_eq!(store.get("survey-a").await.unwrap().as_deref(), Some("2"));
        assert_eq!(store.len().await, 1);
        assert!(store.contains("survey-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_keys_by_prefix() {
        let store = MemoryStore::new();
        for key in ["survey-b", "response-x", "survey-a", "surveyor"] {
            store.put(key, "{}".to_string()).await.unwrap();
        }

        let keys = store.list_keys("survey-").await.unwrap();
        assert_eq!(keys, vec!["survey-a", "survey-b"]);
    }

    #[tokio::test]
    async fn test_rejects_invalid_key() {
        let store = MemoryStore::new();
        let err = store.put("a/b", String::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }
}
