use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{validate_key, KeyValueStore, StoreError};

const EXTENSION: &str = "json";

/// Stores each key as `<dir>/<key>.json`
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "file store opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{EXTENSION}"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StoreError> {
        validate_key(key)?;
        let path = self.path_for(key);
        // Write to a sibling temp file first so readers never see a partial record
        let tmp = self.dir.join(format!(".{key}.{EXTENSION}.tmp"));
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with(prefix) && validate_key(stem).is_ok() {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();

        store
            .put("survey-acme-1", r#"{"name":"x"}"#.to_string())
            .await
            .unwrap();

        let value = store.get("survey-acme-1").await.unwrap();
        assert_eq!(value.as_deref(), Some(r#"{"name":"x"}"#));
        assert!(temp_dir.path().join("survey-acme-1.json").exists());
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.get("survey-none").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_keys_ignores_other_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        store.put("survey-b", "{}".to_string()).await.unwrap();
        store.put("survey-a", "{}".to_string()).await.unwrap();
        store.put("response-a-1", "{}".to_string()).await.unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "x").unwrap();

        let keys = store.list_keys("survey-").await.unwrap();
        assert_eq!(keys, vec!["survey-a", "survey-b"]);
    }

    #[tokio::test]
    async fn test_open_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("data").join("surveys");
        let store = FileStore::open(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.dir(), nested.as_path());
    }
}
