use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::Result;

/// Process-wide credential record consumed by every service-calling
/// component. Absence of a key is a checked pipeline precondition, not an
/// error inside any stage.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get(&self) -> Result<Option<String>>;
    async fn set(&self, api_key: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialRecord {
    api_key: Option<String>,
}

/// JSON-file-backed credential store under the platform config directory.
pub struct FsCredentialStore {
    path: PathBuf,
}

impl FsCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("vidbrief")
            .join("credentials.json")
    }

    async fn load(&self) -> Result<CredentialRecord> {
        if !self.path.exists() {
            return Ok(CredentialRecord::default());
        }
        let raw = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn save(&self, record: &CredentialRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(record)?).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialProvider for FsCredentialStore {
    async fn get(&self) -> Result<Option<String>> {
        let record = self.load().await?;
        Ok(record.api_key.filter(|k| !k.is_empty()))
    }

    async fn set(&self, api_key: &str) -> Result<()> {
        self.save(&CredentialRecord {
            api_key: Some(api_key.to_string()),
        })
        .await
    }

    async fn clear(&self) -> Result<()> {
        self.save(&CredentialRecord::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsCredentialStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCredentialStore::new(dir.path().join("credentials.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn missing_file_reads_as_unconfigured() {
        let (_guard, store) = store();
        assert_eq!(store.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_get_clear() {
        let (_guard, store) = store();
        store.set("sk-test-123").await.unwrap();
        assert_eq!(store.get().await.unwrap().as_deref(), Some("sk-test-123"));

        store.clear().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_key_counts_as_unconfigured() {
        let (_guard, store) = store();
        store.set("").await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);
    }
}
