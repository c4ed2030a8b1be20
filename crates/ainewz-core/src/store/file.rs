use std::path::PathBuf;

use async_trait::async_trait;

use super::PayloadStore;
use crate::feed::Payload;
use crate::Result;

/// Payload slot persisted as a JSON file in the data directory, so a cached
/// payload survives process restarts. Writes replace the file wholesale.
pub struct FilePayloadStore {
    path: PathBuf,
}

impl FilePayloadStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl PayloadStore for FilePayloadStore {
    async fn load_latest(&self) -> Result<Option<Payload>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let payload = serde_json::from_str(&content)?;
        Ok(Some(payload))
    }

    async fn store_latest(&self, payload: &Payload) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string(payload)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}
