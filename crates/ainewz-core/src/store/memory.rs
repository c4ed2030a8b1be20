use async_trait::async_trait;
use tokio::sync::RwLock;

use super::PayloadStore;
use crate::feed::Payload;
use crate::Result;

/// In-process payload slot, mainly for tests and single-process serving
#[derive(Default)]
pub struct MemoryPayloadStore {
    slot: RwLock<Option<Payload>>,
}

impl MemoryPayloadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PayloadStore for MemoryPayloadStore {
    async fn load_latest(&self) -> Result<Option<Payload>> {
        Ok(self.slot.read().await.clone())
    }

    async fn store_latest(&self, payload: &Payload) -> Result<()> {
        *self.slot.write().await = Some(payload.clone());
        Ok(())
    }
}
