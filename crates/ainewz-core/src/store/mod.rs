mod file;
mod memory;

pub use file::FilePayloadStore;
pub use memory::MemoryPayloadStore;

use async_trait::async_trait;

use crate::feed::Payload;
use crate::Result;

/// A single named slot holding the most recent payload.
///
/// Consistency contract: last write wins, no coordination. Concurrent
/// writers are tolerated because every pipeline run is idempotent and
/// produces an equivalent payload.
#[async_trait]
pub trait PayloadStore: Send + Sync {
    /// Read the latest payload, or None if the slot has never been written
    async fn load_latest(&self) -> Result<Option<Payload>>;

    /// Replace the slot contents wholesale
    async fn store_latest(&self, payload: &Payload) -> Result<()>;
}
