//! In-memory storage backend (no persistence)
//!
//! Used when storage is configured as `none` and throughout the tests.
//! State survives only as long as the process.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::backend::{ConfigStore, StoredState};
use super::error::StorageResult;

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<StoredState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already stored state
    pub fn with_state(state: StoredState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }

    /// The last saved state, if any
    pub async fn stored(&self) -> Option<StoredState> {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn load(&self) -> StorageResult<StoredState> {
        Ok(self.state.lock().await.clone().unwrap_or_default())
    }

    async fn save(&self, state: &StoredState) -> StorageResult<()> {
        debug!(
            "in-memory backend: storing {} endpoints",
            state.endpoints.len()
        );
        *self.state.lock().await = Some(state.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory (no persistence)".to_string()
    }
}
