//! Persistence adapter trait definition
//!
//! The core only ever talks to storage through [`ConfigStore`]. Writes are
//! write-through: every acknowledged command has been handed to `save`
//! before the user sees the reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::StorageResult;
use crate::monitor::MonitorConfiguration;

/// One monitored endpoint as it is stored durably
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEndpoint {
    pub address: String,
    pub name: String,
}

/// The complete durable record: one configuration plus the ordered
/// address → name mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredState {
    pub config: MonitorConfiguration,
    pub endpoints: Vec<StoredEndpoint>,
}

/// Trait for durable configuration storage
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync`; the core calls them from command
/// handlers and the scheduler alike.
///
/// ## Timeouts
///
/// The core does not wrap these calls in deadlines. Backends bound their own
/// I/O (the SQLite backend relies on its busy timeout).
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the stored state, or defaults if nothing has been stored yet
    async fn load(&self) -> StorageResult<StoredState>;

    /// Replace the stored state
    async fn save(&self, state: &StoredState) -> StorageResult<()>;

    /// Short human-readable description for logs
    fn describe(&self) -> String;
}
