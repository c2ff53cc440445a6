//! Durable storage for the monitor configuration
//!
//! ## Design
//!
//! - **Trait-based**: [`ConfigStore`] is the only interface the core sees
//! - **Write-through**: the whole [`StoredState`] is saved after every change
//! - **Small**: one configuration record plus the address → name mapping
//!
//! ## Backends
//!
//! - **SQLite** (default): embedded database file
//! - **In-Memory**: no persistence, for tests or throwaway runs

pub mod backend;
pub mod error;
pub mod memory;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::{ConfigStore, StoredEndpoint, StoredState};
pub use error::{StorageError, StorageResult};
