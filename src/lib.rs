//! A single-node, proof-of-work sealed ledger with a simple wallet layer.
//!
//! - [`blockchain`]: block hashing, sealing, appending and validation
//! - [`ledger`]: accounts, top-ups and atomic transfers
//! - [`storage`]: the persistence port and its SQLite implementation
//! - [`api`]: actix-web REST adapter

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod ledger;
pub mod storage;
pub mod transaction;
pub mod wallet;

pub use blockchain::{Block, Blockchain, MiningControl};
pub use config::Config;
pub use error::{ChainError, Result};
pub use ledger::{Account, Ledger};
pub use storage::{SqliteStorage, Storage};
pub use transaction::TransferRecord;

use std::sync::Arc;

/// Open the store named by `database_path` (`:memory:` for in-memory).
pub fn open_storage(database_path: &str) -> Result<Arc<dyn Storage>> {
    let store = if database_path == ":memory:" {
        SqliteStorage::open_in_memory()?
    } else {
        SqliteStorage::open(database_path)?
    };
    Ok(Arc::new(store))
}
