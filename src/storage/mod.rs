//! Persistence port consumed by the chain and the ledger.

pub mod sqlite;

pub use sqlite::SqliteStorage;

use crate::blockchain::Block;
use crate::error::Result;
use crate::ledger::Account;
use crate::transaction::TransferRecord;

/// Largest balance or amount a store can hold (SQLite INTEGER is signed).
pub const MAX_STORED_AMOUNT: u64 = i64::MAX as u64;

/// Durable storage for blocks, accounts and transfer records.
/// Implementations must make a successful write durable and apply
/// `transfer_atomically` as a single all-or-nothing unit.
pub trait Storage: Send + Sync {
    /// Persist a sealed block and return its storage row id. Must reject a
    /// second block with an already-used sequence index.
    fn save_block(&self, block: &Block) -> Result<i64>;
    fn get_block_by_index(&self, index: u64) -> Result<Option<Block>>;
    /// Block with the highest sequence index.
    fn get_latest_block(&self) -> Result<Option<Block>>;
    /// All blocks, ascending sequence index.
    fn get_all_blocks(&self) -> Result<Vec<Block>>;

    fn save_account(&self, account: &Account) -> Result<()>;
    fn account_exists(&self, address: &str) -> Result<bool>;
    fn get_balance(&self, address: &str) -> Result<u64>;
    /// Atomic increment; returns the new balance. A result above
    /// `MAX_STORED_AMOUNT` is `BalanceOverflow` and leaves the balance as is.
    fn credit_balance(&self, address: &str, amount: u64) -> Result<u64>;
    /// Debit `from`, credit `to` and append `record` in one transaction,
    /// checking both balances against the persisted values inside it.
    fn transfer_atomically(&self, record: &TransferRecord) -> Result<TransferRecord>;
    fn count_accounts(&self) -> Result<u64>;

    fn save_transfer_record(&self, record: &TransferRecord) -> Result<i64>;
    fn get_transfer_records_by_block_id(&self, block_id: i64) -> Result<Vec<TransferRecord>>;
    /// Records where `address` is either party, newest first.
    fn get_transfer_records_by_address(&self, address: &str) -> Result<Vec<TransferRecord>>;
    /// Newest first.
    fn get_transfer_records_page(&self, limit: u32, offset: u64) -> Result<Vec<TransferRecord>>;
    fn count_transfer_records(&self) -> Result<u64>;
}
