//! Error types shared by the chain, the ledger and the storage layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    /// Storage unavailable or write rejected. Never retried internally.
    #[error("storage error in {op}: {reason}")]
    Persistence { op: &'static str, reason: String },

    #[error("chain is empty: the genesis block must be created first")]
    ChainEmpty,

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("invalid amount {0}: must be > 0")]
    InvalidAmount(u64),

    #[error("insufficient funds in {address}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        address: String,
        balance: u64,
        requested: u64,
    },

    #[error("balance of {address} would exceed {max}")]
    BalanceOverflow { address: String, max: u64 },

    #[error("block #{0} not found")]
    BlockNotFound(u64),

    #[error("difficulty {requested} exceeds maximum of {max}")]
    InvalidDifficulty { requested: u32, max: u32 },

    #[error("mining of block #{index} aborted at nonce {nonce}")]
    MiningAborted { index: u64, nonce: u64 },

    #[error("background worker failed: {0}")]
    Worker(String),
}

impl ChainError {
    pub fn persistence(op: &'static str, err: impl std::fmt::Display) -> Self {
        ChainError::Persistence {
            op,
            reason: err.to_string(),
        }
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
