use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blockchain::{Block, Blockchain};
use crate::config::Config;
use crate::ledger::Ledger;
use crate::storage::Storage;
use crate::transaction::{TransferDirection, TransferRecord};

/// Shared application state: explicitly constructed services over one store.
pub struct AppState {
    pub blockchain: Arc<Blockchain>,
    pub ledger: Arc<Ledger>,
    pub default_difficulty: u32,
    pub max_difficulty: u32,
    pub mining_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn Storage>, config: &Config) -> Self {
        Self {
            blockchain: Arc::new(Blockchain::new(
                Arc::clone(&store),
                config.genesis_difficulty,
            )),
            ledger: Arc::new(Ledger::new(store, config.top_up_amount)),
            default_difficulty: config.genesis_difficulty.min(config.max_difficulty),
            max_difficulty: config.max_difficulty,
            mining_timeout: config.mining_timeout,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse {
    pub is_valid: bool,
    pub block_count: usize,
    pub blocks: Vec<Block>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct ValidateQuery {
    #[serde(default)]
    pub strict: bool,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub strict: bool,
    pub length: usize,
}

#[derive(Deserialize)]
pub struct MineRequest {
    pub data: String,
    pub difficulty: Option<u32>,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub block_id: Option<i64>,
    pub mined_index: u64,
    pub hash: String,
    pub previous_hash: String,
    pub nonce: u64,
    pub difficulty: u32,
}

/* ---------- Wallet API Models ---------- */

#[derive(Serialize)]
pub struct NewWalletResponse {
    pub address: String,
    pub public_key: String,
    pub private_key: String,
    pub balance: u64,
}

#[derive(Serialize)]
pub struct TopUpResponse {
    pub address: String,
    pub credited: u64,
    pub balance: u64,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: u64,
}

/* ---------- Transfer API Models ---------- */

#[derive(Deserialize)]
pub struct TransferRequest {
    pub from_address: String,
    pub to_address: String,
    pub amount: u64,
    pub block_id: Option<i64>,
}

#[derive(Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: TransferRecord,
    pub transaction_type: TransferDirection,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub address: String,
    pub transactions: Vec<HistoryEntry>,
    pub total_count: usize,
}

#[derive(Serialize)]
pub struct BlockTransfersResponse {
    pub block_id: i64,
    pub transactions: Vec<TransferRecord>,
    pub count: usize,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: u64,
    pub latest_hash: Option<String>,
    pub latest_difficulty: Option<u32>,
    pub accounts: u64,
    pub transfers: u64,
    pub max_difficulty: u32,
    pub top_up_amount: u64,
}
