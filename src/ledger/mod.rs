//! Accounts, top-ups and transfers. Every check reads the persisted state;
//! nothing here caches balances.

use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ChainError, Result};
use crate::storage::Storage;
use crate::transaction::TransferRecord;
use crate::wallet::{KeyPair, generate_keypair};

/// Default amount credited by a top-up.
pub const DEFAULT_TOP_UP_AMOUNT: u64 = 1000;

/// Upper bound on a page of transfer history.
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    #[serde(skip_serializing)]
    pub private_key: String,
    pub balance: u64,
    pub created_at: i64, // Unix millis (UTC)
}

/// A freshly created account plus the key material the caller must keep.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub account: Account,
    pub keys: KeyPair,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferPage {
    pub records: Vec<TransferRecord>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

pub struct Ledger {
    store: Arc<dyn Storage>,
    top_up_amount: u64,
}

impl Ledger {
    pub fn new(store: Arc<dyn Storage>, top_up_amount: u64) -> Self {
        Self {
            store,
            top_up_amount,
        }
    }

    pub fn top_up_amount(&self) -> u64 {
        self.top_up_amount
    }

    /// Generate a fresh address with a zero balance and persist it.
    pub fn create_account(&self) -> Result<NewAccount> {
        let keys = generate_keypair();
        let account = Account {
            address: keys.address.clone(),
            private_key: keys.private_key.clone(),
            balance: 0,
            created_at: Utc::now().timestamp_millis(),
        };
        self.store.save_account(&account)?;
        info!("LEDGER - created account {}", account.address);
        Ok(NewAccount { account, keys })
    }

    /// Credit the fixed top-up amount. Returns the new balance.
    pub fn credit_account(&self, address: &str) -> Result<u64> {
        let balance = self.store.credit_balance(address, self.top_up_amount)?;
        info!(
            "LEDGER - topped up {} by {} (balance now {})",
            address, self.top_up_amount, balance
        );
        Ok(balance)
    }

    pub fn get_balance(&self, address: &str) -> Result<u64> {
        self.store.get_balance(address)
    }

    pub fn transfer(&self, from: &str, to: &str, amount: u64) -> Result<TransferRecord> {
        self.transfer_in_block(from, to, amount, None)
    }

    /// Move `amount` from `from` to `to` and record it, optionally anchored
    /// to the block with row id `block_id`. All or nothing.
    pub fn transfer_in_block(
        &self,
        from: &str,
        to: &str,
        amount: u64,
        block_id: Option<i64>,
    ) -> Result<TransferRecord> {
        if amount == 0 {
            warn!("LEDGER - rejected transfer {} -> {}: zero amount", from, to);
            return Err(ChainError::InvalidAmount(amount));
        }

        let record = TransferRecord::new(from, to, amount, block_id);
        match self.store.transfer_atomically(&record) {
            Ok(saved) => {
                info!("LEDGER - transferred {} from {} to {}", amount, from, to);
                Ok(saved)
            }
            Err(err) => {
                warn!("LEDGER - transfer {} -> {} failed: {}", from, to, err);
                Err(err)
            }
        }
    }

    /// Transfers touching `address`, newest first. Unknown addresses are
    /// rejected rather than reported as an empty history.
    pub fn history(&self, address: &str) -> Result<Vec<TransferRecord>> {
        if !self.store.account_exists(address)? {
            return Err(ChainError::AccountNotFound(address.to_string()));
        }
        self.store.get_transfer_records_by_address(address)
    }

    pub fn transfers_by_block(&self, block_id: i64) -> Result<Vec<TransferRecord>> {
        self.store.get_transfer_records_by_block_id(block_id)
    }

    /// One page of all transfers, newest first. Out-of-range `page`/`limit`
    /// fall back to 1 and 20.
    pub fn transfers_page(&self, page: u32, limit: u32) -> Result<TransferPage> {
        let page = page.max(1);
        let limit = if (1..=MAX_PAGE_LIMIT).contains(&limit) {
            limit
        } else {
            20
        };
        let total = self.store.count_transfer_records()?;
        let offset = u64::from(page - 1) * u64::from(limit);
        let records = self.store.get_transfer_records_page(limit, offset)?;
        Ok(TransferPage {
            records,
            page,
            limit,
            total,
            total_pages: total.div_ceil(u64::from(limit)),
        })
    }

    pub fn account_count(&self) -> Result<u64> {
        self.store.count_accounts()
    }

    pub fn transfer_count(&self) -> Result<u64> {
        self.store.count_transfer_records()
    }
}
