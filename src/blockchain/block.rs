use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::pow::MiningControl;
use super::{GENESIS_DATA, MAX_HASH_DIFFICULTY};
use crate::error::{ChainError, Result};

/// How many nonces to try between deadline checks.
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// A single sealed unit of the chain carrying an opaque data string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Storage-assigned row id; `None` until persisted.
    pub id: Option<i64>,
    pub index: u64,
    pub timestamp: i64, // Unix millis (UTC), fixed before sealing
    pub data: String,
    pub previous_hash: String,
    pub nonce: u64,
    pub difficulty: u32,
    pub hash: String,
}

impl Block {
    /// Create the genesis block. It is not mined: the hash is computed once
    /// with nonce 0.
    pub fn genesis(difficulty: u32) -> Self {
        let mut block = Self {
            id: None,
            index: 0,
            timestamp: Utc::now().timestamp_millis(),
            data: GENESIS_DATA.to_string(),
            previous_hash: String::new(),
            nonce: 0,
            difficulty,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// Create a successor candidate of `tip`. Call `mine()` to seal it.
    pub fn new(tip: &Block, data: String, difficulty: u32) -> Self {
        let mut block = Self {
            id: None,
            index: tip.index + 1,
            timestamp: Utc::now().timestamp_millis(),
            data,
            previous_hash: tip.hash.clone(),
            nonce: 0,
            difficulty,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// SHA-256 over index, timestamp, data, previous hash, nonce and
    /// difficulty (never the `hash` or `id` fields), as lowercase hex.
    /// Integers are fixed-width big-endian and strings are length-prefixed,
    /// so distinct field values never share a preimage.
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.index.to_be_bytes());
        hasher.update(self.timestamp.to_be_bytes());
        hasher.update((self.data.len() as u64).to_be_bytes());
        hasher.update(self.data.as_bytes());
        hasher.update((self.previous_hash.len() as u64).to_be_bytes());
        hasher.update(self.previous_hash.as_bytes());
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(self.difficulty.to_be_bytes());
        hex::encode(hasher.finalize())
    }

    /// True when the stored hash starts with `difficulty` hex zeros.
    pub fn meets_difficulty(&self) -> bool {
        hash_meets_difficulty(&self.hash, self.difficulty)
    }

    /// Perform Proof-of-Work: try nonce 0, 1, 2, … until the hash starts
    /// with `difficulty` zeros. The timestamp is never touched here.
    pub fn mine(&mut self, control: &MiningControl) -> Result<()> {
        if self.difficulty > MAX_HASH_DIFFICULTY {
            return Err(ChainError::InvalidDifficulty {
                requested: self.difficulty,
                max: MAX_HASH_DIFFICULTY,
            });
        }

        self.nonce = 0;
        loop {
            self.hash = self.compute_hash();
            if self.meets_difficulty() {
                debug!(
                    "POW - block #{} sealed at nonce {} (difficulty {})",
                    self.index, self.nonce, self.difficulty
                );
                return Ok(());
            }

            let aborted = control.is_cancelled()
                || (self.nonce % DEADLINE_CHECK_INTERVAL == 0 && control.deadline_passed());
            let next = self.nonce.checked_add(1);
            match next {
                Some(n) if !aborted => self.nonce = n,
                _ => {
                    return Err(ChainError::MiningAborted {
                        index: self.index,
                        nonce: self.nonce,
                    });
                }
            }
        }
    }
}

pub fn hash_meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let d = difficulty as usize;
    hash.len() >= d && hash.bytes().take(d).all(|c| c == b'0')
}
