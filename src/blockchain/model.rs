use std::sync::{Arc, Mutex, MutexGuard};

use log::{info, warn};

use super::{Block, MiningControl};
use crate::error::{ChainError, Result};
use crate::storage::Storage;

/// Builds and validates the persisted chain. Storage is the only source of
/// truth; this type holds no blocks of its own.
pub struct Blockchain {
    store: Arc<dyn Storage>,
    genesis_difficulty: u32,
    /// Serializes genesis creation and appends so two callers never seal
    /// successors of the same tip.
    append_lock: Mutex<()>,
}

impl Blockchain {
    pub fn new(store: Arc<dyn Storage>, genesis_difficulty: u32) -> Self {
        Self {
            store,
            genesis_difficulty,
            append_lock: Mutex::new(()),
        }
    }

    fn lock_appends(&self) -> Result<MutexGuard<'_, ()>> {
        self.append_lock
            .lock()
            .map_err(|_| ChainError::persistence("append", "append lock poisoned"))
    }

    /// Ensure a genesis block exists, creating it on first call. Safe to call
    /// from several threads; only one genesis is ever written.
    pub fn initialize(&self) -> Result<Block> {
        let _guard = self.lock_appends()?;
        match self.store.get_latest_block()? {
            Some(tip) => {
                info!("CHAIN - latest block #{} (hash={})", tip.index, tip.hash);
                Ok(tip)
            }
            None => self.persist_genesis(),
        }
    }

    /// Create and persist the genesis block. Fails with a persistence error
    /// if one already exists; callers should normally use `initialize`.
    pub fn create_genesis_block(&self) -> Result<Block> {
        let _guard = self.lock_appends()?;
        self.persist_genesis()
    }

    fn persist_genesis(&self) -> Result<Block> {
        let mut genesis = Block::genesis(self.genesis_difficulty);
        genesis.id = Some(self.store.save_block(&genesis)?);
        info!("CHAIN - created genesis block (hash={})", genesis.hash);
        Ok(genesis)
    }

    /// Seal a successor of the current tip carrying `data` and persist it.
    pub fn create_new_block(
        &self,
        data: String,
        difficulty: u32,
        control: &MiningControl,
    ) -> Result<Block> {
        let _guard = self.lock_appends()?;
        let tip = self.store.get_latest_block()?.ok_or(ChainError::ChainEmpty)?;

        let mut block = Block::new(&tip, data, difficulty);
        block.mine(control)?;
        block.id = Some(self.store.save_block(&block)?);

        info!(
            "CHAIN - sealed block #{} (hash={}, nonce={}, difficulty={})",
            block.index, block.hash, block.nonce, block.difficulty
        );
        Ok(block)
    }

    /// Check linkage and hash integrity of every persisted block. A
    /// mismatch is `Ok(false)`; only a failed read is an error.
    pub fn validate_chain(&self) -> Result<bool> {
        self.validate(false)
    }

    /// Like `validate_chain`, but additionally require every non-genesis
    /// block's hash to meet its recorded difficulty.
    pub fn validate_chain_strict(&self) -> Result<bool> {
        self.validate(true)
    }

    fn validate(&self, check_pow: bool) -> Result<bool> {
        let blocks = self.store.get_all_blocks()?;
        let valid = is_valid_sequence(&blocks, check_pow);
        if !valid {
            warn!("CHAIN - validation failed over {} blocks", blocks.len());
        }
        Ok(valid)
    }

    pub fn latest_block(&self) -> Result<Option<Block>> {
        self.store.get_latest_block()
    }

    pub fn block_by_index(&self, index: u64) -> Result<Block> {
        self.store
            .get_block_by_index(index)?
            .ok_or(ChainError::BlockNotFound(index))
    }

    pub fn blocks(&self) -> Result<Vec<Block>> {
        self.store.get_all_blocks()
    }
}

/// Walk an ascending sequence of blocks. An empty sequence is vacuously
/// valid; the first block must be an untampered genesis.
pub fn is_valid_sequence(blocks: &[Block], check_pow: bool) -> bool {
    if let Some(genesis) = blocks.first() {
        if genesis.index != 0
            || !genesis.previous_hash.is_empty()
            || genesis.hash != genesis.compute_hash()
        {
            return false;
        }
    }

    for pair in blocks.windows(2) {
        let (prev, current) = (&pair[0], &pair[1]);

        if current.previous_hash != prev.hash {
            return false;
        }
        if current.hash != current.compute_hash() {
            return false;
        }
        if check_pow && !current.meets_difficulty() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    fn chain() -> Blockchain {
        let store = SqliteStorage::open_in_memory().unwrap();
        Blockchain::new(Arc::new(store), 4)
    }

    fn mined(tip: &Block, data: &str, difficulty: u32) -> Block {
        let mut b = Block::new(tip, data.into(), difficulty);
        b.mine(&MiningControl::new()).unwrap();
        b
    }

    #[test]
    fn append_before_genesis_is_chain_empty() {
        let bc = chain();
        let err = bc
            .create_new_block("x".into(), 1, &MiningControl::new())
            .unwrap_err();
        assert!(matches!(err, ChainError::ChainEmpty));
    }

    #[test]
    fn initialize_is_idempotent() {
        let bc = chain();
        let first = bc.initialize().unwrap();
        let second = bc.initialize().unwrap();
        assert_eq!(first.hash, second.hash);
        assert_eq!(bc.blocks().unwrap().len(), 1);
    }

    #[test]
    fn second_genesis_is_rejected() {
        let bc = chain();
        bc.create_genesis_block().unwrap();
        assert!(matches!(
            bc.create_genesis_block(),
            Err(ChainError::Persistence { .. })
        ));
    }

    #[test]
    fn new_block_links_to_tip() {
        let bc = chain();
        let genesis = bc.create_genesis_block().unwrap();
        assert_eq!(genesis.difficulty, 4);
        assert!(genesis.id.is_some());

        let b1 = bc
            .create_new_block("payload-1".into(), 2, &MiningControl::new())
            .unwrap();
        assert_eq!(b1.index, 1);
        assert_eq!(b1.previous_hash, genesis.hash);
        assert!(b1.hash.starts_with("00"));
        assert_eq!(b1.hash, b1.compute_hash());
        assert_eq!(bc.block_by_index(1).unwrap(), b1);
        assert!(bc.validate_chain().unwrap());
        assert!(bc.validate_chain_strict().unwrap());
    }

    #[test]
    fn missing_block_is_not_found() {
        let bc = chain();
        assert!(matches!(
            bc.block_by_index(3),
            Err(ChainError::BlockNotFound(3))
        ));
    }

    #[test]
    fn empty_and_single_block_sequences_are_valid() {
        assert!(is_valid_sequence(&[], true));
        assert!(is_valid_sequence(&[Block::genesis(4)], true));
    }

    #[test]
    fn broken_link_is_invalid() {
        let genesis = Block::genesis(4);
        let b1 = mined(&genesis, "one", 1);
        let mut b2 = mined(&b1, "two", 1);
        b2.previous_hash = genesis.hash.clone();
        b2.hash = b2.compute_hash();
        assert!(!is_valid_sequence(&[genesis, b1, b2], false));
    }

    #[test]
    fn tampered_data_is_invalid() {
        let genesis = Block::genesis(4);
        let mut b1 = mined(&genesis, "one", 1);
        b1.data = "forged".into();
        assert!(!is_valid_sequence(&[genesis, b1], false));
    }

    #[test]
    fn tampered_genesis_is_invalid() {
        let mut genesis = Block::genesis(4);
        genesis.data = "forged".into();
        assert!(!is_valid_sequence(&[genesis], false));

        let mut resealed = Block::genesis(4);
        resealed.previous_hash = "ab".into();
        resealed.hash = resealed.compute_hash();
        assert!(!is_valid_sequence(&[resealed], false));

        let mut shifted = Block::genesis(4);
        shifted.index = 1;
        shifted.hash = shifted.compute_hash();
        assert!(!is_valid_sequence(&[shifted], false));
    }

    #[test]
    fn strict_mode_checks_difficulty() {
        let genesis = Block::genesis(4);
        // Claims difficulty 8 but was only sealed against 0.
        let mut b1 = Block::new(&genesis, "lazy".into(), 8);
        b1.hash = b1.compute_hash();
        let blocks = [genesis, b1];
        assert!(is_valid_sequence(&blocks, false));
        assert!(!is_valid_sequence(&blocks, true));
    }
}
