//! End-to-end chain scenarios against an on-disk SQLite database.

use std::sync::Arc;
use std::thread;

use pow_ledger::{Blockchain, ChainError, MiningControl, SqliteStorage};
use tempfile::TempDir;

fn open_chain(dir: &TempDir) -> Result<Blockchain, Box<dyn std::error::Error>> {
    let store = SqliteStorage::open(dir.path().join("chain.db"))?;
    Ok(Blockchain::new(Arc::new(store), 4))
}

#[test]
fn test_genesis_append_validate_and_tamper() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let chain = open_chain(&dir)?;

    let genesis = chain.initialize()?;
    assert_eq!(genesis.index, 0);
    assert_eq!(genesis.previous_hash, "");

    let b1 = chain.create_new_block("payload-1".into(), 2, &MiningControl::new())?;
    assert_eq!(b1.index, 1);
    assert_eq!(b1.previous_hash, genesis.hash);
    assert!(b1.hash.starts_with("00"));
    assert!(chain.validate_chain()?);

    // Corrupt block 1 behind the chain's back, without resealing.
    let conn = rusqlite::Connection::open(dir.path().join("chain.db"))?;
    conn.execute("UPDATE blocks SET data = 'forged' WHERE index_num = 1", [])?;

    assert!(!chain.validate_chain()?);
    Ok(())
}

#[test]
fn test_tampered_genesis_fails_validation() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let chain = open_chain(&dir)?;
    chain.initialize()?;
    chain.create_new_block("payload-1".into(), 2, &MiningControl::new())?;
    assert!(chain.validate_chain()?);

    let conn = rusqlite::Connection::open(dir.path().join("chain.db"))?;
    conn.execute("UPDATE blocks SET data = 'forged' WHERE index_num = 0", [])?;

    assert!(!chain.validate_chain()?);
    assert!(!chain.validate_chain_strict()?);
    Ok(())
}

#[test]
fn test_chain_survives_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let tip = {
        let chain = open_chain(&dir)?;
        chain.initialize()?;
        chain.create_new_block("a".into(), 1, &MiningControl::new())?;
        chain.create_new_block("b".into(), 1, &MiningControl::new())?
    };

    let reopened = open_chain(&dir)?;
    let again = reopened.initialize()?;
    assert_eq!(again.hash, tip.hash);
    assert_eq!(reopened.blocks()?.len(), 3);
    assert!(reopened.validate_chain_strict()?);
    Ok(())
}

#[test]
fn test_every_sealed_block_meets_its_difficulty() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let chain = open_chain(&dir)?;
    chain.initialize()?;

    for d in 0..=3 {
        let block = chain.create_new_block(format!("d{d}"), d, &MiningControl::new())?;
        assert!(block.hash.starts_with(&"0".repeat(d as usize)));
        assert_eq!(block.hash, block.compute_hash());
    }
    assert!(chain.validate_chain()?);
    Ok(())
}

#[test]
fn test_concurrent_appends_get_distinct_indexes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let chain = Arc::new(open_chain(&dir)?);
    chain.initialize()?;

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let chain = Arc::clone(&chain);
            thread::spawn(move || chain.create_new_block(format!("t{i}"), 1, &MiningControl::new()))
        })
        .collect();

    let mut indexes = Vec::new();
    for h in handles {
        let block = h.join().expect("append thread panicked")?;
        indexes.push(block.index);
    }
    indexes.sort_unstable();
    assert_eq!(indexes, vec![1, 2, 3, 4]);
    assert!(chain.validate_chain()?);
    Ok(())
}

#[test]
fn test_concurrent_initialize_writes_one_genesis() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let chain = Arc::new(open_chain(&dir)?);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let chain = Arc::clone(&chain);
            thread::spawn(move || chain.initialize())
        })
        .collect();
    let hashes: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().expect("init thread panicked").map(|b| b.hash))
        .collect::<Result<_, _>>()?;

    assert!(hashes.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(chain.blocks()?.len(), 1);
    Ok(())
}

#[test]
fn test_cancelled_mining_persists_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let chain = open_chain(&dir)?;
    chain.initialize()?;

    let control = MiningControl::new();
    control.cancel();
    let err = chain
        .create_new_block("never".into(), 40, &control)
        .unwrap_err();
    assert!(matches!(err, ChainError::MiningAborted { index: 1, .. }));
    assert_eq!(chain.blocks()?.len(), 1);
    Ok(())
}
