//! Walk through the chain end to end against the configured database:
//! ensure genesis, seal one block, validate, list every block.

use std::error::Error;
use std::process::ExitCode;

use log::error;

use pow_ledger::{Blockchain, Config, MiningControl, open_storage};

fn run() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    let store = open_storage(&config.database_path)?;
    let chain = Blockchain::new(store, config.genesis_difficulty);

    let tip = chain.initialize()?;
    println!("Latest block: Index={}, Hash={}", tip.index, tip.hash);

    let control = MiningControl::with_timeout(config.mining_timeout);
    let block = chain.create_new_block(
        format!("Transaction data {}", tip.index + 1),
        config.genesis_difficulty,
        &control,
    )?;
    println!("Created new block: Index={}, Hash={}", block.index, block.hash);

    println!("Blockchain is valid: {}", chain.validate_chain()?);

    println!("\nAll blocks:");
    for b in chain.blocks()? {
        println!("Index: {}, Hash: {}, Data: {}", b.index, b.hash, b.data);
    }
    Ok(())
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("demo failed: {}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
