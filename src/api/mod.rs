mod balance;
mod chain;
mod error;
mod health;
pub mod models;
mod stats;
mod tx;
mod wallet;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

use crate::wallet::pubkey_to_address_hex;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::validate_chain)
            .service(chain::mine_block)
            .service(chain::get_block)
            .service(tx::post_transfer)
            .service(tx::get_transfers)
            .service(tx::get_history)
            .service(tx::get_block_transfers)
            .service(balance::get_balance)
            .service(stats::get_stats)
            .service(wallet::create_wallet)
            .service(wallet::top_up_wallet),
    );
}

/// Canonical form of an address taken from a request: public-key
/// addresses are lowercased, anything else is only trimmed.
fn normalize_address(raw: &str) -> String {
    let raw = raw.trim();
    pubkey_to_address_hex(raw).unwrap_or_else(|_| raw.to_string())
}
