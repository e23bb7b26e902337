use actix_web::{HttpResponse, post, web};

use super::models::{AppState, NewWalletResponse, TopUpResponse};
use super::normalize_address;
use crate::error::ChainError;

#[post("/wallet/new/")]
pub async fn create_wallet(state: web::Data<AppState>) -> Result<HttpResponse, ChainError> {
    let created = state.ledger.create_account()?;
    Ok(HttpResponse::Ok().json(NewWalletResponse {
        address: created.account.address,
        public_key: created.keys.public_key,
        private_key: created.keys.private_key,
        balance: created.account.balance,
    }))
}

/// DEV faucet: credit the configured top-up amount to an existing wallet.
#[post("/wallet/{address}/topup/")]
pub async fn top_up_wallet(
    state: web::Data<AppState>,
    path: web::Path<(String,)>,
) -> Result<HttpResponse, ChainError> {
    let address = normalize_address(&path.into_inner().0);
    let balance = state.ledger.credit_account(&address)?;
    Ok(HttpResponse::Ok().json(TopUpResponse {
        address,
        credited: state.ledger.top_up_amount(),
        balance,
    }))
}
