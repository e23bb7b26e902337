use actix_web::{HttpResponse, get, web};

use super::models::{AppState, StatsResponse};
use crate::error::ChainError;

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> Result<HttpResponse, ChainError> {
    let latest = state.blockchain.latest_block()?;
    let accounts = state.ledger.account_count()?;
    let transfers = state.ledger.transfer_count()?;

    Ok(HttpResponse::Ok().json(StatsResponse {
        height: latest.as_ref().map_or(0, |b| b.index + 1),
        latest_hash: latest.as_ref().map(|b| b.hash.clone()),
        latest_difficulty: latest.as_ref().map(|b| b.difficulty),
        accounts,
        transfers,
        max_difficulty: state.max_difficulty,
        top_up_amount: state.ledger.top_up_amount(),
    }))
}
