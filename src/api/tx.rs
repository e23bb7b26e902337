use actix_web::{HttpResponse, get, post, web};
use log::debug;

use super::models::{
    AppState, BlockTransfersResponse, HistoryEntry, HistoryResponse, PageQuery, TransferRequest,
};
use super::normalize_address;
use crate::error::ChainError;

/// Move funds between two wallets.
#[post("/transfer/")]
pub async fn post_transfer(
    state: web::Data<AppState>,
    body: web::Json<TransferRequest>,
) -> Result<HttpResponse, ChainError> {
    let from = normalize_address(&body.from_address);
    let to = normalize_address(&body.to_address);
    debug!("POST /transfer/ - {} -> {} amount={}", from, to, body.amount);

    let record = state
        .ledger
        .transfer_in_block(&from, &to, body.amount, body.block_id)?;
    Ok(HttpResponse::Ok().json(record))
}

/// All transfers, newest first, paginated.
#[get("/transfers/")]
pub async fn get_transfers(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ChainError> {
    let page = state
        .ledger
        .transfers_page(query.page.unwrap_or(1), query.limit.unwrap_or(20))?;
    Ok(HttpResponse::Ok().json(page))
}

/// Transfers sent or received by one wallet.
#[get("/transfers/{address}/")]
pub async fn get_history(
    state: web::Data<AppState>,
    path: web::Path<(String,)>,
) -> Result<HttpResponse, ChainError> {
    let address = normalize_address(&path.into_inner().0);
    let transactions: Vec<HistoryEntry> = state
        .ledger
        .history(&address)?
        .into_iter()
        .map(|record| HistoryEntry {
            transaction_type: record.direction_for(&address),
            record,
        })
        .collect();

    Ok(HttpResponse::Ok().json(HistoryResponse {
        total_count: transactions.len(),
        address,
        transactions,
    }))
}

/// Transfers anchored to the block with storage row id `block_id`.
#[get("/blocks/{block_id}/transfers/")]
pub async fn get_block_transfers(
    state: web::Data<AppState>,
    path: web::Path<(i64,)>,
) -> Result<HttpResponse, ChainError> {
    let block_id = path.into_inner().0;
    let transactions = state.ledger.transfers_by_block(block_id)?;
    Ok(HttpResponse::Ok().json(BlockTransfersResponse {
        block_id,
        count: transactions.len(),
        transactions,
    }))
}
