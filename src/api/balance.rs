use actix_web::{HttpResponse, get, web};

use super::models::{AppState, BalanceResponse};
use super::normalize_address;
use crate::error::ChainError;

#[get("/balance/{address}/")]
pub async fn get_balance(
    state: web::Data<AppState>,
    path: web::Path<(String,)>,
) -> Result<HttpResponse, ChainError> {
    let address = normalize_address(&path.into_inner().0);
    let balance = state.ledger.get_balance(&address)?;
    Ok(HttpResponse::Ok().json(BalanceResponse { address, balance }))
}
