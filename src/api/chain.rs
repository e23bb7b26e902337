use std::sync::Arc;

use actix_web::{HttpResponse, get, post, web};
use chrono::Utc;
use log::{debug, info};

use super::models::{
    AppState, ChainResponse, MineRequest, MineResponse, ValidateQuery, ValidateResponse,
};
use crate::blockchain::MiningControl;
use crate::error::ChainError;

/// Get the full blockchain together with its validity.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> Result<HttpResponse, ChainError> {
    let chain = Arc::clone(&state.blockchain);
    let (is_valid, blocks) = web::block(move || -> Result<_, ChainError> {
        Ok((chain.validate_chain()?, chain.blocks()?))
    })
    .await
    .map_err(|e| ChainError::Worker(e.to_string()))??;
    Ok(HttpResponse::Ok().json(ChainResponse {
        is_valid,
        block_count: blocks.len(),
        blocks,
        last_updated: Utc::now(),
    }))
}

/// Validate the whole chain; `?strict=true` also checks proof-of-work.
/// Validation rehashes every block, so it runs on the blocking pool.
#[get("/validate/")]
pub async fn validate_chain(
    state: web::Data<AppState>,
    query: web::Query<ValidateQuery>,
) -> Result<HttpResponse, ChainError> {
    let strict = query.strict;
    let chain = Arc::clone(&state.blockchain);
    let (valid, length) = web::block(move || -> Result<_, ChainError> {
        let valid = if strict {
            chain.validate_chain_strict()?
        } else {
            chain.validate_chain()?
        };
        let length = chain.latest_block()?.map_or(0, |b| b.index as usize + 1);
        Ok((valid, length))
    })
    .await
    .map_err(|e| ChainError::Worker(e.to_string()))??;
    Ok(HttpResponse::Ok().json(ValidateResponse {
        valid,
        strict,
        length,
    }))
}

#[get("/blocks/{index}/")]
pub async fn get_block(
    state: web::Data<AppState>,
    path: web::Path<(u64,)>,
) -> Result<HttpResponse, ChainError> {
    let block = state.blockchain.block_by_index(path.into_inner().0)?;
    Ok(HttpResponse::Ok().json(block))
}

/// Seal a new block carrying `data`. Proof-of-work runs on the blocking
/// thread pool under the configured deadline.
#[post("/mine/")]
pub async fn mine_block(
    state: web::Data<AppState>,
    req: web::Json<MineRequest>,
) -> Result<HttpResponse, ChainError> {
    let MineRequest { data, difficulty } = req.into_inner();
    let difficulty = difficulty.unwrap_or(state.default_difficulty);
    if difficulty > state.max_difficulty {
        return Err(ChainError::InvalidDifficulty {
            requested: difficulty,
            max: state.max_difficulty,
        });
    }

    let chain = Arc::clone(&state.blockchain);
    let control = MiningControl::with_timeout(state.mining_timeout);
    debug!("MINER - sealing {} bytes at difficulty {}", data.len(), difficulty);

    let block = web::block(move || chain.create_new_block(data, difficulty, &control))
        .await
        .map_err(|e| ChainError::Worker(e.to_string()))??;

    info!("MINER - sealed block #{} (hash={}, nonce={})", block.index, block.hash, block.nonce);
    Ok(HttpResponse::Ok().json(MineResponse {
        block_id: block.id,
        mined_index: block.index,
        hash: block.hash,
        previous_hash: block.previous_hash,
        nonce: block.nonce,
        difficulty: block.difficulty,
    }))
}
