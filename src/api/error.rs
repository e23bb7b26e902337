use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;

use super::models::ErrorResponse;
use crate::error::ChainError;

impl ResponseError for ChainError {
    fn status_code(&self) -> StatusCode {
        match self {
            ChainError::AccountNotFound(_) | ChainError::BlockNotFound(_) => StatusCode::NOT_FOUND,
            ChainError::InvalidAmount(_) | ChainError::InvalidDifficulty { .. } => {
                StatusCode::BAD_REQUEST
            }
            ChainError::ChainEmpty => StatusCode::CONFLICT,
            ChainError::InsufficientFunds { .. } | ChainError::BalanceOverflow { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ChainError::MiningAborted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ChainError::Persistence { .. } | ChainError::Worker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("API - {}", self);
        }
        HttpResponse::build(status).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}
