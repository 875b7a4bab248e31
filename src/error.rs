//! API error taxonomy and HTTP mapping.
//!
//! Four families: configuration (500), validation (400), chain-level (500,
//! with a coarse classification folded into the message), and everything else.
//! Unknown errors are logged and surfaced with their raw text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::chain::{classify_chain_error, ChainError, ChainErrorKind};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("userAddress must be a 0x-prefixed 40-hex-char address")]
    InvalidAddress,

    #[error("burn service not configured: PRIVATE_KEY_TREASURY and TOKEN_ADDRESS are required")]
    NotConfigured,

    #[error("a burn for this address is already in progress")]
    BurnInProgress,

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("unknown session: {0}")]
    SessionNotFound(String),

    #[error("session already complete")]
    SessionComplete,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidAddress => StatusCode::BAD_REQUEST,
            ApiError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BurnInProgress | ApiError::SessionComplete => StatusCode::CONFLICT,
            ApiError::Chain(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Human-facing message. Chain errors keep their raw reason so callers can
    /// see what the node said, prefixed with the classified summary.
    fn message(&self) -> String {
        match self {
            ApiError::Chain(e) => {
                let raw = e.to_string();
                match classify_chain_error(&raw) {
                    ChainErrorKind::InsufficientFunds => {
                        format!("treasury has insufficient funds: {raw}")
                    }
                    ChainErrorKind::RejectedByUser => {
                        format!("transaction rejected in wallet: {raw}")
                    }
                    ChainErrorKind::Generic => format!("burn transaction failed: {raw}"),
                }
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!(target: "ctdhub_backend", %status, %message, "Request failed");
        }
        (status, Json(ErrorBody { success: false, error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_errors_keep_the_raw_reason() {
        let err = ApiError::Chain(ChainError::Rpc(
            "insufficient funds for gas * price + value".into(),
        ));
        let msg = err.message();
        assert!(msg.contains("insufficient funds"), "{msg}");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_maps_to_400_and_pending_to_409() {
        assert_eq!(ApiError::InvalidAddress.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::BurnInProgress.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::NotConfigured.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
