//! Error types surfaced by the HTTP API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errors produced while resolving an ABI and rendering artifacts from it
#[derive(Error, Debug)]
pub enum ApiError {
    /// Explorer endpoint unreachable, non-2xx, or reporting a failure
    #[error("Upstream explorer error: {0}")]
    UpstreamFetch(String),

    /// Explorer `result` or inline ABI is not valid JSON
    #[error("Failed to parse ABI: {0}")]
    AbiParse(String),

    /// Source metadata contained no entry with a contract name
    #[error("Contract not found: {0}")]
    ContractNotFound(String),

    /// ABI entry lacks `type`, `name` or `inputs`, or is nested too deeply
    #[error("Malformed ABI entry: {0}")]
    MalformedAbiEntry(String),

    #[error("Unsupported chain: '{0}'. Expected one of: ethereum, polygon, binance-smart-chain")]
    UnsupportedChain(String),
}

impl ApiError {
    /// Stable machine-readable code used in error bodies
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::UpstreamFetch(_) => "upstream_fetch_error",
            ApiError::AbiParse(_) => "abi_parse_error",
            ApiError::ContractNotFound(_) => "contract_not_found",
            ApiError::MalformedAbiEntry(_) => "malformed_abi_entry",
            ApiError::UnsupportedChain(_) => "unsupported_chain",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UpstreamFetch(_) => StatusCode::BAD_GATEWAY,
            ApiError::ContractNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AbiParse(_)
            | ApiError::MalformedAbiEntry(_)
            | ApiError::UnsupportedChain(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
