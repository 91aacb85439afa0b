//! Validation error taxonomy
//!
//! Errors raised before any state change. Each carries the offending
//! field and a stable machine-readable code for client dispatch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A request field failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Request field the failure refers to.
    pub field: &'static str,
    /// Stable machine-readable code, e.g. `PRICE_OUT_OF_RANGE`.
    pub code: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
        }
    }
}

/// Why a market cannot accept orders.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotTradableReason {
    #[error("market not found")]
    NotFound,
    #[error("market is resolved")]
    Resolved,
    #[error("market is cancelled")]
    Cancelled,
    #[error("market has ended")]
    Ended,
}

impl NotTradableReason {
    pub fn code(&self) -> &'static str {
        match self {
            NotTradableReason::NotFound => "MARKET_NOT_FOUND",
            NotTradableReason::Resolved => "MARKET_RESOLVED",
            NotTradableReason::Cancelled => "MARKET_CANCELLED",
            NotTradableReason::Ended => "MARKET_ENDED",
        }
    }
}
