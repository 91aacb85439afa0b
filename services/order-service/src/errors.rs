//! Submit-path error taxonomy

use matching_engine::BookError;
use persistence::StoreError;
use signing::SigningError;
use thiserror::Error;
use types::errors::{NotTradableReason, ValidationError};
use types::ids::OrderId;

/// Everything that can go wrong between request and receipt.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// Bad request field; no side effects.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Market missing, resolved, cancelled, or past its end time.
    #[error("market not tradable: {0}")]
    MarketNotTradable(NotTradableReason),

    /// Admission lock busy: the user already has a submission in flight
    /// on this market.
    #[error("concurrent submission in flight for this user and market")]
    RateLimited,

    /// Durable store failure (includes exhausted serialization retries
    /// and audit-unavailable rollbacks).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The transaction committed but the receipt could not be signed.
    /// The order exists; the response carries no signature.
    #[error("receipt signing failed for order {order_id}")]
    Signing {
        order_id: OrderId,
        #[source]
        source: SigningError,
    },

    /// Book invariant violation after commit.
    #[error("order book inconsistency: {0}")]
    Internal(#[from] BookError),
}

impl SubmitError {
    /// Map a store-level rejection onto the submit taxonomy.
    pub fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::MarketNotTradable(reason) => SubmitError::MarketNotTradable(reason),
            other => SubmitError::Store(other),
        }
    }

    /// Stable machine-readable code for the client payload.
    pub fn code(&self) -> &'static str {
        match self {
            SubmitError::Validation(err) => err.code,
            SubmitError::MarketNotTradable(reason) => reason.code(),
            SubmitError::RateLimited => "RATE_LIMITED",
            SubmitError::Store(StoreError::ConflictRetriesExhausted { .. }) => {
                "SERIALIZATION_CONFLICT"
            }
            SubmitError::Store(StoreError::AuditUnavailable(_)) => "AUDIT_UNAVAILABLE",
            SubmitError::Store(_) => "STORE_ERROR",
            SubmitError::Signing { .. } => "SIGNING_FAILURE",
            SubmitError::Internal(_) => "INTERNAL",
        }
    }
}
