//! Audit sink capability
//!
//! The submit path treats audit failure as fatal: if an append fails or
//! exceeds its deadline, the surrounding transaction rolls back so every
//! persisted trade is guaranteed an audit entry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use types::audit::{AuditEntry, AuditStats, EntryId};
use types::ids::MarketId;
use types::trade::Trade;

/// Default number of entries returned by range queries.
pub const DEFAULT_QUERY_LIMIT: usize = 100;
/// Hard cap on entries returned by range queries.
pub const MAX_QUERY_LIMIT: usize = 1000;

/// Default retention per market stream.
pub const DEFAULT_MAX_ENTRIES_PER_MARKET: usize = 100_000;
/// Default retention for the global stream.
pub const DEFAULT_MAX_ENTRIES_GLOBAL: usize = 1_000_000;

/// Audit log failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("Audit log unavailable: {0}")]
    Unavailable(String),

    #[error("Audit append exceeded its deadline")]
    DeadlineExceeded,

    #[error("Corrupt audit entry: {0}")]
    Corrupt(String),
}

/// Append-only audit stream store.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record a trade in its market stream and the global stream.
    /// Returns the market-stream entry.
    async fn append(&self, trade: &Trade) -> Result<AuditEntry, AuditError>;

    /// Oldest-first entries for one market.
    async fn get_for_market(
        &self,
        market_id: MarketId,
        limit: Option<usize>,
    ) -> Result<Vec<AuditEntry>, AuditError>;

    /// Newest-first entries across all markets.
    async fn get_recent_global(&self, limit: Option<usize>)
        -> Result<Vec<AuditEntry>, AuditError>;

    /// Entries whose id falls in `[start-0, end-MAX]` for one market.
    async fn get_range(
        &self,
        market_id: MarketId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AuditEntry>, AuditError>;

    /// Count plus oldest/newest ids of a market stream.
    async fn stats(&self, market_id: MarketId) -> Result<AuditStats, AuditError>;
}

/// Stream key for one market.
pub fn market_stream_key(market_id: MarketId) -> String {
    format!("audit:market:{market_id}")
}

/// Stream key for the global cross-market stream.
pub fn global_stream_key() -> &'static str {
    "audit:global"
}

/// Clamp a caller-supplied limit to `[1, MAX_QUERY_LIMIT]`.
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_QUERY_LIMIT).clamp(1, MAX_QUERY_LIMIT)
}

/// Allocate the next id for a stream.
///
/// Ids are `<unix_millis>-<sequence>`. Within one millisecond the
/// sequence increments; if the wall clock regresses past the stream head
/// the previous millisecond is held so the id keeps increasing.
pub fn next_entry_id(last: Option<EntryId>, now_millis: i64) -> EntryId {
    match last {
        Some(last) if now_millis <= last.millis => EntryId::new(last.millis, last.sequence + 1),
        _ => EntryId::new(now_millis, 0),
    }
}
