//! In-memory audit sink
//!
//! Backs tests and local development. Mirrors the stream semantics of
//! the Redis implementation: per-stream monotonic ids, bounded retention,
//! oldest-first market reads, newest-first global reads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use types::audit::{AuditEntry, AuditStats, EntryId};
use types::clock::{Clock, SystemClock};
use types::ids::MarketId;
use types::trade::Trade;

use crate::sink::{
    clamp_limit, global_stream_key, market_stream_key, next_entry_id, AuditError, AuditSink,
    DEFAULT_MAX_ENTRIES_GLOBAL, DEFAULT_MAX_ENTRIES_PER_MARKET, MAX_QUERY_LIMIT,
};

/// Audit sink holding its streams in process memory.
pub struct MemoryAuditLog {
    streams: Mutex<HashMap<String, Vec<AuditEntry>>>,
    clock: Arc<dyn Clock>,
    max_per_market: usize,
    max_global: usize,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Use a caller-supplied clock (deterministic ids in tests).
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            clock,
            max_per_market: DEFAULT_MAX_ENTRIES_PER_MARKET,
            max_global: DEFAULT_MAX_ENTRIES_GLOBAL,
        }
    }

    pub fn with_retention(mut self, max_per_market: usize, max_global: usize) -> Self {
        self.max_per_market = max_per_market;
        self.max_global = max_global;
        self
    }

    fn append_to_stream(
        streams: &mut HashMap<String, Vec<AuditEntry>>,
        key: String,
        trade: &Trade,
        now: DateTime<Utc>,
        max_entries: usize,
    ) -> AuditEntry {
        let stream = streams.entry(key).or_default();
        let id = next_entry_id(stream.last().map(|e| e.id), now.timestamp_millis());
        let entry = AuditEntry::from_trade(trade, id, now);
        stream.push(entry.clone());
        if stream.len() > max_entries {
            let excess = stream.len() - max_entries;
            stream.drain(..excess);
        }
        entry
    }
}

impl Default for MemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditLog {
    async fn append(&self, trade: &Trade) -> Result<AuditEntry, AuditError> {
        let now = self.clock.now();
        let mut streams = self.streams.lock().expect("audit stream lock poisoned");
        let entry = Self::append_to_stream(
            &mut streams,
            market_stream_key(trade.market_id),
            trade,
            now,
            self.max_per_market,
        );
        Self::append_to_stream(
            &mut streams,
            global_stream_key().to_string(),
            trade,
            now,
            self.max_global,
        );
        Ok(entry)
    }

    async fn get_for_market(
        &self,
        market_id: MarketId,
        limit: Option<usize>,
    ) -> Result<Vec<AuditEntry>, AuditError> {
        let limit = clamp_limit(limit);
        let streams = self.streams.lock().expect("audit stream lock poisoned");
        Ok(streams
            .get(&market_stream_key(market_id))
            .map(|stream| stream.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_recent_global(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<AuditEntry>, AuditError> {
        let limit = clamp_limit(limit);
        let streams = self.streams.lock().expect("audit stream lock poisoned");
        Ok(streams
            .get(global_stream_key())
            .map(|stream| stream.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_range(
        &self,
        market_id: MarketId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AuditEntry>, AuditError> {
        let lo = EntryId::range_start(start.timestamp_millis());
        let hi = EntryId::range_end(end.timestamp_millis());
        let streams = self.streams.lock().expect("audit stream lock poisoned");
        Ok(streams
            .get(&market_stream_key(market_id))
            .map(|stream| {
                stream
                    .iter()
                    .filter(|entry| entry.id >= lo && entry.id <= hi)
                    .take(MAX_QUERY_LIMIT)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn stats(&self, market_id: MarketId) -> Result<AuditStats, AuditError> {
        let streams = self.streams.lock().expect("audit stream lock poisoned");
        let stream = streams.get(&market_stream_key(market_id));
        Ok(AuditStats {
            count: stream.map(|s| s.len() as u64).unwrap_or(0),
            oldest_id: stream.and_then(|s| s.first()).map(|e| e.id),
            newest_id: stream.and_then(|s| s.last()).map(|e| e.id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use types::clock::FixedClock;
    use types::ids::{OrderId, TradeId, UserAddress};
    use types::market::Outcome;
    use types::numeric::{Price, Quantity};
    use types::order::Side;

    fn ts(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 16, 12, 0, second).unwrap()
    }

    fn trade(market_id: MarketId, second: u32) -> Trade {
        Trade::new(
            TradeId::new(),
            market_id,
            Outcome::Yes,
            Price::from_str("0.55").unwrap(),
            Quantity::new(100),
            OrderId::new(),
            OrderId::new(),
            UserAddress::new("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
            UserAddress::new("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"),
            Side::Buy,
            ts(second),
        )
    }

    #[tokio::test]
    async fn test_append_writes_both_streams() {
        let log = MemoryAuditLog::with_clock(Arc::new(FixedClock(ts(1))));
        let market_id = MarketId::new();
        let entry = log.append(&trade(market_id, 1)).await.unwrap();

        let market_entries = log.get_for_market(market_id, None).await.unwrap();
        let global_entries = log.get_recent_global(None).await.unwrap();
        assert_eq!(market_entries, vec![entry.clone()]);
        assert_eq!(global_entries.len(), 1);
        assert_eq!(global_entries[0].trade_id, entry.trade_id);
    }

    #[tokio::test]
    async fn test_ids_strictly_increase_within_stream() {
        // Fixed clock: every append lands in the same millisecond
        let log = MemoryAuditLog::with_clock(Arc::new(FixedClock(ts(1))));
        let market_id = MarketId::new();
        for second in 0..5 {
            log.append(&trade(market_id, second)).await.unwrap();
        }

        let entries = log.get_for_market(market_id, None).await.unwrap();
        assert_eq!(entries.len(), 5);
        for pair in entries.windows(2) {
            assert!(pair[0].id < pair[1].id, "ids must strictly increase");
        }
        // Same millisecond: sequence must be doing the work
        assert_eq!(entries[0].id.millis, entries[4].id.millis);
        assert_eq!(entries[4].id.sequence, 4);
    }

    #[tokio::test]
    async fn test_market_streams_are_independent() {
        let log = MemoryAuditLog::with_clock(Arc::new(FixedClock(ts(1))));
        let market_a = MarketId::new();
        let market_b = MarketId::new();
        log.append(&trade(market_a, 1)).await.unwrap();
        log.append(&trade(market_b, 2)).await.unwrap();
        log.append(&trade(market_a, 3)).await.unwrap();

        assert_eq!(log.get_for_market(market_a, None).await.unwrap().len(), 2);
        assert_eq!(log.get_for_market(market_b, None).await.unwrap().len(), 1);
        assert_eq!(log.get_recent_global(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_recent_global_is_newest_first() {
        let log = MemoryAuditLog::with_clock(Arc::new(FixedClock(ts(1))));
        let market_id = MarketId::new();
        let first = log.append(&trade(market_id, 1)).await.unwrap();
        let second = log.append(&trade(market_id, 2)).await.unwrap();

        let recent = log.get_recent_global(None).await.unwrap();
        assert_eq!(recent[0].trade_id, second.trade_id);
        assert_eq!(recent[1].trade_id, first.trade_id);
    }

    #[tokio::test]
    async fn test_limit_clamped() {
        let log = MemoryAuditLog::with_clock(Arc::new(FixedClock(ts(1))));
        let market_id = MarketId::new();
        for second in 0..10 {
            log.append(&trade(market_id, second)).await.unwrap();
        }
        assert_eq!(
            log.get_for_market(market_id, Some(3)).await.unwrap().len(),
            3
        );
        assert_eq!(
            log.get_for_market(market_id, Some(0)).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_get_range_filters_by_time() {
        let market_id = MarketId::new();
        let log = MemoryAuditLog::with_clock(Arc::new(FixedClock(ts(5))));
        for second in 0..3 {
            log.append(&trade(market_id, second)).await.unwrap();
        }
        // All entries logged at ts(5): a range covering that instant
        // returns everything, a range ending before it returns nothing
        let all = log.get_range(market_id, ts(4), ts(6)).await.unwrap();
        assert_eq!(all.len(), 3);
        let none = log.get_range(market_id, ts(0), ts(4)).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let log = MemoryAuditLog::with_clock(Arc::new(FixedClock(ts(1))));
        let market_id = MarketId::new();

        let empty = log.stats(market_id).await.unwrap();
        assert_eq!(empty.count, 0);
        assert!(empty.oldest_id.is_none());

        for second in 0..4 {
            log.append(&trade(market_id, second)).await.unwrap();
        }
        let stats = log.stats(market_id).await.unwrap();
        assert_eq!(stats.count, 4);
        assert!(stats.oldest_id.unwrap() < stats.newest_id.unwrap());
    }

    #[tokio::test]
    async fn test_retention_trims_oldest() {
        let log = MemoryAuditLog::with_clock(Arc::new(FixedClock(ts(1)))).with_retention(3, 5);
        let market_id = MarketId::new();
        for second in 0..6 {
            log.append(&trade(market_id, second)).await.unwrap();
        }

        let entries = log.get_for_market(market_id, None).await.unwrap();
        assert_eq!(entries.len(), 3);
        // Oldest entries were dropped
        assert_eq!(entries[0].id.sequence, 3);
        assert_eq!(log.get_recent_global(None).await.unwrap().len(), 5);
    }
}
