//! Redis Streams audit sink
//!
//! Each market writes to `audit:market:<id>`, every trade also lands in
//! `audit:global`. Appends use explicit `<unix_millis>-<sequence>` ids
//! allocated locally; when Redis rejects an id (another writer advanced
//! the stream, or the clock regressed past its head) the append falls
//! back to a server-generated id and logs a warning. Streams are trimmed
//! approximately (`MAXLEN ~`) to the configured retention.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::streams::{StreamMaxlen, StreamRangeReply};
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;
use types::audit::{AuditEntry, AuditStats, EntryId};
use types::clock::{Clock, SystemClock};
use types::ids::MarketId;
use types::trade::Trade;

use crate::sink::{
    clamp_limit, global_stream_key, market_stream_key, next_entry_id, AuditError, AuditSink,
    DEFAULT_MAX_ENTRIES_GLOBAL, DEFAULT_MAX_ENTRIES_PER_MARKET, MAX_QUERY_LIMIT,
};

/// Hard deadline for one append (both streams).
const DEFAULT_APPEND_DEADLINE: Duration = Duration::from_secs(1);

/// Audit sink backed by Redis Streams.
pub struct RedisAuditLog {
    conn: ConnectionManager,
    clock: Arc<dyn Clock>,
    /// Last id this process allocated per stream key.
    last_ids: Mutex<HashMap<String, EntryId>>,
    max_per_market: usize,
    max_global: usize,
    append_deadline: Duration,
}

impl RedisAuditLog {
    /// Connect to the log store.
    pub async fn connect(url: &str) -> Result<Self, AuditError> {
        let client =
            redis::Client::open(url).map_err(|err| AuditError::Unavailable(err.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|err| AuditError::Unavailable(err.to_string()))?;
        Ok(Self::with_connection(conn))
    }

    pub fn with_connection(conn: ConnectionManager) -> Self {
        Self {
            conn,
            clock: Arc::new(SystemClock),
            last_ids: Mutex::new(HashMap::new()),
            max_per_market: DEFAULT_MAX_ENTRIES_PER_MARKET,
            max_global: DEFAULT_MAX_ENTRIES_GLOBAL,
            append_deadline: DEFAULT_APPEND_DEADLINE,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retention(mut self, max_per_market: usize, max_global: usize) -> Self {
        self.max_per_market = max_per_market;
        self.max_global = max_global;
        self
    }

    pub fn with_append_deadline(mut self, deadline: Duration) -> Self {
        self.append_deadline = deadline;
        self
    }

    /// Allocate the next id for `key` from the local head cache.
    fn allocate_id(&self, key: &str, now_millis: i64) -> EntryId {
        let mut last_ids = self.last_ids.lock().expect("audit id lock poisoned");
        let id = next_entry_id(last_ids.get(key).copied(), now_millis);
        last_ids.insert(key.to_string(), id);
        id
    }

    /// Record the id the server actually accepted.
    fn record_id(&self, key: &str, id: EntryId) {
        let mut last_ids = self.last_ids.lock().expect("audit id lock poisoned");
        let slot = last_ids.entry(key.to_string()).or_insert(id);
        if id > *slot {
            *slot = id;
        }
    }

    async fn append_to_stream(
        &self,
        key: &str,
        trade: &Trade,
        logged_at: DateTime<Utc>,
        maxlen: usize,
    ) -> Result<AuditEntry, AuditError> {
        let intended = self.allocate_id(key, logged_at.timestamp_millis());
        let entry = AuditEntry::from_trade(trade, intended, logged_at);
        let payload = serde_json::to_string(&entry)
            .map_err(|err| AuditError::Corrupt(err.to_string()))?;

        let mut conn = self.conn.clone();
        let attempt: Result<String, redis::RedisError> = conn
            .xadd_maxlen(
                key,
                StreamMaxlen::Approx(maxlen),
                &intended.to_string(),
                &[("payload", payload.as_str())],
            )
            .await;

        let accepted = match attempt {
            Ok(id) => id,
            Err(err) if is_id_rejection(&err) => {
                warn!(stream = key, intended = %intended, "stream head ahead of intended id, falling back to auto id");
                conn.xadd_maxlen(
                    key,
                    StreamMaxlen::Approx(maxlen),
                    "*",
                    &[("payload", payload.as_str())],
                )
                .await
                .map_err(|err| AuditError::Unavailable(err.to_string()))?
            }
            Err(err) => return Err(AuditError::Unavailable(err.to_string())),
        };

        let id: EntryId = accepted
            .parse()
            .map_err(|_| AuditError::Corrupt(format!("bad stream id {accepted:?}")))?;
        self.record_id(key, id);
        Ok(AuditEntry { id, ..entry })
    }

    async fn read_range(
        &self,
        key: &str,
        start: String,
        end: String,
        count: usize,
        reverse: bool,
    ) -> Result<Vec<AuditEntry>, AuditError> {
        let mut conn = self.conn.clone();
        let reply: StreamRangeReply = if reverse {
            conn.xrevrange_count(key, start, end, count)
                .await
                .map_err(|err| AuditError::Unavailable(err.to_string()))?
        } else {
            conn.xrange_count(key, start, end, count)
                .await
                .map_err(|err| AuditError::Unavailable(err.to_string()))?
        };

        reply
            .ids
            .iter()
            .map(|stream_id| {
                let payload: String = stream_id
                    .get("payload")
                    .ok_or_else(|| AuditError::Corrupt("entry missing payload field".into()))?;
                let mut entry: AuditEntry = serde_json::from_str(&payload)
                    .map_err(|err| AuditError::Corrupt(err.to_string()))?;
                // The stream id is authoritative (auto-id fallback may have
                // replaced the intended one)
                entry.id = stream_id
                    .id
                    .parse()
                    .map_err(|_| AuditError::Corrupt(format!("bad stream id {:?}", stream_id.id)))?;
                Ok(entry)
            })
            .collect()
    }
}

/// Redis rejects an explicit XADD id that is not greater than the stream
/// head with a response error naming the constraint.
fn is_id_rejection(err: &redis::RedisError) -> bool {
    err.kind() == redis::ErrorKind::ResponseError
        && err.to_string().contains("equal or smaller than the target stream top item")
}

#[async_trait]
impl AuditSink for RedisAuditLog {
    async fn append(&self, trade: &Trade) -> Result<AuditEntry, AuditError> {
        let logged_at = self.clock.now();
        let work = async {
            let entry = self
                .append_to_stream(
                    &market_stream_key(trade.market_id),
                    trade,
                    logged_at,
                    self.max_per_market,
                )
                .await?;
            self.append_to_stream(global_stream_key(), trade, logged_at, self.max_global)
                .await?;
            Ok(entry)
        };
        tokio::time::timeout(self.append_deadline, work)
            .await
            .map_err(|_| AuditError::DeadlineExceeded)?
    }

    async fn get_for_market(
        &self,
        market_id: MarketId,
        limit: Option<usize>,
    ) -> Result<Vec<AuditEntry>, AuditError> {
        self.read_range(
            &market_stream_key(market_id),
            "-".to_string(),
            "+".to_string(),
            clamp_limit(limit),
            false,
        )
        .await
    }

    async fn get_recent_global(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<AuditEntry>, AuditError> {
        self.read_range(
            global_stream_key(),
            "+".to_string(),
            "-".to_string(),
            clamp_limit(limit),
            true,
        )
        .await
    }

    async fn get_range(
        &self,
        market_id: MarketId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AuditEntry>, AuditError> {
        self.read_range(
            &market_stream_key(market_id),
            EntryId::range_start(start.timestamp_millis()).to_string(),
            EntryId::range_end(end.timestamp_millis()).to_string(),
            MAX_QUERY_LIMIT,
            false,
        )
        .await
    }

    async fn stats(&self, market_id: MarketId) -> Result<AuditStats, AuditError> {
        let key = market_stream_key(market_id);
        let mut conn = self.conn.clone();
        let count: u64 = conn
            .xlen(&key)
            .await
            .map_err(|err| AuditError::Unavailable(err.to_string()))?;

        let oldest = self
            .read_range(&key, "-".into(), "+".into(), 1, false)
            .await?;
        let newest = self
            .read_range(&key, "+".into(), "-".into(), 1, true)
            .await?;

        Ok(AuditStats {
            count,
            oldest_id: oldest.first().map(|e| e.id),
            newest_id: newest.first().map(|e| e.id),
        })
    }
}
