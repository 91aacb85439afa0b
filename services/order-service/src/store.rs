//! Submit storage capability
//!
//! The orchestrator persists one submission as a single unit: the taker
//! row, its trades, maker updates, position upserts, and the audit
//! appends, all inside one serializable transaction. A failure anywhere
//! (audit included) rolls the whole submission back.

use async_trait::async_trait;
use audit_log::{AuditError, AuditSink};
use chrono::{DateTime, Utc};
use matching_engine::MakerUpdate;
use persistence::{markets, orders, positions, trades, PgGateway, StoreError};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use types::errors::NotTradableReason;
use types::ids::{MarketId, OrderId, TradeId, UserAddress};
use types::market::{Market, Outcome};
use types::order::{Order, OrderStatus};
use types::position::Position;
use types::trade::Trade;

use crate::positions::{apply_delta, PositionDelta};

/// Everything one submission writes.
#[derive(Debug, Clone)]
pub struct SubmitBatch {
    /// Taker order in its final state (fills and status applied).
    pub taker: Order,
    pub trades: Vec<Trade>,
    pub maker_updates: Vec<MakerUpdate>,
    pub deltas: Vec<PositionDelta>,
    /// The submission's single wall-clock sample.
    pub timestamp: DateTime<Utc>,
}

/// Storage the submit path runs against.
#[async_trait]
pub trait SubmitStore: Send + Sync {
    /// Market lookup for validation.
    async fn fetch_market(&self, market_id: MarketId) -> Result<Option<Market>, StoreError>;

    /// OPEN / PARTIALLY_FILLED orders for a (market, outcome) in creation
    /// order, for book rebuilds.
    async fn open_orders(
        &self,
        market_id: MarketId,
        outcome: Outcome,
    ) -> Result<Vec<Order>, StoreError>;

    /// Atomically persist one submission, appending one audit entry per
    /// trade inside the same unit of work. Re-checks market liveness
    /// against a concurrent resolution before writing.
    async fn persist_submit(
        &self,
        batch: &SubmitBatch,
        audit: &dyn AuditSink,
    ) -> Result<(), StoreError>;
}

fn audit_unavailable(err: AuditError) -> StoreError {
    StoreError::AuditUnavailable(err.to_string())
}

// ---------------------------------------------------------------------------
// Postgres implementation
// ---------------------------------------------------------------------------

/// Production store: serializable transactions through [`PgGateway`].
#[derive(Clone)]
pub struct PgSubmitStore {
    gateway: PgGateway,
}

impl PgSubmitStore {
    pub fn new(gateway: PgGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &PgGateway {
        &self.gateway
    }
}

#[async_trait]
impl SubmitStore for PgSubmitStore {
    async fn fetch_market(&self, market_id: MarketId) -> Result<Option<Market>, StoreError> {
        let mut conn = self.gateway.pool().acquire().await?;
        markets::fetch_market(&mut conn, market_id).await
    }

    async fn open_orders(
        &self,
        market_id: MarketId,
        outcome: Outcome,
    ) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.gateway.pool().acquire().await?;
        orders::open_orders_for_book(&mut conn, market_id, outcome).await
    }

    async fn persist_submit(
        &self,
        batch: &SubmitBatch,
        audit: &dyn AuditSink,
    ) -> Result<(), StoreError> {
        // Stream appends are not transactional; remember which trades are
        // already logged so a serialization retry cannot double-log them.
        let appended: Mutex<HashSet<TradeId>> = Mutex::new(HashSet::new());
        let appended = &appended;
        self.gateway
            .run_transaction(|conn| {
                Box::pin(async move {
                    // Liveness re-read under the transaction, guarding
                    // against a resolution racing the submit
                    let market = markets::fetch_market_for_update(conn, batch.taker.market_id)
                        .await?
                        .ok_or(StoreError::MarketNotTradable(NotTradableReason::NotFound))?;
                    market
                        .check_tradable(batch.timestamp)
                        .map_err(StoreError::MarketNotTradable)?;

                    // Taker row enters OPEN, then receives its fill
                    let mut accepted = batch.taker.clone();
                    accepted.filled_quantity = types::numeric::Quantity::zero();
                    accepted.status = OrderStatus::Open;
                    orders::insert_order(conn, &accepted).await?;
                    if batch.taker.status != OrderStatus::Open {
                        orders::set_order_fill(
                            conn,
                            batch.taker.id,
                            batch.taker.filled_quantity,
                            batch.taker.status,
                        )
                        .await?;
                    }

                    for trade in &batch.trades {
                        trades::insert_trade(conn, trade).await?;
                    }
                    for update in &batch.maker_updates {
                        orders::apply_maker_remaining(conn, update.order_id, update.new_remaining)
                            .await?;
                    }

                    for delta in &batch.deltas {
                        let mut position = positions::fetch_position(
                            conn,
                            batch.taker.market_id,
                            &delta.user_address,
                        )
                        .await?
                        .unwrap_or_else(|| {
                            Position::new(
                                batch.taker.market_id,
                                delta.user_address.clone(),
                                batch.timestamp,
                            )
                        });
                        apply_delta(&mut position, delta, batch.timestamp);
                        positions::upsert_position(conn, &position).await?;
                    }

                    // Fail-closed: an audit failure aborts the whole
                    // submission so no trade commits unlogged
                    for trade in &batch.trades {
                        let already_logged = appended
                            .lock()
                            .expect("audit dedup lock poisoned")
                            .contains(&trade.id);
                        if already_logged {
                            continue;
                        }
                        audit.append(trade).await.map_err(audit_unavailable)?;
                        appended
                            .lock()
                            .expect("audit dedup lock poisoned")
                            .insert(trade.id);
                    }
                    Ok(())
                })
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryState {
    markets: HashMap<MarketId, Market>,
    orders: HashMap<OrderId, Order>,
    trades: Vec<Trade>,
    positions: HashMap<(MarketId, UserAddress), Position>,
}

/// Store for tests and local development; mirrors the transactional
/// semantics by staging all writes and applying them only after the
/// audit appends succeed.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_market(&self, market: Market) {
        self.state
            .lock()
            .expect("memory store lock poisoned")
            .markets
            .insert(market.id, market);
    }

    /// Swap a market row (test hook for resolution races).
    pub fn update_market(&self, market: Market) {
        self.insert_market(market);
    }

    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        self.state
            .lock()
            .expect("memory store lock poisoned")
            .orders
            .get(&order_id)
            .cloned()
    }

    pub fn position(&self, market_id: MarketId, user: &UserAddress) -> Option<Position> {
        self.state
            .lock()
            .expect("memory store lock poisoned")
            .positions
            .get(&(market_id, user.clone()))
            .cloned()
    }

    pub fn trades(&self) -> Vec<Trade> {
        self.state
            .lock()
            .expect("memory store lock poisoned")
            .trades
            .clone()
    }
}

#[async_trait]
impl SubmitStore for MemoryStore {
    async fn fetch_market(&self, market_id: MarketId) -> Result<Option<Market>, StoreError> {
        Ok(self
            .state
            .lock()
            .expect("memory store lock poisoned")
            .markets
            .get(&market_id)
            .cloned())
    }

    async fn open_orders(
        &self,
        market_id: MarketId,
        outcome: Outcome,
    ) -> Result<Vec<Order>, StoreError> {
        let state = self.state.lock().expect("memory store lock poisoned");
        let mut open: Vec<Order> = state
            .orders
            .values()
            .filter(|o| {
                o.market_id == market_id
                    && o.outcome == outcome
                    && matches!(o.status, OrderStatus::Open | OrderStatus::PartiallyFilled)
            })
            .cloned()
            .collect();
        open.sort_by_key(|o| o.created_at);
        Ok(open)
    }

    async fn persist_submit(
        &self,
        batch: &SubmitBatch,
        audit: &dyn AuditSink,
    ) -> Result<(), StoreError> {
        // Stage every row mutation first
        let staged_positions: Vec<Position> = {
            let state = self.state.lock().expect("memory store lock poisoned");

            let market = state
                .markets
                .get(&batch.taker.market_id)
                .ok_or(StoreError::MarketNotTradable(NotTradableReason::NotFound))?;
            market
                .check_tradable(batch.timestamp)
                .map_err(StoreError::MarketNotTradable)?;

            batch
                .deltas
                .iter()
                .map(|delta| {
                    let mut position = state
                        .positions
                        .get(&(batch.taker.market_id, delta.user_address.clone()))
                        .cloned()
                        .unwrap_or_else(|| {
                            Position::new(
                                batch.taker.market_id,
                                delta.user_address.clone(),
                                batch.timestamp,
                            )
                        });
                    apply_delta(&mut position, delta, batch.timestamp);
                    position
                })
                .collect()
        };

        // Audit before commit: a failure leaves the store untouched
        for trade in &batch.trades {
            audit.append(trade).await.map_err(audit_unavailable)?;
        }

        let mut state = self.state.lock().expect("memory store lock poisoned");
        state.orders.insert(batch.taker.id, batch.taker.clone());
        for update in &batch.maker_updates {
            if let Some(maker) = state.orders.get_mut(&update.order_id) {
                let fill = maker.remaining() - update.new_remaining;
                maker.add_fill(fill);
            }
        }
        state.trades.extend(batch.trades.iter().cloned());
        for position in staged_positions {
            state
                .positions
                .insert((position.market_id, position.user_address.clone()), position);
        }
        Ok(())
    }
}
