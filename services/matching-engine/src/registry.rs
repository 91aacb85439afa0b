//! Book registry — process-wide map of live order books
//!
//! One book per (market, outcome), each behind its own async mutex. The
//! mutex is the matching lock: holding it for the duration of a matching
//! pass and the subsequent book mutation gives a total order over matches
//! on that book, so two takers can never consume the same resting maker.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use types::ids::MarketId;
use types::market::Outcome;
use types::order::Order;

use crate::book::{BookError, OrderBook};

/// Registry of order books keyed by (market, outcome).
///
/// Initialized once at startup and shared by all submit tasks.
#[derive(Debug, Default)]
pub struct BookRegistry {
    books: DashMap<(MarketId, Outcome), Arc<Mutex<OrderBook>>>,
}

impl BookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the book for (market, outcome), creating an empty one on first
    /// access.
    pub fn get(&self, market_id: MarketId, outcome: Outcome) -> Arc<Mutex<OrderBook>> {
        self.books
            .entry((market_id, outcome))
            .or_insert_with(|| Arc::new(Mutex::new(OrderBook::new(market_id, outcome))))
            .clone()
    }

    /// Whether a book has been materialized for (market, outcome).
    pub fn contains(&self, market_id: MarketId, outcome: Outcome) -> bool {
        self.books.contains_key(&(market_id, outcome))
    }

    /// Rebuild a book from the durable store's open orders.
    ///
    /// `open_orders` must be the OPEN / PARTIALLY_FILLED rows for this
    /// (market, outcome) in creation order, so time priority is restored
    /// exactly.
    pub fn rebuild(
        &self,
        market_id: MarketId,
        outcome: Outcome,
        open_orders: &[Order],
    ) -> Result<Arc<Mutex<OrderBook>>, BookError> {
        let shared = Arc::new(Mutex::new(Self::build(market_id, outcome, open_orders)?));
        self.books.insert((market_id, outcome), shared.clone());
        Ok(shared)
    }

    /// Rebuild only if no book exists yet for (market, outcome).
    ///
    /// Two tasks racing to hydrate the same book resolve through the map
    /// entry: the loser discards its rebuild and adopts the winner's
    /// book, so there is never more than one live book per key.
    pub fn rebuild_if_absent(
        &self,
        market_id: MarketId,
        outcome: Outcome,
        open_orders: &[Order],
    ) -> Result<Arc<Mutex<OrderBook>>, BookError> {
        use dashmap::mapref::entry::Entry;
        match self.books.entry((market_id, outcome)) {
            Entry::Occupied(existing) => Ok(existing.get().clone()),
            Entry::Vacant(vacant) => {
                let shared = Arc::new(Mutex::new(Self::build(market_id, outcome, open_orders)?));
                vacant.insert(shared.clone());
                Ok(shared)
            }
        }
    }

    fn build(
        market_id: MarketId,
        outcome: Outcome,
        open_orders: &[Order],
    ) -> Result<OrderBook, BookError> {
        let mut book = OrderBook::new(market_id, outcome);
        for order in open_orders {
            book.add(order)?;
        }
        Ok(book)
    }

    /// Drop a book (market removal).
    pub fn evict(&self, market_id: MarketId, outcome: Outcome) {
        self.books.remove(&(market_id, outcome));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use types::ids::{OrderId, UserAddress};
    use types::numeric::{Price, Quantity};
    use types::order::Side;

    fn open_order(market_id: MarketId, price: &str, qty: u64, minute: u32) -> Order {
        Order::new(
            OrderId::new(),
            market_id,
            UserAddress::new("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
            Side::Buy,
            Outcome::Yes,
            Price::from_str(price).unwrap(),
            Quantity::new(qty),
            Utc.with_ymd_and_hms(2024, 2, 16, 12, minute, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_get_creates_once() {
        let registry = BookRegistry::new();
        let market_id = MarketId::new();

        let first = registry.get(market_id, Outcome::Yes);
        let second = registry.get(market_id, Outcome::Yes);
        assert!(Arc::ptr_eq(&first, &second));

        // Different outcome gets its own book
        let other = registry.get(market_id, Outcome::No);
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[tokio::test]
    async fn test_rebuild_restores_depth() {
        let registry = BookRegistry::new();
        let market_id = MarketId::new();
        let orders = vec![
            open_order(market_id, "0.60", 100, 0),
            open_order(market_id, "0.60", 50, 1),
            open_order(market_id, "0.58", 25, 2),
        ];

        let book = registry.rebuild(market_id, Outcome::Yes, &orders).unwrap();
        let book = book.lock().await;
        let depth = book.depth(10);
        assert_eq!(depth.bids.len(), 2);
        assert_eq!(depth.bids[0].total_quantity, Quantity::new(150));
        assert_eq!(depth.bids[0].order_count, 2);
        // Time priority restored: the minute-0 order is first at the level
        assert_eq!(book.best_bid().unwrap().order_id, orders[0].id);
    }

    #[tokio::test]
    async fn test_evict_removes_book() {
        let registry = BookRegistry::new();
        let market_id = MarketId::new();
        registry.get(market_id, Outcome::Yes);
        assert!(registry.contains(market_id, Outcome::Yes));

        registry.evict(market_id, Outcome::Yes);
        assert!(!registry.contains(market_id, Outcome::Yes));
    }
}
