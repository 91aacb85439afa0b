//! Two-sided order book for one (market, outcome)
//!
//! Price levels are kept in `BTreeMap`s for deterministic iteration:
//! bids keyed by `Reverse<Price>` (highest first), asks by `Price`
//! (lowest first). An auxiliary `HashMap<OrderId, (Side, Price)>` locates
//! any resting order without scanning, and a per-user index tracks which
//! orders each address has resting.
//!
//! Insertion and removal are O(log P) in the number of distinct price
//! levels; best-price access reads the first tree entry; `depth(n)` walks
//! the top n levels per side.

use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;
use types::ids::{MarketId, OrderId, UserAddress};
use types::market::Outcome;
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

use super::price_level::{PriceLevel, RestingOrder};

/// Book failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("Order {0} already resting in book")]
    DuplicateOrder(OrderId),

    #[error("Order for market {order_market} / {order_outcome:?} does not belong to book {book_market} / {book_outcome:?}")]
    BookMismatch {
        book_market: MarketId,
        book_outcome: Outcome,
        order_market: MarketId,
        order_outcome: Outcome,
    },
}

/// One aggregated depth row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthLevel {
    pub price: Price,
    pub total_quantity: Quantity,
    pub order_count: usize,
}

/// Top-n aggregated levels per side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Depth {
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

/// In-memory book of resting orders for one (market, outcome).
///
/// The book is a cache of the durable store's OPEN / PARTIALLY_FILLED
/// rows and is rebuildable from them at any time.
#[derive(Debug)]
pub struct OrderBook {
    market_id: MarketId,
    outcome: Outcome,
    /// Bid levels, best (highest) price first.
    bids: BTreeMap<Reverse<Price>, PriceLevel>,
    /// Ask levels, best (lowest) price first.
    asks: BTreeMap<Price, PriceLevel>,
    /// Fast lookup: order id -> (side, price).
    index: HashMap<OrderId, (Side, Price)>,
    /// Resting order ids per user.
    by_user: HashMap<UserAddress, HashSet<OrderId>>,
}

impl OrderBook {
    pub fn new(market_id: MarketId, outcome: Outcome) -> Self {
        Self {
            market_id,
            outcome,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
            by_user: HashMap::new(),
        }
    }

    pub fn market_id(&self) -> MarketId {
        self.market_id
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Rest an order's unfilled remainder in the book.
    pub fn add(&mut self, order: &Order) -> Result<(), BookError> {
        if order.market_id != self.market_id || order.outcome != self.outcome {
            return Err(BookError::BookMismatch {
                book_market: self.market_id,
                book_outcome: self.outcome,
                order_market: order.market_id,
                order_outcome: order.outcome,
            });
        }
        if self.index.contains_key(&order.id) {
            return Err(BookError::DuplicateOrder(order.id));
        }

        let entry = RestingOrder {
            order_id: order.id,
            user_address: order.user_address.clone(),
            price: order.price,
            remaining: order.remaining(),
        };
        self.index.insert(order.id, (order.side, order.price));
        self.by_user
            .entry(order.user_address.clone())
            .or_default()
            .insert(order.id);

        match order.side {
            Side::Buy => self
                .bids
                .entry(Reverse(order.price))
                .or_default()
                .push_back(entry),
            Side::Sell => self.asks.entry(order.price).or_default().push_back(entry),
        }
        Ok(())
    }

    /// Remove an order from the book, deleting its level if it empties.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<RestingOrder> {
        let (side, price) = self.index.remove(order_id)?;
        let removed = match side {
            Side::Buy => {
                let level = self.bids.get_mut(&Reverse(price))?;
                let removed = level.remove(order_id);
                if level.is_empty() {
                    self.bids.remove(&Reverse(price));
                }
                removed
            }
            Side::Sell => {
                let level = self.asks.get_mut(&price)?;
                let removed = level.remove(order_id);
                if level.is_empty() {
                    self.asks.remove(&price);
                }
                removed
            }
        }?;

        if let Some(ids) = self.by_user.get_mut(&removed.user_address) {
            ids.remove(order_id);
            if ids.is_empty() {
                self.by_user.remove(&removed.user_address);
            }
        }
        Some(removed)
    }

    /// Set an order's remaining quantity; zero removes it from the book.
    ///
    /// Returns true if the order was found.
    pub fn update_quantity(&mut self, order_id: &OrderId, new_quantity: Quantity) -> bool {
        if new_quantity.is_zero() {
            return self.remove(order_id).is_some();
        }
        let Some(&(side, price)) = self.index.get(order_id) else {
            return false;
        };
        match side {
            Side::Buy => self
                .bids
                .get_mut(&Reverse(price))
                .is_some_and(|level| level.set_remaining(order_id, new_quantity)),
            Side::Sell => self
                .asks
                .get_mut(&price)
                .is_some_and(|level| level.set_remaining(order_id, new_quantity)),
        }
    }

    /// Oldest order at the highest bid price.
    pub fn best_bid(&self) -> Option<&RestingOrder> {
        self.bids.values().next().and_then(PriceLevel::front)
    }

    /// Oldest order at the lowest ask price.
    pub fn best_ask(&self) -> Option<&RestingOrder> {
        self.asks.values().next().and_then(PriceLevel::front)
    }

    /// Look up a resting order by id.
    pub fn resting(&self, order_id: &OrderId) -> Option<&RestingOrder> {
        let &(side, price) = self.index.get(order_id)?;
        match side {
            Side::Buy => self.bids.get(&Reverse(price))?.get(order_id),
            Side::Sell => self.asks.get(&price)?.get(order_id),
        }
    }

    /// Ids of all orders a user has resting in this book.
    pub fn user_orders(&self, user: &UserAddress) -> Vec<OrderId> {
        self.by_user
            .get(user)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Top-n aggregated price levels per side.
    pub fn depth(&self, n: usize) -> Depth {
        let aggregate = |level: &PriceLevel, price: Price| DepthLevel {
            price,
            total_quantity: level.total_quantity(),
            order_count: level.order_count(),
        };
        Depth {
            bids: self
                .bids
                .iter()
                .take(n)
                .map(|(price, level)| aggregate(level, price.0))
                .collect(),
            asks: self
                .asks
                .iter()
                .take(n)
                .map(|(&price, level)| aggregate(level, price))
                .collect(),
        }
    }

    /// Lazy price-time-priority iteration over one side: best price
    /// outward, arrival order within a level.
    pub fn iter_side(&self, side: Side) -> Box<dyn Iterator<Item = &RestingOrder> + '_> {
        match side {
            Side::Buy => Box::new(self.bids.values().flat_map(PriceLevel::iter)),
            Side::Sell => Box::new(self.asks.values().flat_map(PriceLevel::iter)),
        }
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.index.contains_key(order_id)
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Total resting orders across both sides.
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    /// Distinct price levels on one side.
    pub fn level_count(&self, side: Side) -> usize {
        match side {
            Side::Buy => self.bids.len(),
            Side::Sell => self.asks.len(),
        }
    }
}
