//! Order lifecycle types
//!
//! An order moves OPEN → (PARTIALLY_FILLED)* → FILLED | CANCELLED.
//! Only OPEN and PARTIALLY_FILLED orders are resident in an order book.

use crate::ids::{MarketId, OrderId, UserAddress};
use crate::market::Outcome;
use crate::numeric::{Price, Quantity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(Side::Buy),
            "SELL" => Some(Side::Sell),
            _ => None,
        }
    }
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "OPEN",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(OrderStatus::Open),
            "PARTIALLY_FILLED" => Some(OrderStatus::PartiallyFilled),
            "FILLED" => Some(OrderStatus::Filled),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// A limit order on one outcome of a binary market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub market_id: MarketId,
    pub user_address: UserAddress,
    pub side: Side,
    pub outcome: Outcome,
    pub price: Price,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new open order.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderId,
        market_id: MarketId,
        user_address: UserAddress,
        side: Side,
        outcome: Outcome,
        price: Price,
        quantity: Quantity,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            market_id,
            user_address,
            side,
            outcome,
            price,
            quantity,
            filled_quantity: Quantity::zero(),
            status: OrderStatus::Open,
            created_at,
        }
    }

    /// Unfilled remainder.
    pub fn remaining(&self) -> Quantity {
        self.quantity - self.filled_quantity
    }

    pub fn is_filled(&self) -> bool {
        self.filled_quantity == self.quantity
    }

    pub fn has_fills(&self) -> bool {
        !self.filled_quantity.is_zero()
    }

    /// Status consistency: FILLED ⇔ fully filled, PARTIALLY_FILLED ⇔ some
    /// fills, OPEN ⇔ none.
    pub fn check_invariant(&self) -> bool {
        self.filled_quantity <= self.quantity
            && match self.status {
                OrderStatus::Open => self.filled_quantity.is_zero(),
                OrderStatus::PartiallyFilled => self.has_fills() && !self.is_filled(),
                OrderStatus::Filled => self.is_filled(),
                OrderStatus::Cancelled => true,
            }
    }

    /// Record a fill and adjust status.
    ///
    /// # Panics
    /// Panics if the fill would exceed the order quantity.
    pub fn add_fill(&mut self, fill_quantity: Quantity) {
        let new_filled = self.filled_quantity + fill_quantity;
        assert!(
            new_filled <= self.quantity,
            "Fill would exceed order quantity"
        );

        self.filled_quantity = new_filled;
        if self.is_filled() {
            self.status = OrderStatus::Filled;
        } else if self.has_fills() {
            self.status = OrderStatus::PartiallyFilled;
        }

        assert!(self.check_invariant(), "Invariant violated after fill");
    }
}
