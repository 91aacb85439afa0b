//! Price level implementation with FIFO queue
//!
//! A price level contains all resting orders at a specific price point.
//! Orders are kept in arrival order to enforce time priority: two makers
//! at the same price are always served oldest first.

use std::collections::VecDeque;
use types::ids::{OrderId, UserAddress};
use types::numeric::{Price, Quantity};

/// A resting order as the book sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct RestingOrder {
    pub order_id: OrderId,
    pub user_address: UserAddress,
    pub price: Price,
    pub remaining: Quantity,
}

/// All orders resting at one price, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<RestingOrder>,
    total_quantity: Quantity,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an order at the back of the queue (time priority).
    pub fn push_back(&mut self, order: RestingOrder) {
        self.total_quantity = self.total_quantity + order.remaining;
        self.orders.push_back(order);
    }

    /// Remove an order by id, returning it if present.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<RestingOrder> {
        let position = self
            .orders
            .iter()
            .position(|entry| &entry.order_id == order_id)?;
        let entry = self.orders.remove(position)?;
        self.total_quantity = self.total_quantity - entry.remaining;
        Some(entry)
    }

    /// Look up an order by id.
    pub fn get(&self, order_id: &OrderId) -> Option<&RestingOrder> {
        self.orders.iter().find(|entry| &entry.order_id == order_id)
    }

    /// Oldest order at this level.
    pub fn front(&self) -> Option<&RestingOrder> {
        self.orders.front()
    }

    /// Set the remaining quantity of an order, keeping the aggregate in
    /// step. The caller removes the order instead when the new quantity
    /// is zero.
    pub fn set_remaining(&mut self, order_id: &OrderId, new_remaining: Quantity) -> bool {
        if let Some(entry) = self
            .orders
            .iter_mut()
            .find(|entry| &entry.order_id == order_id)
        {
            self.total_quantity = self.total_quantity - entry.remaining + new_remaining;
            entry.remaining = new_remaining;
            true
        } else {
            false
        }
    }

    /// Arrival-ordered iteration.
    pub fn iter(&self) -> impl Iterator<Item = &RestingOrder> {
        self.orders.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}
