//! Per-(market, user) position tracking
//!
//! One row per (market, user). Share counts per outcome, volume-weighted
//! average entry prices, and the collateral locked against open exposure.

use crate::ids::{MarketId, UserAddress};
use crate::market::Outcome;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A user's holdings in one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub market_id: MarketId,
    pub user_address: UserAddress,
    pub yes_shares: i64,
    pub no_shares: i64,
    /// Volume-weighted average buy price per outcome; 0 when flat.
    pub yes_avg_price: Decimal,
    pub no_avg_price: Decimal,
    pub locked_collateral: Decimal,
    pub is_settled: bool,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// Fresh empty position, created on a user's first trade in a market.
    pub fn new(market_id: MarketId, user_address: UserAddress, now: DateTime<Utc>) -> Self {
        Self {
            market_id,
            user_address,
            yes_shares: 0,
            no_shares: 0,
            yes_avg_price: Decimal::ZERO,
            no_avg_price: Decimal::ZERO,
            locked_collateral: Decimal::ZERO,
            is_settled: false,
            updated_at: now,
        }
    }

    pub fn shares(&self, outcome: Outcome) -> i64 {
        match outcome {
            Outcome::Yes => self.yes_shares,
            Outcome::No => self.no_shares,
        }
    }

    pub fn set_shares(&mut self, outcome: Outcome, shares: i64) {
        match outcome {
            Outcome::Yes => self.yes_shares = shares,
            Outcome::No => self.no_shares = shares,
        }
    }

    pub fn avg_price(&self, outcome: Outcome) -> Decimal {
        match outcome {
            Outcome::Yes => self.yes_avg_price,
            Outcome::No => self.no_avg_price,
        }
    }

    pub fn set_avg_price(&mut self, outcome: Outcome, avg: Decimal) {
        match outcome {
            Outcome::Yes => self.yes_avg_price = avg,
            Outcome::No => self.no_avg_price = avg,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.yes_shares == 0 && self.no_shares == 0
    }
}
