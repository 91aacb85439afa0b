//! Binary market lifecycle types

use crate::errors::NotTradableReason;
use crate::ids::{MarketId, UserAddress};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the two sides of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Yes => "YES",
            Outcome::No => "NO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "YES" => Some(Outcome::Yes),
            "NO" => Some(Outcome::No),
            _ => None,
        }
    }
}

/// Market lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketStatus {
    Active,
    Resolved,
    Cancelled,
}

impl MarketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketStatus::Active => "ACTIVE",
            MarketStatus::Resolved => "RESOLVED",
            MarketStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(MarketStatus::Active),
            "RESOLVED" => Some(MarketStatus::Resolved),
            "CANCELLED" => Some(MarketStatus::Cancelled),
            _ => None,
        }
    }
}

/// A binary prediction market.
///
/// Orders are only accepted while the market is ACTIVE and before
/// `end_time`. Resolution is performed externally by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub question: String,
    pub end_time: DateTime<Utc>,
    pub oracle_address: UserAddress,
    pub status: MarketStatus,
    /// Winning outcome, set once status becomes RESOLVED.
    pub outcome: Option<Outcome>,
    pub created_at: DateTime<Utc>,
}

impl Market {
    pub fn new(
        question: impl Into<String>,
        end_time: DateTime<Utc>,
        oracle_address: UserAddress,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MarketId::new(),
            question: question.into(),
            end_time,
            oracle_address,
            status: MarketStatus::Active,
            outcome: None,
            created_at,
        }
    }

    /// Check that the market can accept orders at `now`.
    pub fn check_tradable(&self, now: DateTime<Utc>) -> Result<(), NotTradableReason> {
        match self.status {
            MarketStatus::Resolved => return Err(NotTradableReason::Resolved),
            MarketStatus::Cancelled => return Err(NotTradableReason::Cancelled),
            MarketStatus::Active => {}
        }
        if now >= self.end_time {
            return Err(NotTradableReason::Ended);
        }
        Ok(())
    }
}
