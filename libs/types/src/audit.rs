//! Append-only audit entry types
//!
//! Every persisted trade produces one entry in its market stream and one
//! in the global stream. Entry ids are `<unix_millis>-<sequence>` and
//! strictly increase within a stream.

use crate::ids::{MarketId, OrderId, TradeId, UserAddress};
use crate::market::Outcome;
use crate::numeric::{Price, Quantity};
use crate::trade::Trade;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stream entry id: `<unix_millis>-<sequence>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId {
    pub millis: i64,
    pub sequence: u64,
}

impl EntryId {
    pub fn new(millis: i64, sequence: u64) -> Self {
        Self { millis, sequence }
    }

    /// Smallest id at or after the given millisecond (`<ts>-0`).
    pub fn range_start(millis: i64) -> Self {
        Self::new(millis, 0)
    }

    /// Largest id within the given millisecond (`<ts>-MAX`).
    pub fn range_end(millis: i64) -> Self {
        Self::new(millis, u64::MAX)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.millis, self.sequence)
    }
}

impl FromStr for EntryId {
    type Err = ParseEntryIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (millis, sequence) = s.split_once('-').ok_or(ParseEntryIdError)?;
        Ok(Self {
            millis: millis.parse().map_err(|_| ParseEntryIdError)?,
            sequence: sequence.parse().map_err(|_| ParseEntryIdError)?,
        })
    }
}

/// Malformed stream entry id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("entry id must be <unix_millis>-<sequence>")]
pub struct ParseEntryIdError;

impl Serialize for EntryId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Immutable audit record of one trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: EntryId,
    pub trade_id: TradeId,
    pub market_id: MarketId,
    pub outcome: Outcome,
    pub buyer_address: UserAddress,
    pub seller_address: UserAddress,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
    /// Execution time of the trade itself.
    pub timestamp: DateTime<Utc>,
    /// Time the entry was written to the stream.
    pub logged_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Build the audit record for a trade.
    pub fn from_trade(trade: &Trade, id: EntryId, logged_at: DateTime<Utc>) -> Self {
        Self {
            id,
            trade_id: trade.id,
            market_id: trade.market_id,
            outcome: trade.outcome,
            buyer_address: trade.buyer_address().clone(),
            seller_address: trade.seller_address().clone(),
            buy_order_id: trade.buy_order_id(),
            sell_order_id: trade.sell_order_id(),
            price: trade.price,
            quantity: trade.quantity,
            timestamp: trade.executed_at,
            logged_at,
        }
    }
}

/// Aggregate statistics for one audit stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub count: u64,
    pub oldest_id: Option<EntryId>,
    pub newest_id: Option<EntryId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Side;
    use chrono::TimeZone;

    #[test]
    fn test_entry_id_display_parse() {
        let id = EntryId::new(1708084800123, 7);
        assert_eq!(id.to_string(), "1708084800123-7");
        assert_eq!("1708084800123-7".parse::<EntryId>().unwrap(), id);
        assert!("not-an-id".parse::<EntryId>().is_err());
        assert!("12345".parse::<EntryId>().is_err());
    }

    #[test]
    fn test_entry_id_ordering() {
        let a = EntryId::new(100, 5);
        let b = EntryId::new(100, 6);
        let c = EntryId::new(101, 0);
        assert!(a < b);
        assert!(b < c);
        assert!(EntryId::range_start(100) <= a);
        assert!(EntryId::range_end(100) >= b);
    }

    #[test]
    fn test_audit_entry_from_trade() {
        let trade = Trade::new(
            TradeId::new(),
            MarketId::new(),
            Outcome::Yes,
            Price::from_str("0.55").unwrap(),
            Quantity::new(100),
            OrderId::new(),
            OrderId::new(),
            UserAddress::new("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
            UserAddress::new("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"),
            Side::Buy,
            Utc.with_ymd_and_hms(2024, 2, 16, 12, 0, 0).unwrap(),
        );
        let logged_at = Utc.with_ymd_and_hms(2024, 2, 16, 12, 0, 1).unwrap();
        let entry = AuditEntry::from_trade(&trade, EntryId::new(1708084801000, 0), logged_at);

        assert_eq!(entry.trade_id, trade.id);
        assert_eq!(&entry.buyer_address, trade.buyer_address());
        assert_eq!(&entry.seller_address, trade.seller_address());
        assert_eq!(entry.buy_order_id, trade.taker_order_id);
        assert_eq!(entry.sell_order_id, trade.maker_order_id);
        assert_eq!(entry.timestamp, trade.executed_at);
        assert_eq!(entry.logged_at, logged_at);
    }

    #[test]
    fn test_audit_entry_serialization_camel_case() {
        let trade = Trade::new(
            TradeId::new(),
            MarketId::new(),
            Outcome::No,
            Price::from_str("0.4").unwrap(),
            Quantity::new(10),
            OrderId::new(),
            OrderId::new(),
            UserAddress::new("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
            UserAddress::new("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"),
            Side::Sell,
            Utc.with_ymd_and_hms(2024, 2, 16, 12, 0, 0).unwrap(),
        );
        let entry = AuditEntry::from_trade(
            &trade,
            EntryId::new(1, 2),
            Utc.with_ymd_and_hms(2024, 2, 16, 12, 0, 1).unwrap(),
        );
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"tradeId\""));
        assert!(json.contains("\"buyerAddress\""));
        assert!(json.contains("\"loggedAt\""));
        assert!(json.contains("\"id\":\"1-2\""));

        let restored: AuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, restored);
    }
}
