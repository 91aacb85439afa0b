//! Trade execution types
//!
//! A trade is the atomic exchange between one resting maker order and the
//! incoming taker. The execution price is always the maker's posted price.

use crate::ids::{MarketId, OrderId, TradeId, UserAddress};
use crate::market::Outcome;
use crate::numeric::{notional, Price, Quantity};
use crate::order::Side;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An executed trade between a maker and a taker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub market_id: MarketId,
    pub outcome: Outcome,
    /// Execution price: the maker's posted price.
    pub price: Price,
    pub quantity: Quantity,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub maker_address: UserAddress,
    pub taker_address: UserAddress,
    /// Side of the taker; determines which party bought.
    pub taker_side: Side,
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TradeId,
        market_id: MarketId,
        outcome: Outcome,
        price: Price,
        quantity: Quantity,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        maker_address: UserAddress,
        taker_address: UserAddress,
        taker_side: Side,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            market_id,
            outcome,
            price,
            quantity,
            maker_order_id,
            taker_order_id,
            maker_address,
            taker_address,
            taker_side,
            executed_at,
        }
    }

    /// Address of the BUY side.
    pub fn buyer_address(&self) -> &UserAddress {
        match self.taker_side {
            Side::Buy => &self.taker_address,
            Side::Sell => &self.maker_address,
        }
    }

    /// Address of the SELL side.
    pub fn seller_address(&self) -> &UserAddress {
        match self.taker_side {
            Side::Buy => &self.maker_address,
            Side::Sell => &self.taker_address,
        }
    }

    /// Order id of the BUY side.
    pub fn buy_order_id(&self) -> OrderId {
        match self.taker_side {
            Side::Buy => self.taker_order_id,
            Side::Sell => self.maker_order_id,
        }
    }

    /// Order id of the SELL side.
    pub fn sell_order_id(&self) -> OrderId {
        match self.taker_side {
            Side::Buy => self.maker_order_id,
            Side::Sell => self.taker_order_id,
        }
    }

    /// Collateral moved by this trade (price × quantity).
    pub fn notional(&self) -> Decimal {
        notional(self.price, self.quantity)
    }

    /// A trade may never match a user with themselves.
    pub fn validate_no_self_trade(&self) -> bool {
        self.maker_address != self.taker_address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::prelude::FromStr;

    fn sample_trade(taker_side: Side) -> Trade {
        Trade::new(
            TradeId::new(),
            MarketId::new(),
            Outcome::Yes,
            Price::from_str("0.55").unwrap(),
            Quantity::new(100),
            OrderId::new(),
            OrderId::new(),
            UserAddress::new("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
            UserAddress::new("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"),
            taker_side,
            Utc.with_ymd_and_hms(2024, 2, 16, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_buyer_seller_for_buy_taker() {
        let trade = sample_trade(Side::Buy);
        assert_eq!(trade.buyer_address(), &trade.taker_address);
        assert_eq!(trade.seller_address(), &trade.maker_address);
        assert_eq!(trade.buy_order_id(), trade.taker_order_id);
        assert_eq!(trade.sell_order_id(), trade.maker_order_id);
    }

    #[test]
    fn test_buyer_seller_for_sell_taker() {
        let trade = sample_trade(Side::Sell);
        assert_eq!(trade.buyer_address(), &trade.maker_address);
        assert_eq!(trade.seller_address(), &trade.taker_address);
        assert_eq!(trade.buy_order_id(), trade.maker_order_id);
        assert_eq!(trade.sell_order_id(), trade.taker_order_id);
    }

    #[test]
    fn test_trade_notional() {
        let trade = sample_trade(Side::Buy);
        assert_eq!(trade.notional(), Decimal::from_str("55").unwrap());
    }

    #[test]
    fn test_no_self_trade_check() {
        let mut trade = sample_trade(Side::Buy);
        assert!(trade.validate_no_self_trade());
        trade.taker_address = trade.maker_address.clone();
        assert!(!trade.validate_no_self_trade());
    }

    #[test]
    fn test_trade_serialization_roundtrip() {
        let trade = sample_trade(Side::Sell);
        let json = serde_json::to_string(&trade).unwrap();
        let restored: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, restored);
    }
}
