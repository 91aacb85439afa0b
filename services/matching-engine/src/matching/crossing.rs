//! Crossing detection logic
//!
//! Determines when a taker can trade against a resting maker based on
//! price compatibility.

use types::numeric::Price;
use types::order::Side;

/// Check whether an incoming order crosses a resting order's price.
///
/// A BUY crosses any maker asking at or below its limit; a SELL crosses
/// any maker bidding at or above its limit.
pub fn crosses(taker_side: Side, taker_price: Price, maker_price: Price) -> bool {
    match taker_side {
        Side::Buy => taker_price >= maker_price,
        Side::Sell => taker_price <= maker_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(s: &str) -> Price {
        Price::from_str(s).unwrap()
    }

    #[test]
    fn test_buy_crosses_lower_ask() {
        assert!(crosses(Side::Buy, price("0.60"), price("0.55")));
    }

    #[test]
    fn test_equal_prices_cross() {
        assert!(crosses(Side::Buy, price("0.55"), price("0.55")));
        assert!(crosses(Side::Sell, price("0.55"), price("0.55")));
    }

    #[test]
    fn test_buy_below_ask_no_cross() {
        assert!(!crosses(Side::Buy, price("0.60"), price("0.70")));
    }

    #[test]
    fn test_sell_crosses_higher_bid() {
        assert!(crosses(Side::Sell, price("0.55"), price("0.60")));
        assert!(!crosses(Side::Sell, price("0.65"), price("0.60")));
    }
}
