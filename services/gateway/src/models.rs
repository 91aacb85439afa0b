//! Request and response bodies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signing::Receipt;
use types::ids::{MarketId, OrderId};
use types::market::Outcome;
use types::numeric::{Price, Quantity};
use types::order::{OrderStatus, Side};
use types::trade::Trade;

/// `POST /orders` body. The authenticated address arrives in a header.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateOrderRequest {
    pub market_id: MarketId,
    pub side: Side,
    pub outcome: Outcome,
    /// JSON number; bounds-checked by the validator.
    pub price: f64,
    pub quantity: u64,
}

/// `201` response: the signed receipt, flattened.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub market_id: MarketId,
    pub side: Side,
    pub outcome: Outcome,
    pub price: Price,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub status: OrderStatus,
    pub trades: Vec<Trade>,
    pub timestamp: DateTime<Utc>,
    pub signature: String,
}

impl OrderResponse {
    pub fn from_receipt(receipt: Receipt, signature: String) -> Self {
        Self {
            order_id: receipt.order_id,
            market_id: receipt.market_id,
            side: receipt.side,
            outcome: receipt.outcome,
            price: receipt.price,
            quantity: receipt.quantity,
            filled_quantity: receipt.filled_quantity,
            status: receipt.status,
            trades: receipt.trades,
            timestamp: receipt.timestamp,
            signature,
        }
    }
}

/// Query for book depth.
#[derive(Debug, Clone, Deserialize)]
pub struct DepthQuery {
    #[serde(default = "default_depth")]
    pub depth: usize,
    #[serde(default = "default_outcome")]
    pub outcome: Outcome,
}

fn default_depth() -> usize {
    10
}

fn default_outcome() -> Outcome {
    Outcome::Yes
}

/// Query for audit reads.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_order_request_parses() {
        let market_id = MarketId::new();
        let body = format!(
            r#"{{"marketId":"{market_id}","side":"BUY","outcome":"YES","price":0.6,"quantity":100}}"#
        );
        let req: CreateOrderRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(req.market_id, market_id);
        assert_eq!(req.side, Side::Buy);
        assert_eq!(req.outcome, Outcome::Yes);
        assert_eq!(req.quantity, 100);
    }

    #[test]
    fn test_create_order_request_rejects_bad_enums() {
        let market_id = MarketId::new();
        let body = format!(
            r#"{{"marketId":"{market_id}","side":"HOLD","outcome":"YES","price":0.6,"quantity":100}}"#
        );
        assert!(serde_json::from_str::<CreateOrderRequest>(&body).is_err());

        // Negative quantity fails at the type boundary
        let body = format!(
            r#"{{"marketId":"{market_id}","side":"BUY","outcome":"YES","price":0.6,"quantity":-5}}"#
        );
        assert!(serde_json::from_str::<CreateOrderRequest>(&body).is_err());
    }
}
