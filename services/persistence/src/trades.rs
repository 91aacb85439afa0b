//! Trade rows — immutable once written

use sqlx::PgConnection;
use types::trade::Trade;

use crate::gateway::StoreError;

pub async fn insert_trade(conn: &mut PgConnection, trade: &Trade) -> Result<(), StoreError> {
    sqlx::query(
        r"
        INSERT INTO trades (
            id, market_id, outcome, price, quantity,
            maker_order_id, taker_order_id, maker_address, taker_address,
            taker_side, executed_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ",
    )
    .bind(trade.id.as_uuid())
    .bind(trade.market_id.as_uuid())
    .bind(trade.outcome.as_str())
    .bind(trade.price.as_decimal())
    .bind(trade.quantity.get() as i64)
    .bind(trade.maker_order_id.as_uuid())
    .bind(trade.taker_order_id.as_uuid())
    .bind(trade.maker_address.as_str())
    .bind(trade.taker_address.as_str())
    .bind(trade.taker_side.as_str())
    .bind(trade.executed_at)
    .execute(conn)
    .await?;
    tracing::debug!(trade_id = %trade.id, "trade persisted");
    Ok(())
}
