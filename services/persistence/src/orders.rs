//! Order rows

use rust_decimal::Decimal;
use sqlx::{PgConnection, Row};
use types::ids::{MarketId, OrderId, UserAddress};
use types::market::Outcome;
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, Side};

use crate::gateway::StoreError;

/// Insert a freshly accepted order.
pub async fn insert_order(conn: &mut PgConnection, order: &Order) -> Result<(), StoreError> {
    sqlx::query(
        r"
        INSERT INTO orders (
            id, market_id, user_address, side, outcome, price,
            quantity, filled_quantity, status, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ",
    )
    .bind(order.id.as_uuid())
    .bind(order.market_id.as_uuid())
    .bind(order.user_address.as_str())
    .bind(order.side.as_str())
    .bind(order.outcome.as_str())
    .bind(order.price.as_decimal())
    .bind(order.quantity.get() as i64)
    .bind(order.filled_quantity.get() as i64)
    .bind(order.status.as_str())
    .bind(order.created_at)
    .execute(conn)
    .await?;
    tracing::debug!(order_id = %order.id, "order persisted");
    Ok(())
}

/// Set an order's absolute filled quantity and status.
///
/// The submit path computes the final fill under the matching lock, so
/// the write is an absolute assignment rather than an increment.
pub async fn set_order_fill(
    conn: &mut PgConnection,
    order_id: OrderId,
    filled_quantity: Quantity,
    status: OrderStatus,
) -> Result<(), StoreError> {
    sqlx::query(
        r"
        UPDATE orders SET filled_quantity = $2, status = $3
        WHERE id = $1
        ",
    )
    .bind(order_id.as_uuid())
    .bind(filled_quantity.get() as i64)
    .bind(status.as_str())
    .execute(conn)
    .await?;
    Ok(())
}

/// Credit a maker fill by its post-match remainder.
///
/// `filled_quantity` is derived from the quantity column so the write
/// needs no prior read; status follows from whether anything remains.
pub async fn apply_maker_remaining(
    conn: &mut PgConnection,
    order_id: OrderId,
    new_remaining: Quantity,
) -> Result<(), StoreError> {
    sqlx::query(
        r"
        UPDATE orders SET
            filled_quantity = quantity - $2,
            status = CASE WHEN $2 = 0 THEN 'FILLED' ELSE 'PARTIALLY_FILLED' END
        WHERE id = $1
        ",
    )
    .bind(order_id.as_uuid())
    .bind(new_remaining.get() as i64)
    .execute(conn)
    .await?;
    Ok(())
}

/// Open interest for one (market, outcome) in creation order, for book
/// rebuilds.
pub async fn open_orders_for_book(
    conn: &mut PgConnection,
    market_id: MarketId,
    outcome: Outcome,
) -> Result<Vec<Order>, StoreError> {
    let rows = sqlx::query(
        r"
        SELECT id, market_id, user_address, side, outcome, price,
               quantity, filled_quantity, status, created_at
        FROM orders
        WHERE market_id = $1
          AND outcome = $2
          AND status IN ('OPEN', 'PARTIALLY_FILLED')
        ORDER BY created_at ASC
        ",
    )
    .bind(market_id.as_uuid())
    .bind(outcome.as_str())
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(map_order_row).collect()
}

fn map_order_row(row: sqlx::postgres::PgRow) -> Result<Order, StoreError> {
    let side_text: String = row.get("side");
    let outcome_text: String = row.get("outcome");
    let status_text: String = row.get("status");

    let price: Decimal = row.get("price");
    let quantity: i64 = row.get("quantity");
    let filled: i64 = row.get("filled_quantity");
    if quantity < 0 || filled < 0 {
        return Err(StoreError::Corrupt("negative quantity column".into()));
    }

    Ok(Order {
        id: OrderId::from_uuid(row.get("id")),
        market_id: MarketId::from_uuid(row.get("market_id")),
        user_address: UserAddress::new(row.get::<String, _>("user_address")),
        side: Side::parse(&side_text)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown side {side_text:?}")))?,
        outcome: Outcome::parse(&outcome_text)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown outcome {outcome_text:?}")))?,
        price: Price::try_new(price.normalize())
            .ok_or_else(|| StoreError::Corrupt(format!("price {price} out of range")))?,
        quantity: Quantity::new(quantity as u64),
        filled_quantity: Quantity::new(filled as u64),
        status: OrderStatus::parse(&status_text)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown order status {status_text:?}")))?,
        created_at: row.get("created_at"),
    })
}
