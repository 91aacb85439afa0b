//! Position rows — one per (market, user)

use rust_decimal::Decimal;
use sqlx::{PgConnection, Row};
use types::ids::{MarketId, UserAddress};
use types::position::Position;

use crate::gateway::StoreError;

/// Load a user's position in a market, if any.
pub async fn fetch_position(
    conn: &mut PgConnection,
    market_id: MarketId,
    user_address: &UserAddress,
) -> Result<Option<Position>, StoreError> {
    let row = sqlx::query(
        r"
        SELECT market_id, user_address, yes_shares, no_shares,
               yes_avg_price, no_avg_price, locked_collateral,
               is_settled, updated_at
        FROM user_positions
        WHERE market_id = $1 AND user_address = $2
        ",
    )
    .bind(market_id.as_uuid())
    .bind(user_address.as_str())
    .fetch_optional(conn)
    .await?;

    Ok(row.map(map_position_row))
}

/// Write a position's absolute state, inserting on first trade.
pub async fn upsert_position(
    conn: &mut PgConnection,
    position: &Position,
) -> Result<(), StoreError> {
    sqlx::query(
        r"
        INSERT INTO user_positions (
            market_id, user_address, yes_shares, no_shares,
            yes_avg_price, no_avg_price, locked_collateral,
            is_settled, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (market_id, user_address) DO UPDATE SET
            yes_shares = EXCLUDED.yes_shares,
            no_shares = EXCLUDED.no_shares,
            yes_avg_price = EXCLUDED.yes_avg_price,
            no_avg_price = EXCLUDED.no_avg_price,
            locked_collateral = EXCLUDED.locked_collateral,
            is_settled = EXCLUDED.is_settled,
            updated_at = EXCLUDED.updated_at
        ",
    )
    .bind(position.market_id.as_uuid())
    .bind(position.user_address.as_str())
    .bind(position.yes_shares)
    .bind(position.no_shares)
    .bind(position.yes_avg_price)
    .bind(position.no_avg_price)
    .bind(position.locked_collateral)
    .bind(position.is_settled)
    .bind(position.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

fn map_position_row(row: sqlx::postgres::PgRow) -> Position {
    Position {
        market_id: MarketId::from_uuid(row.get("market_id")),
        user_address: UserAddress::new(row.get::<String, _>("user_address")),
        yes_shares: row.get("yes_shares"),
        no_shares: row.get("no_shares"),
        yes_avg_price: row.get::<Decimal, _>("yes_avg_price").normalize(),
        no_avg_price: row.get::<Decimal, _>("no_avg_price").normalize(),
        locked_collateral: row.get::<Decimal, _>("locked_collateral").normalize(),
        is_settled: row.get("is_settled"),
        updated_at: row.get("updated_at"),
    }
}
