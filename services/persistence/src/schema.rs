//! Schema bootstrap
//!
//! Creates the trading tables when absent. Enumerations are stored as
//! TEXT with CHECK constraints so row mapping stays symmetric with the
//! `as_str`/`parse` pairs on the domain enums. Prices are decimal(10,8),
//! collateral decimal(20,8).

use sqlx::PgPool;
use tracing::info;

use crate::gateway::StoreError;

/// Create tables and indices if they do not exist.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    info!("Running database migrations");

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS markets (
            id UUID PRIMARY KEY,
            question TEXT NOT NULL,
            end_time TIMESTAMPTZ NOT NULL,
            oracle_address TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('ACTIVE', 'RESOLVED', 'CANCELLED')),
            outcome TEXT CHECK (outcome IN ('YES', 'NO')),
            created_at TIMESTAMPTZ NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS orders (
            id UUID PRIMARY KEY,
            market_id UUID NOT NULL REFERENCES markets(id) ON DELETE CASCADE,
            user_address TEXT NOT NULL,
            side TEXT NOT NULL CHECK (side IN ('BUY', 'SELL')),
            outcome TEXT NOT NULL CHECK (outcome IN ('YES', 'NO')),
            price DECIMAL(10, 8) NOT NULL CHECK (price > 0 AND price < 1),
            quantity BIGINT NOT NULL CHECK (quantity > 0),
            filled_quantity BIGINT NOT NULL DEFAULT 0
                CHECK (filled_quantity >= 0 AND filled_quantity <= quantity),
            status TEXT NOT NULL
                CHECK (status IN ('OPEN', 'PARTIALLY_FILLED', 'FILLED', 'CANCELLED')),
            created_at TIMESTAMPTZ NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    // Matching scan: open interest per (market, outcome) in price/time order
    sqlx::query(
        r"
        CREATE INDEX IF NOT EXISTS idx_orders_matching
            ON orders (market_id, outcome, price, created_at)
        ",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_user ON orders (user_address)")
        .execute(pool)
        .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS trades (
            id UUID PRIMARY KEY,
            market_id UUID NOT NULL REFERENCES markets(id) ON DELETE CASCADE,
            outcome TEXT NOT NULL CHECK (outcome IN ('YES', 'NO')),
            price DECIMAL(10, 8) NOT NULL,
            quantity BIGINT NOT NULL CHECK (quantity > 0),
            maker_order_id UUID NOT NULL,
            taker_order_id UUID NOT NULL,
            maker_address TEXT NOT NULL,
            taker_address TEXT NOT NULL,
            taker_side TEXT NOT NULL CHECK (taker_side IN ('BUY', 'SELL')),
            executed_at TIMESTAMPTZ NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE INDEX IF NOT EXISTS idx_trades_market_time
            ON trades (market_id, executed_at)
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS user_positions (
            market_id UUID NOT NULL REFERENCES markets(id) ON DELETE CASCADE,
            user_address TEXT NOT NULL,
            yes_shares BIGINT NOT NULL DEFAULT 0,
            no_shares BIGINT NOT NULL DEFAULT 0,
            yes_avg_price DECIMAL(10, 8) NOT NULL DEFAULT 0,
            no_avg_price DECIMAL(10, 8) NOT NULL DEFAULT 0,
            locked_collateral DECIMAL(20, 8) NOT NULL DEFAULT 0,
            is_settled BOOLEAN NOT NULL DEFAULT FALSE,
            updated_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (market_id, user_address)
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_positions_user ON user_positions (user_address)",
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed");
    Ok(())
}
