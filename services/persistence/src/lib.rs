//! Durable store for the trading core
//!
//! PostgreSQL persistence with a serializable-transaction gateway,
//! schema bootstrap, and row mappers for markets, orders, trades, and
//! positions. All row operations take a `PgConnection` so they compose
//! inside one transaction closure.

pub mod gateway;
pub mod markets;
pub mod orders;
pub mod positions;
pub mod schema;
pub mod trades;

pub use gateway::{PgGateway, RetryPolicy, StoreError};

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Connect to the database with the pool settings the submit path
/// assumes (bounded acquire wait).
pub async fn connect(database_url: &str, max_wait: Duration) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(16)
        .acquire_timeout(max_wait)
        .connect(database_url)
        .await?;
    Ok(pool)
}
