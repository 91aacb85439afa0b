//! Market rows

use sqlx::{PgConnection, Row};
use types::ids::{MarketId, UserAddress};
use types::market::{Market, MarketStatus, Outcome};

use crate::gateway::StoreError;

/// Insert a market row (external creation / dev seeding).
pub async fn insert_market(conn: &mut PgConnection, market: &Market) -> Result<(), StoreError> {
    sqlx::query(
        r"
        INSERT INTO markets (id, question, end_time, oracle_address, status, outcome, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(market.id.as_uuid())
    .bind(&market.question)
    .bind(market.end_time)
    .bind(market.oracle_address.as_str())
    .bind(market.status.as_str())
    .bind(market.outcome.map(|o| o.as_str()))
    .bind(market.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Load a market by id.
pub async fn fetch_market(
    conn: &mut PgConnection,
    market_id: MarketId,
) -> Result<Option<Market>, StoreError> {
    let row = sqlx::query(
        r"
        SELECT id, question, end_time, oracle_address, status, outcome, created_at
        FROM markets
        WHERE id = $1
        ",
    )
    .bind(market_id.as_uuid())
    .fetch_optional(conn)
    .await?;

    row.map(map_market_row).transpose()
}

/// Load a market by id, locking the row for the transaction.
///
/// Used by the submit path to re-check liveness against a concurrent
/// resolution.
pub async fn fetch_market_for_update(
    conn: &mut PgConnection,
    market_id: MarketId,
) -> Result<Option<Market>, StoreError> {
    let row = sqlx::query(
        r"
        SELECT id, question, end_time, oracle_address, status, outcome, created_at
        FROM markets
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(market_id.as_uuid())
    .fetch_optional(conn)
    .await?;

    row.map(map_market_row).transpose()
}

/// Number of market rows (dev-seed guard).
pub async fn count_markets(conn: &mut PgConnection) -> Result<i64, StoreError> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM markets")
        .fetch_one(conn)
        .await?;
    Ok(row.get("n"))
}

fn map_market_row(row: sqlx::postgres::PgRow) -> Result<Market, StoreError> {
    let status_text: String = row.get("status");
    let status = MarketStatus::parse(&status_text)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown market status {status_text:?}")))?;
    let outcome = row
        .get::<Option<String>, _>("outcome")
        .map(|text| {
            Outcome::parse(&text)
                .ok_or_else(|| StoreError::Corrupt(format!("unknown outcome {text:?}")))
        })
        .transpose()?;

    Ok(Market {
        id: MarketId::from_uuid(row.get("id")),
        question: row.get("question"),
        end_time: row.get("end_time"),
        oracle_address: UserAddress::new(row.get::<String, _>("oracle_address")),
        status,
        outcome,
        created_at: row.get("created_at"),
    })
}
