//! Transaction gateway
//!
//! Runs a closure against the database inside a SERIALIZABLE transaction.
//! Serialization conflicts are retried with exponential backoff up to a
//! bounded attempt count; any other error rolls back and propagates.

use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool};
use std::time::Duration;
use thiserror::Error;
use types::errors::NotTradableReason;

/// Store failures surfaced to the submit path.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization conflict persisted after {attempts} attempts")]
    ConflictRetriesExhausted { attempts: u32 },

    #[error("Market not tradable: {0}")]
    MarketNotTradable(NotTradableReason),

    #[error("Audit log unavailable: {0}")]
    AuditUnavailable(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Postgres signals a failed serializable interleaving with SQLSTATE
    /// 40001 (serialization_failure) or 40P01 (deadlock_detected); both
    /// are safe to retry.
    pub fn is_serialization_conflict(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(db)) => {
                matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
            }
            _ => false,
        }
    }
}

/// Retry schedule for serialization conflicts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff for the given (1-based) attempt, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Serializable-transaction executor over a shared pool.
#[derive(Debug, Clone)]
pub struct PgGateway {
    pool: PgPool,
    retry: RetryPolicy,
    statement_timeout: Duration,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            retry: RetryPolicy::default(),
            statement_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run `op` inside a SERIALIZABLE transaction.
    ///
    /// The closure receives the transaction connection and is re-invoked
    /// from scratch on every retry, so it must be safe to repeat; all its
    /// writes roll back with the failed attempt.
    pub async fn run_transaction<T, F>(&self, mut op: F) -> Result<T, StoreError>
    where
        T: Send,
        F: for<'c> FnMut(&'c mut PgConnection) -> BoxFuture<'c, Result<T, StoreError>> + Send,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let mut tx = self.pool.begin().await?;
            sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
                .execute(&mut *tx)
                .await?;
            sqlx::query(&format!(
                "SET LOCAL statement_timeout = {}",
                self.statement_timeout.as_millis()
            ))
            .execute(&mut *tx)
            .await?;

            let result: Result<T, StoreError> = match op(&mut *tx).await {
                Ok(value) => match tx.commit().await {
                    Ok(()) => return Ok(value),
                    Err(err) => Err(StoreError::Database(err)),
                },
                Err(err) => {
                    // Rollback failure is secondary to the original error
                    tx.rollback().await.ok();
                    Err(err)
                }
            };

            let err = match result {
                Ok(_) => unreachable!(),
                Err(err) => err,
            };
            if !err.is_serialization_conflict() {
                return Err(err);
            }
            if attempt >= self.retry.max_attempts {
                tracing::warn!(attempts = attempt, "serialization conflict retries exhausted");
                return Err(StoreError::ConflictRetriesExhausted { attempts: attempt });
            }
            let delay = self.retry.delay_for(attempt);
            tracing::debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "retrying serializable transaction"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
