//! Environment-driven configuration

use std::env;
use std::time::Duration;

/// Gateway service configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub redis_url: String,
    /// Hex-encoded 32-byte Ed25519 secret for receipt signing.
    pub signing_private_key: String,
    /// Oracle address used when seeding the development market.
    pub oracle_address: Option<String>,
    pub admission_lock_ttl: Duration,
    pub max_audit_entries_per_market: usize,
    /// Bound on waiting for a pooled connection.
    pub db_max_wait: Duration,
    /// Per-transaction statement timeout.
    pub db_timeout: Duration,
}

impl GatewayConfig {
    /// Read configuration from the environment, with development
    /// defaults for everything but the signing key.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let signing_private_key = env::var("SIGNING_PRIVATE_KEY")
            .map_err(|_| anyhow::anyhow!("SIGNING_PRIVATE_KEY must be set"))?;

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 8080)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/exchange".to_string()),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            signing_private_key,
            oracle_address: env::var("ORACLE_ADDRESS").ok(),
            admission_lock_ttl: Duration::from_millis(parse_or("ADMISSION_LOCK_TTL_MS", 5000)?),
            max_audit_entries_per_market: parse_or("MAX_AUDIT_ENTRIES_PER_MARKET", 100_000)?,
            db_max_wait: Duration::from_secs(10),
            db_timeout: Duration::from_secs(30),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|err| anyhow::anyhow!("invalid {key}: {err}")),
        Err(_) => Ok(default),
    }
}
