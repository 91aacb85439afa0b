mod auth;
mod config;
mod error;
mod handlers;
mod models;
mod router;
mod state;

use audit_log::{AuditSink, RedisAuditLog};
use chrono::{Duration as ChronoDuration, Utc};
use config::GatewayConfig;
use matching_engine::BookRegistry;
use order_service::{AddressFormat, AdmissionLocks, OrderSubmitService, PgSubmitStore};
use persistence::{markets, schema, PgGateway};
use router::create_router;
use signing::{Ed25519ReceiptSigner, ReceiptSigner};
use state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use types::clock::{SystemClock, UuidIdGenerator};
use types::ids::UserAddress;
use types::market::Market;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // LOG_LEVEL drives the filter; RUST_LOG still wins when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting trading gateway");
    let config = GatewayConfig::from_env()?;

    // Durable store
    let pool = persistence::connect(&config.database_url, config.db_max_wait).await?;
    schema::run_migrations(&pool).await?;
    let gateway = PgGateway::new(pool).with_statement_timeout(config.db_timeout);
    seed_dev_market(&gateway, &config).await?;

    // Audit log
    let audit: Arc<dyn AuditSink> = Arc::new(
        RedisAuditLog::connect(&config.redis_url)
            .await?
            .with_retention(
                config.max_audit_entries_per_market,
                audit_log::sink::DEFAULT_MAX_ENTRIES_GLOBAL,
            ),
    );

    // Receipt signing
    let signer = Arc::new(Ed25519ReceiptSigner::from_hex(&config.signing_private_key)?);
    tracing::info!(public_key = %signer.public_key(), "receipt signer ready");

    let submit = Arc::new(OrderSubmitService::new(
        Arc::new(PgSubmitStore::new(gateway)),
        audit.clone(),
        signer,
        Arc::new(BookRegistry::new()),
        AdmissionLocks::new(config.admission_lock_ttl),
        Arc::new(SystemClock),
        Arc::new(UuidIdGenerator),
        AddressFormat::default(),
    ));

    let app = create_router(AppState::new(submit, audit));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Seed one development market when the database is empty and an oracle
/// address is configured. Production markets are created externally.
async fn seed_dev_market(
    gateway: &PgGateway,
    config: &GatewayConfig,
) -> Result<(), anyhow::Error> {
    let Some(oracle) = config.oracle_address.clone() else {
        return Ok(());
    };

    let mut conn = gateway.pool().acquire().await?;
    if markets::count_markets(&mut conn).await? > 0 {
        return Ok(());
    }

    let now = Utc::now();
    let market = Market::new(
        "Will this deployment reach mainnet this quarter?",
        now + ChronoDuration::days(30),
        UserAddress::new(oracle),
        now,
    );
    markets::insert_market(&mut conn, &market).await?;
    tracing::info!(market_id = %market.id, "seeded development market");
    Ok(())
}
