//! Market read surfaces: depth, trade history, audit stats, liveness

use crate::error::AppError;
use crate::models::{DepthQuery, LimitQuery};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use matching_engine::Depth;
use types::audit::{AuditEntry, AuditStats};
use types::ids::MarketId;
use uuid::Uuid;

/// `GET /markets/:id/book?outcome=YES&depth=10`
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DepthQuery>,
) -> Result<Json<Depth>, AppError> {
    let depth = state
        .submit
        .depth(MarketId::from_uuid(id), query.outcome, query.depth)
        .await?;
    Ok(Json(depth))
}

/// `GET /markets/:id/trades?limit=100` — oldest first.
pub async fn get_market_trades(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    let entries = state
        .audit
        .get_for_market(MarketId::from_uuid(id), query.limit)
        .await?;
    Ok(Json(entries))
}

/// `GET /trades/recent?limit=100` — newest first, across markets.
pub async fn get_recent_trades(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    let entries = state.audit.get_recent_global(query.limit).await?;
    Ok(Json(entries))
}

/// `GET /markets/:id/audit/stats`
pub async fn get_audit_stats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AuditStats>, AppError> {
    let stats = state.audit.stats(MarketId::from_uuid(id)).await?;
    Ok(Json(stats))
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}
