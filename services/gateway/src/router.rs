//! Route table

use crate::handlers::{market, order};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/orders", post(order::create_order))
        .route("/markets/:id/book", get(market::get_book))
        .route("/markets/:id/trades", get(market::get_market_trades))
        .route("/markets/:id/audit/stats", get(market::get_audit_stats))
        .route("/trades/recent", get(market::get_recent_trades))
        .route("/health", get(market::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
