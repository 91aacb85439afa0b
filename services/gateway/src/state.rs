//! Shared application state

use audit_log::AuditSink;
use order_service::OrderSubmitService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub submit: Arc<OrderSubmitService>,
    pub audit: Arc<dyn AuditSink>,
}

impl AppState {
    pub fn new(submit: Arc<OrderSubmitService>, audit: Arc<dyn AuditSink>) -> Self {
        Self { submit, audit }
    }
}
