//! HTTP error mapping
//!
//! Every failure leaves the service as a JSON payload with a stable
//! `error` code, a human-readable `message`, the `orderId` when one was
//! assigned, and a `requestId` for log correlation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use order_service::SubmitError;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Central error type for the gateway.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Audit log unavailable")]
    Audit(#[from] audit_log::AuditError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4();
        let (status, code, message, order_id) = match &self {
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone(), None)
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            AppError::Audit(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUDIT_UNAVAILABLE",
                err.to_string(),
                None,
            ),
            AppError::Submit(err) => {
                let status = match err {
                    SubmitError::Validation(_) | SubmitError::MarketNotTradable(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    SubmitError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                    SubmitError::Store(_)
                    | SubmitError::Signing { .. }
                    | SubmitError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let order_id = match err {
                    SubmitError::Signing { order_id, .. } => Some(order_id.to_string()),
                    _ => None,
                };
                (status, err.code(), err.to_string(), order_id)
            }
        };

        if status.is_server_error() {
            tracing::error!(%request_id, code, %self, "request failed");
        } else {
            tracing::debug!(%request_id, code, %self, "request rejected");
        }

        let mut body = json!({
            "error": code,
            "message": message,
            "requestId": request_id,
        });
        if let Some(order_id) = order_id {
            body["orderId"] = json!(order_id);
        }
        (status, Json(body)).into_response()
    }
}
