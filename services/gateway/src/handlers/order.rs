//! Order submission handler

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{CreateOrderRequest, OrderResponse};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use order_service::SubmitRequest;

/// `POST /orders` — validate, match, persist, and sign one limit order.
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let signed = state
        .submit
        .submit(SubmitRequest {
            market_id: payload.market_id,
            user_address: user.address,
            side: payload.side,
            outcome: payload.outcome,
            price: payload.price,
            quantity: payload.quantity,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse::from_receipt(signed.receipt, signed.signature)),
    ))
}
