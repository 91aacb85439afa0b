//! Authenticated user extraction
//!
//! The deployment authenticates upstream; the gateway trusts either
//! `Authorization: Bearer <user_address>` or an `x-user-address` header.
//! Shape validation of the address itself belongs to the order
//! validator; here we only require that some plausible address arrived.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use types::ids::UserAddress;

use crate::error::AppError;

pub struct AuthenticatedUser {
    pub address: UserAddress,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(auth_header) = parts.headers.get("Authorization") {
            let auth = auth_header
                .to_str()
                .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;
            if let Some(token) = auth.strip_prefix("Bearer ") {
                return address_from(token);
            }
        }

        if let Some(header) = parts.headers.get("x-user-address") {
            let raw = header
                .to_str()
                .map_err(|_| AppError::Unauthorized("Invalid x-user-address header".into()))?;
            return address_from(raw);
        }

        Err(AppError::Unauthorized(
            "Missing authentication address".into(),
        ))
    }
}

fn address_from(raw: &str) -> Result<AuthenticatedUser, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Unauthorized("Empty authentication address".into()));
    }
    Ok(AuthenticatedUser {
        address: UserAddress::new(trimmed),
    })
}
