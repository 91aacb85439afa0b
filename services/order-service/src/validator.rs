//! Order request validation
//!
//! Pure, synchronous checks that must all pass before any state change:
//! wallet-address shape, market liveness, price bounds, quantity
//! positivity. Side and outcome arrive as typed enums, so their
//! membership is enforced at the deserialization boundary.

use chrono::{DateTime, Utc};
use types::errors::{NotTradableReason, ValidationError};
use types::market::Market;
use types::numeric::{Price, Quantity};

use crate::errors::SubmitError;
use crate::submit::SubmitRequest;

/// Wallet-address shape for the deployment: a fixed prefix followed by a
/// fixed number of lowercase hex digits.
#[derive(Debug, Clone)]
pub struct AddressFormat {
    pub prefix: &'static str,
    pub hex_length: usize,
}

impl Default for AddressFormat {
    fn default() -> Self {
        Self {
            prefix: "0x",
            hex_length: 40,
        }
    }
}

impl AddressFormat {
    pub fn matches(&self, address: &str) -> bool {
        address
            .strip_prefix(self.prefix)
            .map(|body| {
                body.len() == self.hex_length
                    && body.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
            })
            .unwrap_or(false)
    }
}

/// The numeric fields of a request after validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidOrder {
    pub price: Price,
    pub quantity: Quantity,
}

/// Validate a submit request against the market it targets.
///
/// `market` is the row looked up by the caller; `None` means the id did
/// not resolve. All failures carry a field name and a stable code.
pub fn validate(
    request: &SubmitRequest,
    market: Option<&Market>,
    now: DateTime<Utc>,
    format: &AddressFormat,
) -> Result<ValidOrder, SubmitError> {
    if !format.matches(request.user_address.as_str()) {
        return Err(ValidationError::new(
            "userAddress",
            "INVALID_ADDRESS",
            format!(
                "address must be {} followed by {} hex characters",
                format.prefix, format.hex_length
            ),
        )
        .into());
    }

    let market = market.ok_or(SubmitError::MarketNotTradable(NotTradableReason::NotFound))?;
    market
        .check_tradable(now)
        .map_err(SubmitError::MarketNotTradable)?;

    let price = Price::from_f64(request.price).ok_or_else(|| {
        ValidationError::new(
            "price",
            "PRICE_OUT_OF_RANGE",
            "price must be a finite number strictly between 0 and 1",
        )
    })?;

    if request.quantity == 0 {
        return Err(ValidationError::new(
            "quantity",
            "QUANTITY_NOT_POSITIVE",
            "quantity must be a positive integer",
        )
        .into());
    }

    Ok(ValidOrder {
        price,
        quantity: Quantity::new(request.quantity),
    })
}
