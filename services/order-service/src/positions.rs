//! Position calculator
//!
//! Derives per-(user, outcome) position deltas from the trades of one
//! submission. The BUY side gains shares and locks collateral, the SELL
//! side sheds both. Buy average prices are maintained volume-weighted;
//! sells preserve the average until the holding reaches zero, which
//! resets it.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use types::ids::UserAddress;
use types::market::Outcome;
use types::numeric::{Quantity, PRICE_SCALE};
use types::order::Side;
use types::position::Position;
use types::trade::Trade;

/// Net effect of one submission on one (user, outcome).
///
/// Within a single submission a user only ever acts on one side of one
/// outcome (the taker takes, every maker rests on the crossing side), so
/// the delta carries a single side.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionDelta {
    pub user_address: UserAddress,
    pub outcome: Outcome,
    pub side: Side,
    pub quantity: Quantity,
    /// Σ price × quantity over the user's trades, at collateral scale.
    pub notional: Decimal,
}

/// Group a submission's trades into one delta per (user, outcome).
///
/// Output order is deterministic: first appearance in the trade batch,
/// buyer before seller within a trade.
pub fn position_deltas(trades: &[Trade]) -> Vec<PositionDelta> {
    let mut deltas: Vec<PositionDelta> = Vec::new();

    let mut accumulate = |user: &UserAddress, outcome: Outcome, side: Side, trade: &Trade| {
        let notional = trade.notional();
        if let Some(delta) = deltas
            .iter_mut()
            .find(|d| &d.user_address == user && d.outcome == outcome)
        {
            debug_assert_eq!(delta.side, side, "one user cannot take both sides in a submit");
            delta.quantity = delta.quantity + trade.quantity;
            delta.notional += notional;
        } else {
            deltas.push(PositionDelta {
                user_address: user.clone(),
                outcome,
                side,
                quantity: trade.quantity,
                notional,
            });
        }
    };

    for trade in trades {
        accumulate(trade.buyer_address(), trade.outcome, Side::Buy, trade);
        accumulate(trade.seller_address(), trade.outcome, Side::Sell, trade);
    }
    deltas
}

/// Apply one delta to a position row.
pub fn apply_delta(position: &mut Position, delta: &PositionDelta, now: DateTime<Utc>) {
    let old_shares = position.shares(delta.outcome);
    let quantity = delta.quantity.get() as i64;

    match delta.side {
        Side::Buy => {
            let new_shares = old_shares + quantity;
            // Volume-weighted average over the enlarged holding
            let old_cost = Decimal::from(old_shares) * position.avg_price(delta.outcome);
            let new_avg = ((old_cost + delta.notional) / Decimal::from(new_shares))
                .round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointNearestEven);
            position.set_shares(delta.outcome, new_shares);
            position.set_avg_price(delta.outcome, new_avg);
            position.locked_collateral += delta.notional;
        }
        Side::Sell => {
            let new_shares = old_shares - quantity;
            position.set_shares(delta.outcome, new_shares);
            if new_shares == 0 {
                position.set_avg_price(delta.outcome, Decimal::ZERO);
            }
            position.locked_collateral -= delta.notional;
        }
    }
    position.updated_at = now;
}
