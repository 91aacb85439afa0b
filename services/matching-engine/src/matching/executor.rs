//! The matching pass
//!
//! Walks the crossing side of the book in price-time priority and emits
//! trades at maker prices until the taker is exhausted or prices stop
//! crossing. The pass is pure: it reads the book and returns the intended
//! mutations as data. The caller applies them once the backing
//! transaction has committed.

use chrono::{DateTime, Utc};
use types::clock::IdGenerator;
use types::ids::OrderId;
use types::numeric::Quantity;
use types::order::Order;
use types::trade::Trade;

use crate::book::OrderBook;
use crate::matching::crossing;

/// Intended change to one resting maker.
#[derive(Debug, Clone, PartialEq)]
pub struct MakerUpdate {
    pub order_id: OrderId,
    /// Remaining quantity after the fill; zero means the maker is done
    /// and leaves the book.
    pub new_remaining: Quantity,
}

/// Outcome of matching one taker against a book snapshot.
///
/// Applying each maker update in order (removing makers that reach zero)
/// and then resting the taker's residual reproduces the book state a
/// sequential matcher would have produced.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub trades: Vec<Trade>,
    pub taker_remaining: Quantity,
    pub maker_updates: Vec<MakerUpdate>,
}

impl MatchResult {
    pub fn is_fully_filled(&self) -> bool {
        self.taker_remaining.is_zero()
    }
}

/// Match a taker order against the book.
///
/// Walks the opposite side best price outward, FIFO within a level.
/// Makers owned by the taker's own address are skipped and left resting.
/// Every trade executes at the maker's posted price with the single
/// `timestamp` sample supplied by the caller.
///
/// # Panics
/// Panics if the book's aggregates are inconsistent with its orders
/// (book invariant violation).
pub fn match_order(
    book: &OrderBook,
    taker: &Order,
    ids: &dyn IdGenerator,
    timestamp: DateTime<Utc>,
) -> MatchResult {
    let mut trades = Vec::new();
    let mut maker_updates = Vec::new();
    let mut taker_remaining = taker.remaining();

    for maker in book.iter_side(taker.side.opposite()) {
        if taker_remaining.is_zero() {
            break;
        }
        if !crossing::crosses(taker.side, taker.price, maker.price) {
            // Levels are price-ordered: nothing further can cross.
            break;
        }
        // Self-trade policy: skip, leave the maker resting.
        if maker.user_address == taker.user_address {
            continue;
        }

        let fill = taker_remaining.min(maker.remaining);
        assert!(
            !fill.is_zero(),
            "resting maker {} has zero remaining quantity",
            maker.order_id
        );

        trades.push(Trade::new(
            ids.trade_id(),
            taker.market_id,
            taker.outcome,
            maker.price,
            fill,
            maker.order_id,
            taker.id,
            maker.user_address.clone(),
            taker.user_address.clone(),
            taker.side,
            timestamp,
        ));
        maker_updates.push(MakerUpdate {
            order_id: maker.order_id,
            new_remaining: maker.remaining - fill,
        });
        taker_remaining = taker_remaining - fill;
    }

    debug_assert_eq!(
        trades
            .iter()
            .fold(Quantity::zero(), |acc, t| acc + t.quantity)
            + taker_remaining,
        taker.remaining(),
        "matched quantity and residual must account for the full taker"
    );

    MatchResult {
        trades,
        taker_remaining,
        maker_updates,
    }
}
