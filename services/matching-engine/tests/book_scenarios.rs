//! Book-level matching scenarios
//!
//! Drives the book the way the submit path does: run the pure matching
//! pass, then apply maker updates and rest the residual, and check the
//! resulting book shape and trade tape.

use chrono::{DateTime, TimeZone, Utc};
use matching_engine::{match_order, MatchResult, OrderBook};
use types::clock::UuidIdGenerator;
use types::ids::{MarketId, OrderId, UserAddress};
use types::market::Outcome;
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, Side};

const U1: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const U2: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
const U3: &str = "0xcccccccccccccccccccccccccccccccccccccccc";

fn ts(second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 16, 12, 0, second).unwrap()
}

fn order(market_id: MarketId, user: &str, side: Side, price: &str, qty: u64, second: u32) -> Order {
    Order::new(
        OrderId::new(),
        market_id,
        UserAddress::new(user),
        side,
        Outcome::Yes,
        Price::from_str(price).unwrap(),
        Quantity::new(qty),
        ts(second),
    )
}

/// Apply a match result to the book and finalize the taker, mirroring the
/// post-commit sequence of the submit path.
fn apply(book: &mut OrderBook, taker: &mut Order, result: &MatchResult) {
    for update in &result.maker_updates {
        book.update_quantity(&update.order_id, update.new_remaining);
    }
    let filled = taker.remaining() - result.taker_remaining;
    if !filled.is_zero() {
        taker.add_fill(filled);
    }
    if !result.taker_remaining.is_zero() {
        book.add(taker).unwrap();
    }
}

fn submit(book: &mut OrderBook, taker: &mut Order, second: u32) -> MatchResult {
    let result = match_order(book, taker, &UuidIdGenerator, ts(second));
    apply(book, taker, &result);
    result
}

#[test]
fn empty_book_limit_buy_rests() {
    let market_id = MarketId::new();
    let mut book = OrderBook::new(market_id, Outcome::Yes);

    let mut taker = order(market_id, U1, Side::Buy, "0.60", 100, 1);
    let result = submit(&mut book, &mut taker, 1);

    assert!(result.trades.is_empty());
    assert_eq!(taker.status, OrderStatus::Open);
    let depth = book.depth(10);
    assert_eq!(depth.bids.len(), 1);
    assert_eq!(depth.bids[0].price, Price::from_str("0.60").unwrap());
    assert_eq!(depth.bids[0].total_quantity, Quantity::new(100));
    assert!(depth.asks.is_empty());
}

#[test]
fn exact_cross_fills_both_sides() {
    let market_id = MarketId::new();
    let mut book = OrderBook::new(market_id, Outcome::Yes);

    let mut maker = order(market_id, U2, Side::Sell, "0.55", 100, 1);
    submit(&mut book, &mut maker, 1);

    let mut taker = order(market_id, U1, Side::Buy, "0.60", 100, 2);
    let result = submit(&mut book, &mut taker, 2);

    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].price, Price::from_str("0.55").unwrap());
    assert_eq!(result.trades[0].quantity, Quantity::new(100));
    assert_eq!(taker.status, OrderStatus::Filled);
    assert!(book.is_empty());
}

#[test]
fn partial_taker_residual_rests() {
    let market_id = MarketId::new();
    let mut book = OrderBook::new(market_id, Outcome::Yes);

    let mut maker = order(market_id, U2, Side::Sell, "0.55", 40, 1);
    submit(&mut book, &mut maker, 1);

    let mut taker = order(market_id, U1, Side::Buy, "0.60", 100, 2);
    let result = submit(&mut book, &mut taker, 2);

    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].quantity, Quantity::new(40));
    assert_eq!(taker.status, OrderStatus::PartiallyFilled);

    // Residual BUY 0.60 × 60 resting; asks exhausted
    let depth = book.depth(10);
    assert!(depth.asks.is_empty());
    assert_eq!(depth.bids.len(), 1);
    assert_eq!(depth.bids[0].total_quantity, Quantity::new(60));
    assert_eq!(book.resting(&taker.id).unwrap().remaining, Quantity::new(60));
}

#[test]
fn price_time_priority_at_one_level() {
    let market_id = MarketId::new();
    let mut book = OrderBook::new(market_id, Outcome::Yes);

    let mut first = order(market_id, U2, Side::Sell, "0.55", 30, 1);
    submit(&mut book, &mut first, 1);
    let mut second = order(market_id, U3, Side::Sell, "0.55", 50, 2);
    submit(&mut book, &mut second, 2);

    let mut taker = order(market_id, U1, Side::Buy, "0.60", 60, 3);
    let result = submit(&mut book, &mut taker, 3);

    assert_eq!(result.trades.len(), 2);
    assert_eq!(result.trades[0].maker_order_id, first.id);
    assert_eq!(result.trades[0].quantity, Quantity::new(30));
    assert_eq!(result.trades[1].maker_order_id, second.id);
    assert_eq!(result.trades[1].quantity, Quantity::new(30));

    // Earlier maker fully consumed, later maker keeps 20
    assert!(!book.contains(&first.id));
    assert_eq!(book.resting(&second.id).unwrap().remaining, Quantity::new(20));
}

#[test]
fn self_trade_skipped_both_rest() {
    let market_id = MarketId::new();
    let mut book = OrderBook::new(market_id, Outcome::Yes);

    let mut own_ask = order(market_id, U1, Side::Sell, "0.55", 50, 1);
    submit(&mut book, &mut own_ask, 1);

    let mut taker = order(market_id, U1, Side::Buy, "0.60", 50, 2);
    let result = submit(&mut book, &mut taker, 2);

    assert!(result.trades.is_empty());
    // Both of the user's orders now rest
    assert!(book.contains(&own_ask.id));
    assert!(book.contains(&taker.id));
    assert_eq!(book.order_count(), 2);
}

#[test]
fn no_cross_leaves_spread() {
    let market_id = MarketId::new();
    let mut book = OrderBook::new(market_id, Outcome::Yes);

    let mut ask = order(market_id, U2, Side::Sell, "0.70", 100, 1);
    submit(&mut book, &mut ask, 1);

    let mut taker = order(market_id, U1, Side::Buy, "0.60", 100, 2);
    let result = submit(&mut book, &mut taker, 2);

    assert!(result.trades.is_empty());
    let best_bid = book.best_bid().unwrap().price;
    let best_ask = book.best_ask().unwrap().price;
    assert_eq!(best_bid, Price::from_str("0.60").unwrap());
    assert_eq!(best_ask, Price::from_str("0.70").unwrap());
    // Spread = 0.10
    assert_eq!(
        best_ask.as_decimal() - best_bid.as_decimal(),
        Price::from_str("0.10").unwrap().as_decimal()
    );
}

#[test]
fn trades_share_one_timestamp_per_submit() {
    let market_id = MarketId::new();
    let mut book = OrderBook::new(market_id, Outcome::Yes);

    let mut a = order(market_id, U2, Side::Sell, "0.52", 10, 1);
    submit(&mut book, &mut a, 1);
    let mut b = order(market_id, U3, Side::Sell, "0.54", 10, 2);
    submit(&mut book, &mut b, 2);

    let mut taker = order(market_id, U1, Side::Buy, "0.55", 20, 3);
    let result = submit(&mut book, &mut taker, 3);

    assert_eq!(result.trades.len(), 2);
    assert!(result.trades.iter().all(|t| t.executed_at == ts(3)));
}

#[test]
fn rebuilt_book_matches_original_depth() {
    let market_id = MarketId::new();
    let mut book = OrderBook::new(market_id, Outcome::Yes);

    // Resting liquidity, then a taker that partially consumes it
    let mut rows: Vec<Order> = Vec::new();
    for (user, price, qty, second) in [(U2, "0.55", 40u64, 1u32), (U3, "0.55", 10, 2), (U2, "0.58", 25, 3)] {
        let mut o = order(market_id, user, Side::Sell, price, qty, second);
        submit(&mut book, &mut o, second);
        rows.push(o);
    }

    let mut taker = order(market_id, U1, Side::Buy, "0.62", 30, 4);
    let result = match_order(&book, &taker, &UuidIdGenerator, ts(4));
    // Mirror the durable rows: credit each maker's fill before applying
    for trade in &result.trades {
        let maker = rows
            .iter_mut()
            .find(|o| o.id == trade.maker_order_id)
            .unwrap();
        maker.add_fill(trade.quantity);
    }
    apply(&mut book, &mut taker, &result);
    rows.push(taker);

    // Replaying the OPEN / PARTIALLY_FILLED rows into a fresh book
    // reproduces the depth at every level
    let mut rebuilt = OrderBook::new(market_id, Outcome::Yes);
    for o in rows.iter().filter(|o| !o.status.is_terminal()) {
        rebuilt.add(o).unwrap();
    }
    assert_eq!(rebuilt.depth(10), book.depth(10));
}
