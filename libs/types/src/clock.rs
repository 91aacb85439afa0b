//! Time and id-generation capabilities
//!
//! The submit path samples the wall clock exactly once per request; every
//! trade in a submission shares that sample. Tests substitute a fixed
//! clock for deterministic timestamps.

use crate::ids::{OrderId, TradeId};
use chrono::{DateTime, Utc};

/// Wall-clock source.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Source of fresh entity ids.
pub trait IdGenerator: Send + Sync {
    fn order_id(&self) -> OrderId;
    fn trade_id(&self) -> TradeId;
}

/// UUID v7 generator (time-sortable).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn order_id(&self) -> OrderId {
        OrderId::new()
    }

    fn trade_id(&self) -> TradeId {
        TradeId::new()
    }
}
