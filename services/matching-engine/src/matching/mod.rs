//! Matching module
//!
//! Crossing detection and the pure matching pass.

pub mod crossing;
pub mod executor;

pub use executor::{match_order, MakerUpdate, MatchResult};
