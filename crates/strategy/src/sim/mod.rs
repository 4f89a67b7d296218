//! Deterministic in-memory venue for the simulator binary and tests.

pub mod aggregator;
pub mod market;

#[cfg(test)]
pub(crate) mod fixtures;

pub use aggregator::{AggregatorOrder, OracleQuoteProvider};
pub use market::{MarketState, SimMarket};
