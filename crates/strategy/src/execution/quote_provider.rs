//! Off-chain swap quote capability.
//!
//! The aggregator HTTP client is outside this crate; anything that can turn a
//! [`SwapQuoteRequest`] into a router payload plugs in here. Tests and the
//! simulator use a deterministic oracle-priced implementation.

use crate::errors::StrategyError;
use crate::types::{AggregatorQuote, SwapQuoteRequest};

#[allow(async_fn_in_trait)]
pub trait SwapQuoteProvider {
    async fn quote(&self, request: &SwapQuoteRequest) -> Result<AggregatorQuote, StrategyError>;
}
