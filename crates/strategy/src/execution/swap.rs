//! Swap providers: on-chain liquidator and off-chain aggregator payloads.

use alloy::primitives::Address;
use rust_decimal::Decimal;

use crate::errors::StrategyError;
use crate::types::TokenBalances;

/// On-chain liquidator contract that swaps at its own best route.
pub trait Liquidator {
    fn liquidate(
        &mut self,
        token_in: Address,
        token_out: Address,
        amount_in: Decimal,
    ) -> Result<Decimal, StrategyError>;
}

/// Executes an opaque aggregator payload as a raw call.
///
/// The call may move any tokens of `wallet`; callers measure the realised
/// output by balance delta and never trust the payload's own claims.
pub trait AggregatorRouter {
    /// Returns `Ok(false)` when the call itself reverted.
    fn call(
        &mut self,
        target: Address,
        payload: &[u8],
        wallet: &mut TokenBalances,
    ) -> Result<bool, StrategyError>;
}
