//! Concentrated-liquidity pool interface.
//!
//! Prices follow the Uniswap V3 convention: `sqrt_price` is the square root of
//! token1 per token0, and `current_tick` is the floor of its log base 1.0001.

use alloy::primitives::Address;
use rust_decimal::Decimal;

use crate::errors::StrategyError;

/// Amounts actually taken by `mint_position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintResult {
    pub liquidity: Decimal,
    pub amount0: Decimal,
    pub amount1: Decimal,
}

pub trait LiquidityPool {
    fn pool_address(&self) -> Address;
    fn token0(&self) -> Address;
    fn token1(&self) -> Address;
    fn tick_spacing(&self) -> i32;

    fn current_tick(&self) -> Result<i32, StrategyError>;
    fn sqrt_price(&self) -> Result<Decimal, StrategyError>;

    /// Add as much liquidity as the desired amounts allow in `[lower, upper)`.
    fn mint_position(
        &mut self,
        lower_tick: i32,
        upper_tick: i32,
        amount0_desired: Decimal,
        amount1_desired: Decimal,
    ) -> Result<MintResult, StrategyError>;

    /// Remove `liquidity` from `[lower, upper)`; returns `(amount0, amount1)`.
    fn burn_position(
        &mut self,
        lower_tick: i32,
        upper_tick: i32,
        liquidity: Decimal,
    ) -> Result<(Decimal, Decimal), StrategyError>;

    /// Token amounts `liquidity` in `[lower, upper)` is worth right now.
    fn position_amounts(
        &self,
        lower_tick: i32,
        upper_tick: i32,
        liquidity: Decimal,
    ) -> Result<(Decimal, Decimal), StrategyError>;

    /// Swap `amount_in` of `token_in` for the other pool token.
    fn swap(&mut self, token_in: Address, amount_in: Decimal) -> Result<Decimal, StrategyError>;
}
