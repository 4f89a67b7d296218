//! In-memory venue: lending oracle and ledger, concentrated-liquidity pool,
//! liquidator and aggregator router behind one shared handle.
//!
//! The pool prices swaps against a single virtual liquidity figure standing
//! in for other providers; the strategy's own position is tracked per range
//! and valued at the pool price. Oracle updates re-sync the pool price, so
//! tests and the simulator move markets with [`SimMarket::set_price`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy::primitives::Address;
use rust_decimal::Decimal;
use tracing::debug;

use super::aggregator::AggregatorOrder;
use crate::config::SimulationConfig;
use crate::constants::BPS;
use crate::core::tick_math::{
    amounts_for_liquidity, liquidity_for_amounts, sqrt_from_price, sqrt_price_at_tick,
    tick_at_sqrt_price,
};
use crate::errors::StrategyError;
use crate::execution::{
    AggregatorRouter, LendingService, Liquidator, LiquidityPool, MintResult, Transactional,
};
use crate::types::{DebtPosition, RepayResult, TokenBalances};

/// Full venue state; cloned as the rollback checkpoint.
#[derive(Debug, Clone)]
pub struct MarketState {
    prices: HashMap<Address, Decimal>,
    pool: PoolState,
    lending: LendingState,
    liquidator_fee_bps: u32,
    aggregator: AggregatorState,
}

#[derive(Debug, Clone)]
struct PoolState {
    address: Address,
    token0: Address,
    token1: Address,
    tick_spacing: i32,
    fee_bps: u32,
    sqrt_price: Decimal,
    /// Virtual liquidity of other providers.
    liquidity: Decimal,
    positions: HashMap<(i32, i32), Decimal>,
}

#[derive(Debug, Clone)]
struct LendingState {
    borrow_ratio: Decimal,
    /// `(collateral, borrow) -> (collateral_amount, debt_amount)`.
    positions: BTreeMap<(Address, Address), (Decimal, Decimal)>,
}

#[derive(Debug, Clone)]
struct AggregatorState {
    router: Address,
    fee_bps: u32,
}

#[derive(Debug, Clone)]
pub struct SimMarket {
    inner: Arc<Mutex<MarketState>>,
}

impl SimMarket {
    /// Build a market for the pair; pool tokens are ordered by address.
    pub fn from_config(
        config: &SimulationConfig,
        token_a: Address,
        token_b: Address,
    ) -> Result<Self, StrategyError> {
        if token_a == token_b {
            return Err(StrategyError::Config("pair tokens must differ".into()));
        }
        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        let prices = HashMap::from([(token_a, config.price_a), (token_b, config.price_b)]);
        let mut state = MarketState {
            prices,
            pool: PoolState {
                address: config.pool.address,
                token0,
                token1,
                tick_spacing: config.pool.tick_spacing,
                fee_bps: config.pool.fee_bps,
                sqrt_price: Decimal::ONE,
                liquidity: config.pool.liquidity,
                positions: HashMap::new(),
            },
            lending: LendingState {
                borrow_ratio: config.lending.borrow_ratio,
                positions: BTreeMap::new(),
            },
            liquidator_fee_bps: config.liquidator_fee_bps,
            aggregator: AggregatorState {
                router: config.aggregator.router,
                fee_bps: config.aggregator.fee_bps,
            },
        };
        state.sync_pool_price()?;
        Ok(Self {
            inner: Arc::new(Mutex::new(state)),
        })
    }

    fn state(&self) -> MutexGuard<'_, MarketState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Market controls
    // -----------------------------------------------------------------------

    /// Move the oracle price of `asset`; the pool follows.
    pub fn set_price(&self, asset: Address, price: Decimal) -> Result<(), StrategyError> {
        let mut state = self.state();
        let price_of = |token: Address| {
            if token == asset {
                Some(price)
            } else {
                state.prices.get(&token).copied()
            }
        };
        let sqrt_price = pool_sqrt_price(price_of(state.pool.token0), price_of(state.pool.token1))?;
        state.prices.insert(asset, price);
        if let Some(sqrt_price) = sqrt_price {
            state.pool.sqrt_price = sqrt_price;
        }
        Ok(())
    }

    pub fn oracle_price(&self, asset: Address) -> Option<Decimal> {
        self.state().prices.get(&asset).copied()
    }

    pub fn set_pool_fee_bps(&self, fee_bps: u32) {
        self.state().pool.fee_bps = fee_bps;
    }

    pub fn set_liquidator_fee_bps(&self, fee_bps: u32) {
        self.state().liquidator_fee_bps = fee_bps;
    }

    pub fn set_aggregator_fee_bps(&self, fee_bps: u32) {
        self.state().aggregator.fee_bps = fee_bps;
    }

    pub fn aggregator_router(&self) -> Address {
        self.state().aggregator.router
    }

    pub fn aggregator_fee_bps(&self) -> u32 {
        self.state().aggregator.fee_bps
    }

    /// Overwrite a lending position, e.g. to replay a known debt snapshot.
    pub fn set_debt_position(
        &self,
        collateral_asset: Address,
        borrow_asset: Address,
        collateral_amount: Decimal,
        debt_amount: Decimal,
    ) {
        self.state()
            .lending
            .positions
            .insert((collateral_asset, borrow_asset), (collateral_amount, debt_amount));
    }
}

/// Pool sqrt price implied by the oracle prices of token0 and token1.
/// `None` while either price is missing or non-positive.
fn pool_sqrt_price(
    p0: Option<Decimal>,
    p1: Option<Decimal>,
) -> Result<Option<Decimal>, StrategyError> {
    let (Some(p0), Some(p1)) = (p0, p1) else {
        return Ok(None);
    };
    if p0 <= Decimal::ZERO || p1 <= Decimal::ZERO {
        return Ok(None);
    }
    let ratio = p0.checked_div(p1).ok_or_else(|| StrategyError::Pool {
        reason: format!("price ratio {p0} / {p1} out of range"),
    })?;
    sqrt_from_price(ratio).map(Some)
}

impl MarketState {
    fn price(&self, asset: Address) -> Result<Decimal, StrategyError> {
        self.prices
            .get(&asset)
            .copied()
            .ok_or_else(|| StrategyError::ZeroPriceOrOracleFailure {
                asset,
                reason: "no oracle price".into(),
            })
    }

    fn sync_pool_price(&mut self) -> Result<(), StrategyError> {
        let p0 = self.prices.get(&self.pool.token0).copied();
        let p1 = self.prices.get(&self.pool.token1).copied();
        if let Some(sqrt_price) = pool_sqrt_price(p0, p1)? {
            self.pool.sqrt_price = sqrt_price;
        }
        Ok(())
    }

    /// Oracle conversion minus a fee.
    fn convert(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: Decimal,
        fee_bps: u32,
    ) -> Result<Decimal, StrategyError> {
        let gross = amount_in * self.price(token_in)? / self.price(token_out)?;
        Ok(gross * (Decimal::ONE - Decimal::from(fee_bps) / BPS))
    }

    fn range_sqrt_prices(&self, lower: i32, upper: i32) -> Result<(Decimal, Decimal), StrategyError> {
        let spacing = self.pool.tick_spacing.max(1);
        if lower >= upper || lower % spacing != 0 || upper % spacing != 0 {
            return Err(StrategyError::Pool {
                reason: format!("invalid range [{lower}, {upper}) for spacing {spacing}"),
            });
        }
        Ok((sqrt_price_at_tick(lower)?, sqrt_price_at_tick(upper)?))
    }
}

/// Repay `amount` against `(collateral, debt)`; collateral is released
/// pro rata and in full once the debt is cleared.
fn settle_repay(collateral: Decimal, debt: Decimal, amount: Decimal) -> RepayResult {
    let repaid = amount.min(debt).max(Decimal::ZERO);
    let returned = if repaid >= debt {
        collateral
    } else {
        collateral * repaid / debt
    };
    RepayResult {
        amount_repaid: repaid,
        collateral_returned: returned,
        debt_remaining: debt - repaid,
    }
}

// ---------------------------------------------------------------------------
// Lending
// ---------------------------------------------------------------------------

impl LendingService for SimMarket {
    fn borrow(
        &mut self,
        collateral_asset: Address,
        collateral_amount: Decimal,
        borrow_asset: Address,
    ) -> Result<Decimal, StrategyError> {
        if collateral_amount <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        let borrowed = self.quote_borrow(collateral_asset, collateral_amount, borrow_asset)?;
        let mut state = self.state();
        let entry = state
            .lending
            .positions
            .entry((collateral_asset, borrow_asset))
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        entry.0 += collateral_amount;
        entry.1 += borrowed;
        debug!(%collateral_amount, %borrowed, "sim borrow");
        Ok(borrowed)
    }

    fn repay(
        &mut self,
        collateral_asset: Address,
        borrow_asset: Address,
        amount: Decimal,
    ) -> Result<RepayResult, StrategyError> {
        let mut state = self.state();
        let key = (collateral_asset, borrow_asset);
        let (collateral, debt) =
            state
                .lending
                .positions
                .get(&key)
                .copied()
                .ok_or_else(|| StrategyError::Lending {
                    reason: format!("no debt of {borrow_asset} against {collateral_asset}"),
                })?;
        let result = settle_repay(collateral, debt, amount);
        if result.debt_remaining.is_zero() {
            state.lending.positions.remove(&key);
        } else {
            state.lending.positions.insert(
                key,
                (collateral - result.collateral_returned, result.debt_remaining),
            );
        }
        Ok(result)
    }

    fn quote_borrow(
        &self,
        collateral_asset: Address,
        collateral_amount: Decimal,
        borrow_asset: Address,
    ) -> Result<Decimal, StrategyError> {
        let state = self.state();
        let value = collateral_amount * state.price(collateral_asset)?;
        Ok(value * state.lending.borrow_ratio / state.price(borrow_asset)?)
    }

    fn quote_repay(
        &self,
        collateral_asset: Address,
        borrow_asset: Address,
        amount: Decimal,
    ) -> Result<RepayResult, StrategyError> {
        let state = self.state();
        let (collateral, debt) = state
            .lending
            .positions
            .get(&(collateral_asset, borrow_asset))
            .copied()
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));
        Ok(settle_repay(collateral, debt, amount))
    }

    fn debt_snapshot(&self) -> Result<Vec<DebtPosition>, StrategyError> {
        Ok(self
            .state()
            .lending
            .positions
            .iter()
            .map(|(&(collateral_asset, borrow_asset), &(collateral, debt))| DebtPosition {
                collateral_asset,
                borrow_asset,
                collateral_amount: collateral,
                debt_amount: debt,
            })
            .collect())
    }

    fn price(&self, asset: Address) -> Result<Decimal, StrategyError> {
        self.state().price(asset)
    }
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

impl LiquidityPool for SimMarket {
    fn pool_address(&self) -> Address {
        self.state().pool.address
    }

    fn token0(&self) -> Address {
        self.state().pool.token0
    }

    fn token1(&self) -> Address {
        self.state().pool.token1
    }

    fn tick_spacing(&self) -> i32 {
        self.state().pool.tick_spacing
    }

    fn current_tick(&self) -> Result<i32, StrategyError> {
        tick_at_sqrt_price(self.state().pool.sqrt_price)
    }

    fn sqrt_price(&self) -> Result<Decimal, StrategyError> {
        Ok(self.state().pool.sqrt_price)
    }

    fn mint_position(
        &mut self,
        lower_tick: i32,
        upper_tick: i32,
        amount0_desired: Decimal,
        amount1_desired: Decimal,
    ) -> Result<MintResult, StrategyError> {
        let mut state = self.state();
        let (sqrt_lower, sqrt_upper) = state.range_sqrt_prices(lower_tick, upper_tick)?;
        let sqrt_price = state.pool.sqrt_price;
        let liquidity = liquidity_for_amounts(
            sqrt_price,
            sqrt_lower,
            sqrt_upper,
            amount0_desired,
            amount1_desired,
        );
        if liquidity <= Decimal::ZERO {
            return Ok(MintResult {
                liquidity: Decimal::ZERO,
                amount0: Decimal::ZERO,
                amount1: Decimal::ZERO,
            });
        }
        let (amount0, amount1) =
            amounts_for_liquidity(sqrt_price, sqrt_lower, sqrt_upper, liquidity);
        *state
            .pool
            .positions
            .entry((lower_tick, upper_tick))
            .or_insert(Decimal::ZERO) += liquidity;
        Ok(MintResult {
            liquidity,
            amount0: amount0.min(amount0_desired),
            amount1: amount1.min(amount1_desired),
        })
    }

    fn burn_position(
        &mut self,
        lower_tick: i32,
        upper_tick: i32,
        liquidity: Decimal,
    ) -> Result<(Decimal, Decimal), StrategyError> {
        let mut state = self.state();
        let (sqrt_lower, sqrt_upper) = state.range_sqrt_prices(lower_tick, upper_tick)?;
        let held = state
            .pool
            .positions
            .get(&(lower_tick, upper_tick))
            .copied()
            .unwrap_or(Decimal::ZERO);
        if liquidity > held {
            return Err(StrategyError::Pool {
                reason: format!("burn of {liquidity} exceeds position liquidity {held}"),
            });
        }
        let amounts =
            amounts_for_liquidity(state.pool.sqrt_price, sqrt_lower, sqrt_upper, liquidity);
        let remaining = held - liquidity;
        if remaining.is_zero() {
            state.pool.positions.remove(&(lower_tick, upper_tick));
        } else {
            state
                .pool
                .positions
                .insert((lower_tick, upper_tick), remaining);
        }
        Ok(amounts)
    }

    fn position_amounts(
        &self,
        lower_tick: i32,
        upper_tick: i32,
        liquidity: Decimal,
    ) -> Result<(Decimal, Decimal), StrategyError> {
        let state = self.state();
        let (sqrt_lower, sqrt_upper) = state.range_sqrt_prices(lower_tick, upper_tick)?;
        Ok(amounts_for_liquidity(
            state.pool.sqrt_price,
            sqrt_lower,
            sqrt_upper,
            liquidity,
        ))
    }

    /// Constant-liquidity swap: token0 in moves `1/sqrt_price` by
    /// `amount / L`, token1 in moves `sqrt_price` by `amount / L`.
    fn swap(&mut self, token_in: Address, amount_in: Decimal) -> Result<Decimal, StrategyError> {
        let mut state = self.state();
        let pool = &mut state.pool;
        if pool.liquidity <= Decimal::ZERO {
            return Err(StrategyError::Pool {
                reason: "pool has no liquidity".into(),
            });
        }
        let effective = amount_in * (Decimal::ONE - Decimal::from(pool.fee_bps) / BPS);
        let (l, sp) = (pool.liquidity, pool.sqrt_price);
        let (next, amount_out) = if token_in == pool.token0 {
            let next = l * sp / (l + effective * sp);
            (next, l * (sp - next))
        } else if token_in == pool.token1 {
            let next = sp + effective / l;
            (next, l * (next - sp) / (sp * next))
        } else {
            return Err(StrategyError::Pool {
                reason: format!("{token_in} is not a pool token"),
            });
        };
        pool.sqrt_price = next;
        debug!(%token_in, %amount_in, %amount_out, sqrt_price = %next, "sim pool swap");
        Ok(amount_out)
    }
}

// ---------------------------------------------------------------------------
// Swap providers
// ---------------------------------------------------------------------------

impl Liquidator for SimMarket {
    fn liquidate(
        &mut self,
        token_in: Address,
        token_out: Address,
        amount_in: Decimal,
    ) -> Result<Decimal, StrategyError> {
        let state = self.state();
        state.convert(token_in, token_out, amount_in, state.liquidator_fee_bps)
    }
}

impl AggregatorRouter for SimMarket {
    /// Executes a JSON [`AggregatorOrder`]. Unknown targets, undecodable
    /// payloads, unfunded orders and missed minimums revert (`Ok(false)`).
    fn call(
        &mut self,
        target: Address,
        payload: &[u8],
        wallet: &mut TokenBalances,
    ) -> Result<bool, StrategyError> {
        let state = self.state();
        if target != state.aggregator.router {
            debug!(%target, "aggregator call to unknown target");
            return Ok(false);
        }
        let order = match AggregatorOrder::decode(payload) {
            Ok(order) => order,
            Err(err) => {
                debug!(error = %err, "undecodable aggregator payload");
                return Ok(false);
            }
        };
        let amount_out = state.convert(
            order.token_in,
            order.token_out,
            order.amount_in,
            state.aggregator.fee_bps,
        )?;
        if amount_out < order.min_amount_out {
            return Ok(false);
        }
        if wallet.debit(order.token_in, order.amount_in).is_err() {
            return Ok(false);
        }
        wallet.credit(order.token_out, amount_out);
        Ok(true)
    }
}

impl Transactional for SimMarket {
    type Checkpoint = MarketState;

    fn checkpoint(&self) -> MarketState {
        self.state().clone()
    }

    fn rollback(&mut self, checkpoint: MarketState) {
        *self.state() = checkpoint;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::fixtures::{sim_config, TOKEN_A, TOKEN_B};
    use rust_decimal_macros::dec;

    fn market() -> SimMarket {
        SimMarket::from_config(&sim_config(), TOKEN_A, TOKEN_B).unwrap()
    }

    #[test]
    fn test_pool_price_follows_oracle() {
        let market = market();
        assert_eq!(market.current_tick().unwrap(), 0);
        market.set_price(TOKEN_B, dec!(1.1)).unwrap();
        // token0 = A, so price = pA / pB < 1.
        assert!(market.current_tick().unwrap() < -900);
        assert!(market.current_tick().unwrap() > -1000);
    }

    #[test]
    fn test_failed_price_move_changes_nothing() {
        let market = market();
        market.set_price(TOKEN_B, dec!(0.00000000000000000001)).unwrap();
        let tick = market.current_tick().unwrap();

        let err = market.set_price(TOKEN_A, Decimal::MAX).unwrap_err();
        assert!(matches!(err, StrategyError::Pool { .. }));
        assert_eq!(market.oracle_price(TOKEN_A), Some(dec!(1)));
        assert_eq!(market.current_tick().unwrap(), tick);
    }

    #[test]
    fn test_borrow_and_repay_pro_rata() {
        let mut market = market();
        let borrowed = market.borrow(TOKEN_A, dec!(1000), TOKEN_B).unwrap();
        assert_eq!(borrowed, dec!(500));
        let partial = market.repay(TOKEN_A, TOKEN_B, dec!(100)).unwrap();
        assert_eq!(partial.collateral_returned, dec!(200));
        assert_eq!(partial.debt_remaining, dec!(400));
        let rest = market.repay(TOKEN_A, TOKEN_B, dec!(1000)).unwrap();
        assert_eq!(rest.amount_repaid, dec!(400));
        assert_eq!(rest.collateral_returned, dec!(800));
        assert!(market.debt_snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_quote_repay_has_no_side_effects() {
        let mut market = market();
        market.borrow(TOKEN_A, dec!(1000), TOKEN_B).unwrap();
        let quote = market.quote_repay(TOKEN_A, TOKEN_B, dec!(250)).unwrap();
        assert_eq!(quote.collateral_returned, dec!(500));
        assert_eq!(market.debt_snapshot().unwrap()[0].debt_amount, dec!(500));
    }

    #[test]
    fn test_mint_burn_round_trip() {
        let mut market = market();
        let minted = market.mint_position(-100, 100, dec!(10), dec!(10)).unwrap();
        assert!(minted.liquidity > Decimal::ZERO);
        assert!(minted.amount0 <= dec!(10) && minted.amount1 <= dec!(10));
        let (a0, a1) = market.burn_position(-100, 100, minted.liquidity).unwrap();
        assert!((a0 - minted.amount0).abs() < dec!(0.000000001));
        assert!((a1 - minted.amount1).abs() < dec!(0.000000001));
        let err = market.burn_position(-100, 100, dec!(1)).unwrap_err();
        assert!(err.to_string().contains("exceeds position liquidity"));
    }

    #[test]
    fn test_misaligned_range_rejected() {
        let mut market = market();
        let err = market.mint_position(-105, 100, dec!(1), dec!(1)).unwrap_err();
        assert!(matches!(err, StrategyError::Pool { .. }));
    }

    #[test]
    fn test_pool_swap_moves_price() {
        let mut market = market();
        let out = market.swap(TOKEN_A, dec!(1000)).unwrap();
        assert!(out < dec!(1000));
        assert!(out > dec!(990));
        assert!(market.current_tick().unwrap() < 0);
    }

    #[test]
    fn test_aggregator_rejects_unknown_target_and_bad_payload() {
        let mut market = market();
        let mut wallet = TokenBalances::new();
        wallet.credit(TOKEN_A, dec!(10));
        let order = AggregatorOrder {
            token_in: TOKEN_A,
            token_out: TOKEN_B,
            amount_in: dec!(10),
            min_amount_out: Decimal::ZERO,
        };
        let payload = order.encode().unwrap();
        assert!(!market.call(Address::repeat_byte(0x99), &payload, &mut wallet).unwrap());
        let router = market.aggregator_router();
        assert!(!market.call(router, b"garbage", &mut wallet).unwrap());
        assert!(market.call(router, &payload, &mut wallet).unwrap());
        assert_eq!(wallet.balance_of(TOKEN_A), Decimal::ZERO);
        assert!(wallet.balance_of(TOKEN_B) > dec!(9.9));
    }

    #[test]
    fn test_rollback_restores_state() {
        let mut market = market();
        let checkpoint = market.checkpoint();
        market.borrow(TOKEN_A, dec!(100), TOKEN_B).unwrap();
        market.set_price(TOKEN_B, dec!(3)).unwrap();
        market.rollback(checkpoint);
        assert!(market.debt_snapshot().unwrap().is_empty());
        assert_eq!(market.oracle_price(TOKEN_B), Some(dec!(1)));
        assert_eq!(market.current_tick().unwrap(), 0);
    }
}
