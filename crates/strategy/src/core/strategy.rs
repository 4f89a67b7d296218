//! Pair strategy: owns the pool position and fuses, decides and executes
//! rebalances against a [`Venue`].
//!
//! Every mutating call runs through [`PairStrategy::atomically`]: the strategy
//! snapshots its own state and the venue's checkpoint, and restores both if
//! any step fails. Reads (`need_rebalance`, `quote_*`, `total_assets`) never
//! mutate and re-query the venue on every call.

use alloy::primitives::Address;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, warn};

use super::decision::{self, DustThresholds, PairPrices};
use super::fuse::{FuseEvaluation, FusePair};
use super::tick_math::{centered_range, sqrt_price_at_tick, token1_value_share};
use crate::config::StrategyConfig;
use crate::errors::StrategyError;
use crate::execution::Venue;
use crate::types::{
    AggregatorSwapArgs, FuseSide, FuseStatus, FuseThresholds, PairDebts, PoolPosition,
    RebalanceMode, RebalanceOutcome, RebalanceQuote, StrategyKind, SwapDirection, TokenBalances,
};

/// State owned exclusively by the strategy. Cloned as the rollback snapshot.
#[derive(Debug, Clone)]
pub(crate) struct StrategyState {
    pub position: PoolPosition,
    pub fuses: FusePair,
    pub wallet: TokenBalances,
    pub restake_required: bool,
}

pub struct PairStrategy<V: Venue> {
    pub(crate) venue: V,
    pub(crate) config: StrategyConfig,
    a_is_token0: bool,
    pub(crate) state: StrategyState,
}

impl<V: Venue> PairStrategy<V> {
    /// Bind a strategy to `venue`. The initial range is centred on the
    /// venue's current tick.
    pub fn new(venue: V, config: StrategyConfig) -> Result<Self, StrategyError> {
        config
            .fuse_a
            .validate()
            .map_err(|reason| StrategyError::InvalidState { reason })?;
        config
            .fuse_b
            .validate()
            .map_err(|reason| StrategyError::InvalidState { reason })?;
        if config.rebalance_tick_range < 0 || config.tick_range < config.rebalance_tick_range {
            return Err(StrategyError::InvalidState {
                reason: format!(
                    "tick ranges must satisfy tick_range ({}) >= rebalance_tick_range ({}) >= 0",
                    config.tick_range, config.rebalance_tick_range
                ),
            });
        }

        let token_a = config.token_a.address;
        let token_b = config.token_b.address;
        let (token0, token1) = (venue.token0(), venue.token1());
        let a_is_token0 = if token0 == token_a && token1 == token_b {
            true
        } else if token0 == token_b && token1 == token_a {
            false
        } else {
            return Err(StrategyError::InvalidState {
                reason: format!(
                    "pool tokens ({token0}, {token1}) do not match pair ({token_a}, {token_b})"
                ),
            });
        };

        let spacing = venue.tick_spacing();
        let mut position = PoolPosition::new(
            venue.pool_address(),
            token_a,
            token_b,
            spacing,
            config.tick_range,
            config.rebalance_tick_range,
        );
        let tick = venue.current_tick()?;
        let (lower, upper) = centered_range(tick, config.tick_range, spacing);
        position.set_range(lower, upper, tick);

        info!(
            kind = config.kind.as_str(),
            pool = %position.pool,
            token_a = %config.token_a.symbol,
            token_b = %config.token_b.symbol,
            lower,
            upper,
            "strategy initialised"
        );

        let state = StrategyState {
            position,
            fuses: FusePair::new(config.fuse_a, config.fuse_b),
            wallet: TokenBalances::new(),
            restake_required: false,
        };
        Ok(Self {
            venue,
            config,
            a_is_token0,
            state,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn venue(&self) -> &V {
        &self.venue
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn kind(&self) -> StrategyKind {
        self.config.kind
    }

    pub fn position(&self) -> &PoolPosition {
        &self.state.position
    }

    pub fn wallet(&self) -> &TokenBalances {
        &self.state.wallet
    }

    pub fn token_a(&self) -> Address {
        self.config.token_a.address
    }

    pub fn token_b(&self) -> Address {
        self.config.token_b.address
    }

    pub fn fuse_status(&self, side: FuseSide) -> FuseStatus {
        self.state.fuses.side(side).status
    }

    pub fn restake_required(&self) -> bool {
        self.state.restake_required
    }

    /// `(token_in, token_out)` for a swap direction.
    pub fn swap_tokens(&self, direction: SwapDirection) -> (Address, Address) {
        match direction {
            SwapDirection::AToB => (self.token_a(), self.token_b()),
            SwapDirection::BToA => (self.token_b(), self.token_a()),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Whether a rebalance pass is due: a pending fuse transition, a farm
    /// restake, or (while exposure is allowed) the tick leaving the band.
    pub fn need_rebalance(&self) -> Result<bool, StrategyError> {
        let evaluation = self.evaluate_fuses()?;
        self.need_rebalance_with(&evaluation)
    }

    pub(crate) fn need_rebalance_with(
        &self,
        evaluation: &FuseEvaluation,
    ) -> Result<bool, StrategyError> {
        if evaluation.changed {
            return Ok(true);
        }
        if self.state.restake_required && self.config.kind.supports_farming() {
            return Ok(true);
        }
        if !evaluation.allows_exposure() {
            return Ok(false);
        }
        let tick = self.venue.current_tick()?;
        Ok(!self.state.position.is_tick_in_band(tick))
    }

    /// Swap that restores the hedge after a full exit.
    ///
    /// Virtually withdraws all liquidity and repays reverse debt with the
    /// underlying on hand, then sizes the swap so that the B balance covers
    /// outstanding B debt plus the configured buffer.
    pub fn quote_rebalance_swap(&self) -> Result<RebalanceQuote, StrategyError> {
        let evaluation = self.evaluate_fuses()?;
        let needs_rebalance = self.need_rebalance_with(&evaluation)?;
        let prices = self.prices()?;
        let (mut a, mut b) = self.holdings()?;
        let debts = self.pair_debts()?;

        if debts.debt_a > Decimal::ZERO && a > Decimal::ZERO {
            let repay = self
                .venue
                .quote_repay(self.token_b(), self.token_a(), a.min(debts.debt_a))?;
            a -= repay.amount_repaid;
            b += repay.collateral_returned;
        }

        let (direction, amount) = decision::hedge_swap(
            a,
            b,
            debts.debt_b,
            decision::bps_multiplier(self.config.swap_buffer_bps),
            prices,
            self.dust(),
        );
        Ok(RebalanceQuote {
            needs_rebalance,
            direction,
            amount_to_swap: self.truncate_sold(direction, amount),
        })
    }

    /// Everything the strategy controls, in underlying units at oracle prices.
    pub fn total_assets(&self) -> Result<Decimal, StrategyError> {
        let prices = self.prices()?;
        let (a, b) = self.holdings()?;
        let debts = self.pair_debts()?;
        let a_net = a + debts.collateral_a - debts.debt_a;
        let b_net = b + debts.collateral_b - debts.debt_b;
        let total = a_net + prices.b_to_a(b_net);
        Ok(self.truncate_a(total.max(Decimal::ZERO)))
    }

    // -----------------------------------------------------------------------
    // Rebalance execution
    // -----------------------------------------------------------------------

    /// Rebalance using only withdraw/repay/re-enter.
    pub fn rebalance_no_swap(&mut self) -> Result<RebalanceOutcome, StrategyError> {
        self.atomically(|s| s.execute_rebalance(RebalanceMode::NoSwap, None))
    }

    /// Rebalance with the quoted swap executed through the pool itself.
    pub fn rebalance_self_swap(&mut self) -> Result<RebalanceOutcome, StrategyError> {
        self.atomically(|s| s.execute_rebalance(RebalanceMode::SelfSwap, None))
    }

    /// Rebalance with a caller-built aggregator payload.
    pub fn rebalance_with_aggregator(
        &mut self,
        args: &AggregatorSwapArgs,
    ) -> Result<RebalanceOutcome, StrategyError> {
        self.atomically(|s| s.execute_rebalance(RebalanceMode::Aggregator, Some(args)))
    }

    fn execute_rebalance(
        &mut self,
        mode: RebalanceMode,
        args: Option<&AggregatorSwapArgs>,
    ) -> Result<RebalanceOutcome, StrategyError> {
        let evaluation = self.evaluate_fuses()?;
        if !self.need_rebalance_with(&evaluation)? {
            return Err(StrategyError::InvalidState {
                reason: "rebalance not needed".into(),
            });
        }
        let quote = self.quote_rebalance_swap()?;

        self.exit_pool()?;
        self.repay_reverse_debt()?;

        let (swapped_in, swapped_out) = match mode {
            RebalanceMode::NoSwap => (Decimal::ZERO, Decimal::ZERO),
            RebalanceMode::SelfSwap => {
                if quote.requires_swap() {
                    self.swap_through_pool(quote.direction, quote.amount_to_swap)?
                } else {
                    (Decimal::ZERO, Decimal::ZERO)
                }
            }
            RebalanceMode::Aggregator => {
                let args = args.ok_or_else(|| StrategyError::InvalidState {
                    reason: "aggregator rebalance without swap arguments".into(),
                })?;
                self.check_against_quote(
                    quote.direction,
                    quote.amount_to_swap,
                    args.direction,
                    args.amount,
                )?;
                if args.amount > Decimal::ZERO {
                    let (token_in, token_out) = self.swap_tokens(args.direction);
                    self.swap_via_aggregator(
                        token_in,
                        token_out,
                        args.amount,
                        args.aggregator,
                        &args.payload,
                    )?
                } else {
                    (Decimal::ZERO, Decimal::ZERO)
                }
            }
        };

        self.repay_available()?;
        self.state.fuses.apply(&evaluation);
        self.state.restake_required = false;

        if evaluation.allows_exposure() {
            self.reset_range()?;
            self.enter_pool()?;
        }
        self.refresh_deferred_unwind()?;

        let position = &self.state.position;
        info!(
            mode = mode.as_str(),
            swapped_in = %swapped_in,
            swapped_out = %swapped_out,
            lower = position.lower_tick,
            upper = position.upper_tick,
            liquidity = %position.total_liquidity,
            fuse_a = evaluation.status_a.as_str(),
            fuse_b = evaluation.status_b.as_str(),
            "rebalance complete"
        );

        Ok(RebalanceOutcome {
            mode,
            swapped_in,
            swapped_out,
            lower_tick: position.lower_tick,
            upper_tick: position.upper_tick,
            liquidity: position.total_liquidity,
            fuse_a: evaluation.status_a,
            fuse_b: evaluation.status_b,
        })
    }

    // -----------------------------------------------------------------------
    // Operator inputs
    // -----------------------------------------------------------------------

    /// Record that the external farm needs an unstake/restake pass.
    pub fn signal_restake_required(&mut self) {
        if !self.config.kind.supports_farming() {
            debug!(kind = self.config.kind.as_str(), "restake signal ignored");
            return;
        }
        self.state.restake_required = true;
    }

    /// Replace one side's fuse thresholds. The side restarts from OFF.
    pub fn set_fuse_thresholds(
        &mut self,
        side: FuseSide,
        thresholds: FuseThresholds,
    ) -> Result<(), StrategyError> {
        self.state.fuses.set_thresholds(side, thresholds)?;
        info!(side = ?side, thresholds = ?thresholds.as_array(), "fuse thresholds updated");
        Ok(())
    }

    /// Credit underlying delivered by the vault.
    pub fn accept_deposit(&mut self, amount: Decimal) {
        self.state.wallet.credit(self.token_a(), amount);
    }

    /// Hand idle underlying back to the vault.
    pub fn release_underlying(&mut self, amount: Decimal) -> Result<Decimal, StrategyError> {
        self.state.wallet.debit(self.token_a(), amount)?;
        Ok(amount)
    }

    /// Put idle balances to work in the current range.
    ///
    /// Skipped (returns zero) while the fuse blocks exposure or a rebalance
    /// is pending, since the range is then stale.
    pub fn invest(&mut self) -> Result<Decimal, StrategyError> {
        self.atomically(|s| {
            let evaluation = s.evaluate_fuses()?;
            if !evaluation.allows_exposure() || s.need_rebalance_with(&evaluation)? {
                debug!("invest skipped: rebalance pending or fuse on");
                return Ok(Decimal::ZERO);
            }
            if !s.state.position.has_liquidity() {
                s.reset_range()?;
            }
            let minted = s.enter_pool()?;
            s.refresh_deferred_unwind()?;
            Ok(minted)
        })
    }

    // -----------------------------------------------------------------------
    // Atomicity
    // -----------------------------------------------------------------------

    /// Run `op` all-or-nothing against the strategy and its venue.
    pub(crate) fn atomically<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, StrategyError>,
    ) -> Result<T, StrategyError> {
        let saved = self.state.clone();
        let checkpoint = self.venue.checkpoint();
        match op(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.venue.rollback(checkpoint);
                self.state = saved;
                warn!(error = %err, "call reverted, state restored");
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Pool and lending legs
    // -----------------------------------------------------------------------

    /// Burn all liquidity into the wallet. Returns `(a, b)` received.
    pub(crate) fn exit_pool(&mut self) -> Result<(Decimal, Decimal), StrategyError> {
        let position = &self.state.position;
        if !position.has_liquidity() {
            return Ok((Decimal::ZERO, Decimal::ZERO));
        }
        let (amount0, amount1) = self.venue.burn_position(
            position.lower_tick,
            position.upper_tick,
            position.total_liquidity,
        )?;
        let (a, b) = self.from_pool_order(amount0, amount1);
        self.state.wallet.credit(self.token_a(), a);
        self.state.wallet.credit(self.token_b(), b);
        self.state.position.total_liquidity = Decimal::ZERO;
        debug!(%a, %b, "liquidity withdrawn");
        Ok((a, b))
    }

    /// Borrow to the target ratio and mint with whatever the wallet holds.
    /// Returns the liquidity added.
    pub(crate) fn enter_pool(&mut self) -> Result<Decimal, StrategyError> {
        let (token_a, token_b) = (self.token_a(), self.token_b());
        let dust = self.dust();
        let a = self.state.wallet.balance_of(token_a);
        let b = self.state.wallet.balance_of(token_b);
        if a <= dust.a && b <= dust.b {
            return Ok(Decimal::ZERO);
        }

        let prices = self.prices()?;
        let position = &self.state.position;
        let sqrt_price = self.venue.sqrt_price()?;
        let share1 = token1_value_share(
            sqrt_price,
            sqrt_price_at_tick(position.lower_tick)?,
            sqrt_price_at_tick(position.upper_tick)?,
        );
        let prop_b = if self.a_is_token0 {
            share1
        } else {
            Decimal::ONE - share1
        };
        let k = prices.b_to_a(self.venue.quote_borrow(token_a, Decimal::ONE, token_b)?);
        let collateral = self.truncate_a(decision::collateral_for_target(
            prop_b,
            a,
            prices.b_to_a(b),
            k,
        ));

        if collateral > dust.a {
            self.state.wallet.debit(token_a, collateral)?;
            let borrowed = self.venue.borrow(token_a, collateral, token_b)?;
            self.state.wallet.credit(token_b, borrowed);
            debug!(%collateral, %borrowed, "borrowed against underlying");
        }

        let a = self.state.wallet.balance_of(token_a);
        let b = self.state.wallet.balance_of(token_b);
        let (desired0, desired1) = self.to_pool_order(a, b);
        let (lower, upper) = (
            self.state.position.lower_tick,
            self.state.position.upper_tick,
        );
        let minted = self.venue.mint_position(lower, upper, desired0, desired1)?;
        if minted.liquidity <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        let (used_a, used_b) = self.from_pool_order(minted.amount0, minted.amount1);
        self.state.wallet.debit(token_a, used_a)?;
        self.state.wallet.debit(token_b, used_b)?;
        self.state.position.total_liquidity += minted.liquidity;
        debug!(liquidity = %minted.liquidity, %used_a, %used_b, lower, upper, "liquidity added");
        Ok(minted.liquidity)
    }

    /// Re-centre the range on the current tick. Only valid while empty.
    pub(crate) fn reset_range(&mut self) -> Result<(), StrategyError> {
        if self.state.position.has_liquidity() {
            return Err(StrategyError::InvalidState {
                reason: "cannot move range while liquidity is deposited".into(),
            });
        }
        let tick = self.venue.current_tick()?;
        let (lower, upper) = centered_range(
            tick,
            self.config.tick_range,
            self.state.position.tick_spacing,
        );
        self.state.position.set_range(lower, upper, tick);
        Ok(())
    }

    /// Repay up to `outstanding` of `borrow` debt from the wallet.
    pub(crate) fn repay_from_wallet(
        &mut self,
        collateral: Address,
        borrow: Address,
        outstanding: Decimal,
    ) -> Result<Decimal, StrategyError> {
        let amount = self.state.wallet.balance_of(borrow).min(outstanding);
        if amount <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        let result = self.venue.repay(collateral, borrow, amount)?;
        self.state.wallet.debit(borrow, result.amount_repaid)?;
        self.state.wallet.credit(collateral, result.collateral_returned);
        debug!(
            repaid = %result.amount_repaid,
            collateral_returned = %result.collateral_returned,
            debt_remaining = %result.debt_remaining,
            "debt repaid"
        );
        Ok(result.amount_repaid)
    }

    /// Repay reverse debt (B collateral, A borrowed) with underlying on hand.
    pub(crate) fn repay_reverse_debt(&mut self) -> Result<Decimal, StrategyError> {
        let debts = self.pair_debts()?;
        self.repay_from_wallet(self.token_b(), self.token_a(), debts.debt_a)
    }

    /// Repay both orientations with whatever the wallet holds.
    pub(crate) fn repay_available(&mut self) -> Result<(), StrategyError> {
        let debts = self.pair_debts()?;
        self.repay_from_wallet(self.token_a(), self.token_b(), debts.debt_b)?;
        self.repay_from_wallet(self.token_b(), self.token_a(), debts.debt_a)?;
        Ok(())
    }

    /// Keep the deferred-unwind flag in step with liquidity and debt.
    pub(crate) fn refresh_deferred_unwind(&mut self) -> Result<(), StrategyError> {
        let dust = self.dust();
        let debts = self.pair_debts()?;
        let deferred =
            !self.state.position.has_liquidity() && !debts.is_empty(dust.a, dust.b);
        if deferred && !self.state.position.deferred_unwind {
            info!(debt_a = %debts.debt_a, debt_b = %debts.debt_b, "unwind deferred with debt outstanding");
        }
        self.state.position.deferred_unwind = deferred;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Swap legs
    // -----------------------------------------------------------------------

    pub(crate) fn swap_through_pool(
        &mut self,
        direction: SwapDirection,
        amount: Decimal,
    ) -> Result<(Decimal, Decimal), StrategyError> {
        let (token_in, token_out) = self.swap_tokens(direction);
        self.state.wallet.debit(token_in, amount)?;
        let received = self.venue.swap(token_in, amount)?;
        self.state.wallet.credit(token_out, received);
        self.check_slippage(token_in, token_out, amount, received)?;
        debug!(direction = direction.as_str(), %amount, %received, "pool swap");
        Ok((amount, received))
    }

    pub(crate) fn swap_via_liquidator(
        &mut self,
        token_in: Address,
        token_out: Address,
        amount: Decimal,
    ) -> Result<(Decimal, Decimal), StrategyError> {
        self.state.wallet.debit(token_in, amount)?;
        let received = self.venue.liquidate(token_in, token_out, amount)?;
        self.state.wallet.credit(token_out, received);
        self.check_slippage(token_in, token_out, amount, received)?;
        debug!(%token_in, %amount, %received, "liquidator swap");
        Ok((amount, received))
    }

    /// Execute an aggregator payload and measure its effect by balance delta.
    pub(crate) fn swap_via_aggregator(
        &mut self,
        token_in: Address,
        token_out: Address,
        amount: Decimal,
        aggregator: Address,
        payload: &[u8],
    ) -> Result<(Decimal, Decimal), StrategyError> {
        let balance_in = self.state.wallet.balance_of(token_in);
        if amount > balance_in {
            return Err(StrategyError::InvalidState {
                reason: format!("swap amount {amount} exceeds balance {balance_in}"),
            });
        }
        let balance_out = self.state.wallet.balance_of(token_out);

        if !self.venue.call(aggregator, payload, &mut self.state.wallet)? {
            return Err(StrategyError::SwapFailed {
                reason: format!("aggregator call to {aggregator} reverted"),
            });
        }

        let spent = balance_in - self.state.wallet.balance_of(token_in);
        if spent > amount {
            return Err(StrategyError::SwapFailed {
                reason: format!("aggregator spent {spent}, approved {amount}"),
            });
        }
        let received = self.state.wallet.balance_of(token_out) - balance_out;
        self.check_slippage(token_in, token_out, amount, received)?;
        debug!(%aggregator, %spent, %received, "aggregator swap");
        Ok((spent, received))
    }

    /// Reject output below the oracle expectation minus max slippage.
    fn check_slippage(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: Decimal,
        received: Decimal,
    ) -> Result<(), StrategyError> {
        let min_expected = decision::min_swap_output(
            amount_in,
            self.oracle_price(token_in)?,
            self.oracle_price(token_out)?,
            self.config.max_slippage_bps,
        );
        if received < min_expected {
            return Err(StrategyError::SlippageExceeded {
                received,
                min_expected,
            });
        }
        Ok(())
    }

    /// Compare caller-supplied swap parameters with a freshly derived quote.
    pub(crate) fn check_against_quote(
        &self,
        expected_direction: SwapDirection,
        expected_amount: Decimal,
        direction: SwapDirection,
        amount: Decimal,
    ) -> Result<(), StrategyError> {
        if expected_amount.is_zero() {
            if amount > self.dust().for_direction(direction) {
                return Err(StrategyError::StaleQuote {
                    reason: format!("no swap needed, got {amount}"),
                });
            }
            return Ok(());
        }
        if direction != expected_direction {
            return Err(StrategyError::StaleQuote {
                reason: format!(
                    "direction {} does not match current {}",
                    direction.as_str(),
                    expected_direction.as_str()
                ),
            });
        }
        if !decision::within_tolerance(expected_amount, amount, self.config.quote_tolerance_bps) {
            return Err(StrategyError::StaleQuote {
                reason: format!(
                    "amount {amount} outside {} bps of current {expected_amount}",
                    self.config.quote_tolerance_bps
                ),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Shared reads
    // -----------------------------------------------------------------------

    pub(crate) fn evaluate_fuses(&self) -> Result<FuseEvaluation, StrategyError> {
        let prices = self.prices()?;
        self.state.fuses.evaluate(prices.a_in_b())
    }

    /// Lending-oracle price; zero is a hard failure.
    pub(crate) fn oracle_price(&self, asset: Address) -> Result<Decimal, StrategyError> {
        let price = self.venue.price(asset)?;
        if price <= Decimal::ZERO {
            return Err(StrategyError::ZeroPriceOrOracleFailure {
                asset,
                reason: format!("oracle returned {price}"),
            });
        }
        Ok(price)
    }

    pub(crate) fn prices(&self) -> Result<PairPrices, StrategyError> {
        Ok(PairPrices {
            a: self.oracle_price(self.token_a())?,
            b: self.oracle_price(self.token_b())?,
        })
    }

    pub(crate) fn pair_debts(&self) -> Result<PairDebts, StrategyError> {
        let snapshot = self.venue.debt_snapshot()?;
        Ok(PairDebts::from_snapshot(
            &snapshot,
            self.token_a(),
            self.token_b(),
        ))
    }

    /// Current value of the pool position as `(a, b)`.
    pub(crate) fn lp_amounts(&self) -> Result<(Decimal, Decimal), StrategyError> {
        let position = &self.state.position;
        if !position.has_liquidity() {
            return Ok((Decimal::ZERO, Decimal::ZERO));
        }
        let (amount0, amount1) = self.venue.position_amounts(
            position.lower_tick,
            position.upper_tick,
            position.total_liquidity,
        )?;
        Ok(self.from_pool_order(amount0, amount1))
    }

    /// Wallet plus pool position, as `(a, b)`.
    pub(crate) fn holdings(&self) -> Result<(Decimal, Decimal), StrategyError> {
        let (lp_a, lp_b) = self.lp_amounts()?;
        Ok((
            self.state.wallet.balance_of(self.token_a()) + lp_a,
            self.state.wallet.balance_of(self.token_b()) + lp_b,
        ))
    }

    pub(crate) fn dust(&self) -> DustThresholds {
        DustThresholds {
            a: self.config.token_a.swap_threshold,
            b: self.config.token_b.swap_threshold,
        }
    }

    pub(crate) fn to_pool_order(&self, a: Decimal, b: Decimal) -> (Decimal, Decimal) {
        if self.a_is_token0 {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub(crate) fn from_pool_order(&self, amount0: Decimal, amount1: Decimal) -> (Decimal, Decimal) {
        self.to_pool_order(amount0, amount1)
    }

    pub(crate) fn truncate_a(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.config.token_a.decimals, RoundingStrategy::ToZero)
    }

    pub(crate) fn truncate_b(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.config.token_b.decimals, RoundingStrategy::ToZero)
    }

    /// Truncate a swap amount to the decimals of the token being sold.
    pub(crate) fn truncate_sold(&self, direction: SwapDirection, amount: Decimal) -> Decimal {
        match direction {
            SwapDirection::AToB => self.truncate_a(amount),
            SwapDirection::BToA => self.truncate_b(amount),
        }
    }
}
