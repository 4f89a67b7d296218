//! Staged unwind: quote the next incremental swap, execute one step, repeat
//! until `completed`.
//!
//! A step never trusts its arguments beyond tolerance. It re-derives the
//! quote from live state after exiting the pool (and, for
//! `RepaySwapRepay`, after the first repay) and rejects stale parameters.

use alloy::primitives::Address;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::decision::{self, PairPrices};
use super::strategy::PairStrategy;
use crate::errors::StrategyError;
use crate::execution::Venue;
use crate::types::{
    EntryToPool, PairDebts, PlanParams, SwapDirection, Wad, WithdrawPlan, WithdrawQuote,
};

/// `proportion_not_underlying` as a fraction, rejected outside `[0, 1]`.
fn plan_proportion(plan: &PlanParams) -> Result<Decimal, StrategyError> {
    let proportion = plan.proportion_not_underlying;
    if proportion > Wad::ONE {
        return Err(StrategyError::InvalidState {
            reason: format!("proportion_not_underlying {proportion} exceeds 1"),
        });
    }
    proportion.to_decimal().ok_or_else(|| StrategyError::InvalidState {
        reason: format!("proportion_not_underlying {proportion} out of range"),
    })
}

impl<V: Venue> PairStrategy<V> {
    /// Next swap of the unwind for `plan`, or [`WithdrawQuote::none`].
    ///
    /// Pure: two calls without an intervening mutation return the same quote.
    pub fn quote_withdraw_by_agg(&self, plan: &PlanParams) -> Result<WithdrawQuote, StrategyError> {
        let prices = self.prices()?;
        let (a, b) = self.holdings()?;
        let debts = self.pair_debts()?;
        self.plan_withdraw_swap(plan, a, b, debts, prices)
    }

    fn plan_withdraw_swap(
        &self,
        plan: &PlanParams,
        mut a: Decimal,
        mut b: Decimal,
        mut debts: PairDebts,
        prices: PairPrices,
    ) -> Result<WithdrawQuote, StrategyError> {
        let proportion = plan_proportion(plan)?;
        let (token_a, token_b) = (self.token_a(), self.token_b());
        let dust = self.dust();
        let buffer = decision::bps_multiplier(self.config.swap_buffer_bps);

        if plan.kind == WithdrawPlan::RepaySwapRepay {
            if debts.debt_b > Decimal::ZERO && b > Decimal::ZERO {
                let repay = self.venue.quote_repay(token_a, token_b, b.min(debts.debt_b))?;
                b -= repay.amount_repaid;
                a += repay.collateral_returned;
                debts.debt_b -= repay.amount_repaid;
            }
            if debts.debt_a > Decimal::ZERO && a > Decimal::ZERO {
                let repay = self.venue.quote_repay(token_b, token_a, a.min(debts.debt_a))?;
                a -= repay.amount_repaid;
                b += repay.collateral_returned;
                debts.debt_a -= repay.amount_repaid;
            }
        }

        let swap = if plan.kind.repays() && debts.debt_b > dust.b && b < debts.debt_b {
            let amount = prices.b_to_a(debts.debt_b * buffer - b).min(a);
            Some((SwapDirection::AToB, amount))
        } else if plan.kind.repays() && debts.debt_a > dust.a && a < debts.debt_a {
            let amount = prices.a_to_b(debts.debt_a * buffer - a).min(b);
            Some((SwapDirection::BToA, amount))
        } else {
            decision::proportion_swap(
                a - debts.debt_a,
                b - debts.debt_b,
                proportion,
                prices,
                dust,
            )
        };

        let Some((direction, amount)) = swap else {
            return Ok(WithdrawQuote::none());
        };
        let amount = match (plan.max_swap_value, direction) {
            (Some(cap), SwapDirection::AToB) => amount.min(cap),
            (Some(cap), SwapDirection::BToA) => amount.min(prices.a_to_b(cap)),
            (None, _) => amount,
        };
        let amount = self.truncate_sold(direction, amount);
        if amount <= dust.for_direction(direction) {
            return Ok(WithdrawQuote::none());
        }
        let (token_in, _) = self.swap_tokens(direction);
        Ok(WithdrawQuote {
            token_to_swap: Some(token_in),
            amount_to_swap: amount,
        })
    }

    /// Execute one unwind step. Returns `completed`: no debt above dust and
    /// no further swap needed for the plan's proportion.
    ///
    /// `aggregator == Address::ZERO` routes the swap through the liquidator
    /// and ignores `payload`.
    #[allow(clippy::too_many_arguments)]
    pub fn withdraw_by_agg_step(
        &mut self,
        token_to_swap: Option<Address>,
        aggregator: Address,
        amount_to_swap: Decimal,
        payload: &[u8],
        plan: &PlanParams,
        entry_to_pool: EntryToPool,
    ) -> Result<bool, StrategyError> {
        plan_proportion(plan)?;
        self.atomically(|s| {
            s.exit_pool()?;
            if plan.kind == WithdrawPlan::RepaySwapRepay {
                s.repay_available()?;
            }

            if let Some(token_in) = token_to_swap {
                let fresh = s.quote_withdraw_by_agg(plan)?;
                s.check_withdraw_quote(&fresh, token_in, amount_to_swap)?;
                let token_out = s.counter_token(token_in)?;
                if aggregator == Address::ZERO {
                    s.swap_via_liquidator(token_in, token_out, amount_to_swap)?;
                } else {
                    s.swap_via_aggregator(token_in, token_out, amount_to_swap, aggregator, payload)?;
                }
            }

            if plan.kind.repays() {
                s.repay_available()?;
            }

            let dust = s.dust();
            let debts = s.pair_debts()?;
            let completed =
                debts.is_empty(dust.a, dust.b) && s.quote_withdraw_by_agg(plan)?.is_none();

            if entry_to_pool.allows(completed) {
                let evaluation = s.evaluate_fuses()?;
                if evaluation.allows_exposure() {
                    s.reset_range()?;
                    s.enter_pool()?;
                } else {
                    debug!("re-entry skipped: fuse blocks exposure");
                }
            }
            s.refresh_deferred_unwind()?;

            info!(
                plan = plan.kind.as_str(),
                swapped = ?token_to_swap,
                amount = %amount_to_swap,
                debt_a = %debts.debt_a,
                debt_b = %debts.debt_b,
                completed,
                "withdraw step"
            );
            Ok(completed)
        })
    }

    /// Withdraw `amount` of underlying for the vault by unwinding a
    /// proportional slice of the position through the liquidator.
    ///
    /// Swap costs of the slice are charged to the amount paid out.
    pub fn withdraw_underlying(&mut self, amount: Decimal) -> Result<Decimal, StrategyError> {
        self.atomically(|s| {
            let token_a = s.token_a();
            let token_b = s.token_b();
            if s.state.wallet.balance_of(token_a) >= amount {
                return s.release_underlying(amount);
            }
            let before = s.total_assets()?;
            if before <= Decimal::ZERO {
                return Err(StrategyError::Vault {
                    reason: "strategy holds no assets".into(),
                });
            }
            let fraction = (amount / before).min(Decimal::ONE);
            s.exit_fraction(fraction)?;

            let prices = s.prices()?;
            let buffer = decision::bps_multiplier(s.config.swap_buffer_bps);
            let debts = s.pair_debts()?;

            let need_b = debts.debt_b * fraction;
            let held_b = s.state.wallet.balance_of(token_b);
            if held_b < need_b {
                let sell_a = s.truncate_a(
                    prices
                        .b_to_a((need_b - held_b) * buffer)
                        .min(s.state.wallet.balance_of(token_a)),
                );
                if sell_a > s.dust().a {
                    s.swap_via_liquidator(token_a, token_b, sell_a)?;
                }
            }
            s.repay_from_wallet(token_a, token_b, need_b)?;

            let need_a = debts.debt_a * fraction;
            let held_a = s.state.wallet.balance_of(token_a);
            if held_a < need_a {
                let sell_b = s.truncate_b(
                    prices
                        .a_to_b((need_a - held_a) * buffer)
                        .min(s.state.wallet.balance_of(token_b)),
                );
                if sell_b > s.dust().b {
                    s.swap_via_liquidator(token_b, token_a, sell_b)?;
                }
            }
            s.repay_from_wallet(token_b, token_a, need_a)?;

            let leftover_b = s.truncate_b(s.state.wallet.balance_of(token_b));
            if leftover_b > s.dust().b {
                s.swap_via_liquidator(token_b, token_a, leftover_b)?;
            }

            let cost = (before - s.total_assets()?).max(Decimal::ZERO);
            let payout = s.truncate_a(
                (amount - cost)
                    .max(Decimal::ZERO)
                    .min(s.state.wallet.balance_of(token_a)),
            );
            s.refresh_deferred_unwind()?;
            debug!(%amount, %fraction, %cost, %payout, "partial withdrawal");
            s.release_underlying(payout)
        })
    }

    /// Drive liquidator-backed `RepaySwapRepay` steps to completion and hand
    /// every unit of underlying back.
    pub fn withdraw_all_underlying(&mut self, max_steps: usize) -> Result<Decimal, StrategyError> {
        self.atomically(|s| {
            let plan = PlanParams::full_unwind(WithdrawPlan::RepaySwapRepay);
            let mut completed = false;
            let mut steps = 0;
            while steps < max_steps {
                let quote = s.quote_withdraw_by_agg(&plan)?;
                steps += 1;
                completed = s.withdraw_by_agg_step(
                    quote.token_to_swap,
                    Address::ZERO,
                    quote.amount_to_swap,
                    &[],
                    &plan,
                    EntryToPool::None,
                )?;
                if completed {
                    break;
                }
            }
            if !completed {
                return Err(StrategyError::DebtUnwindIncomplete { steps });
            }
            let balance = s.state.wallet.balance_of(s.token_a());
            info!(steps, %balance, "full unwind complete");
            s.release_underlying(balance)
        })
    }

    /// Burn `fraction` of the deposited liquidity into the wallet.
    fn exit_fraction(&mut self, fraction: Decimal) -> Result<(), StrategyError> {
        if fraction >= Decimal::ONE {
            self.exit_pool()?;
            return Ok(());
        }
        let position = &self.state.position;
        let liquidity = position.total_liquidity * fraction;
        if liquidity <= Decimal::ZERO {
            return Ok(());
        }
        let (amount0, amount1) =
            self.venue
                .burn_position(position.lower_tick, position.upper_tick, liquidity)?;
        let (a, b) = self.from_pool_order(amount0, amount1);
        self.state.wallet.credit(self.token_a(), a);
        self.state.wallet.credit(self.token_b(), b);
        self.state.position.total_liquidity -= liquidity;
        Ok(())
    }

    fn check_withdraw_quote(
        &self,
        fresh: &WithdrawQuote,
        token_in: Address,
        amount: Decimal,
    ) -> Result<(), StrategyError> {
        if fresh.token_to_swap != Some(token_in) {
            return Err(StrategyError::StaleQuote {
                reason: format!(
                    "swap of {token_in} requested, current plan swaps {:?}",
                    fresh.token_to_swap
                ),
            });
        }
        if !decision::within_tolerance(fresh.amount_to_swap, amount, self.config.quote_tolerance_bps)
        {
            return Err(StrategyError::StaleQuote {
                reason: format!(
                    "amount {amount} outside {} bps of current {}",
                    self.config.quote_tolerance_bps, fresh.amount_to_swap
                ),
            });
        }
        let balance = self.state.wallet.balance_of(token_in);
        if amount > balance {
            return Err(StrategyError::InvalidState {
                reason: format!("swap amount {amount} exceeds balance {balance}"),
            });
        }
        Ok(())
    }

    pub(crate) fn counter_token(&self, token: Address) -> Result<Address, StrategyError> {
        if token == self.token_a() {
            Ok(self.token_b())
        } else if token == self.token_b() {
            Ok(self.token_a())
        } else {
            Err(StrategyError::InvalidState {
                reason: format!("{token} is not a strategy token"),
            })
        }
    }
}
