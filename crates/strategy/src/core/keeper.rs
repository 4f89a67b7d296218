//! Keeper: periodic rebalance driver and staged-unwind runner.
//!
//! Each tick checks `need_rebalance`, sizes the swap, fetches an aggregator
//! payload through the injected [`SwapQuoteProvider`] and executes the
//! matching rebalance mode. Outcomes go out as [`KeeperEvent`]s on a bounded
//! channel. The loop stops when its `CancellationToken` is cancelled.

use std::time::Duration;

use alloy::primitives::Address;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::strategy::PairStrategy;
use crate::config::KeeperConfig;
use crate::errors::StrategyError;
use crate::execution::{SwapQuoteProvider, Venue};
use crate::types::{
    AggregatorSwapArgs, EntryToPool, PlanParams, RebalanceOutcome, SwapQuoteRequest,
};

/// Consecutive failed ticks before the keeper escalates to `error!`.
const FAILURE_ALERT_THRESHOLD: u32 = 3;

#[derive(Debug, Clone)]
pub enum KeeperEvent {
    Rebalanced {
        outcome: RebalanceOutcome,
        timestamp: i64,
    },
    UnwindStep {
        step: usize,
        completed: bool,
        timestamp: i64,
    },
    TickFailed {
        error: String,
        retryable: bool,
        timestamp: i64,
    },
}

pub struct Keeper<Q: SwapQuoteProvider> {
    provider: Q,
    config: KeeperConfig,
    event_tx: mpsc::Sender<KeeperEvent>,
    consecutive_failures: u32,
}

impl<Q: SwapQuoteProvider> Keeper<Q> {
    pub fn new(provider: Q, config: KeeperConfig, event_tx: mpsc::Sender<KeeperEvent>) -> Self {
        Self {
            provider,
            config,
            event_tx,
            consecutive_failures: 0,
        }
    }

    /// Poll until `shutdown` fires. Returns the number of rebalances run.
    pub async fn run<V: Venue>(
        &mut self,
        strategy: &mut PairStrategy<V>,
        shutdown: CancellationToken,
    ) -> usize {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.interval_seconds));
        let mut rebalances = 0;
        info!(interval_seconds = self.config.interval_seconds, "keeper started");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    info!(rebalances, "keeper shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    match self.tick(strategy).await {
                        Ok(Some(_)) => {
                            rebalances += 1;
                            self.consecutive_failures = 0;
                        }
                        Ok(None) => self.consecutive_failures = 0,
                        Err(e) => self.record_failure(&e).await,
                    }
                }
            }
        }
        rebalances
    }

    /// One keeper pass. `None` when no rebalance was due.
    pub async fn tick<V: Venue>(
        &mut self,
        strategy: &mut PairStrategy<V>,
    ) -> Result<Option<RebalanceOutcome>, StrategyError> {
        if !strategy.need_rebalance()? {
            debug!("no rebalance needed");
            return Ok(None);
        }
        let quote = strategy.quote_rebalance_swap()?;

        let outcome = if !quote.requires_swap() {
            strategy.rebalance_no_swap()?
        } else {
            let (token_in, token_out) = strategy.swap_tokens(quote.direction);
            let request = SwapQuoteRequest {
                token_in,
                token_out,
                amount_in: quote.amount_to_swap,
                max_slippage_bps: strategy.config().max_slippage_bps,
            };
            match self.provider.quote(&request).await {
                Ok(agg) => strategy.rebalance_with_aggregator(&AggregatorSwapArgs {
                    direction: quote.direction,
                    amount: quote.amount_to_swap,
                    aggregator: agg.router,
                    payload: agg.payload,
                })?,
                Err(e) if self.config.fallback_to_self_swap => {
                    warn!(error = %e, "aggregator quote failed, falling back to pool swap");
                    strategy.rebalance_self_swap()?
                }
                Err(e) => return Err(e),
            }
        };

        self.emit(KeeperEvent::Rebalanced {
            outcome: outcome.clone(),
            timestamp: chrono::Utc::now().timestamp(),
        })
        .await;
        Ok(Some(outcome))
    }

    /// Drive withdrawal steps with fresh quotes until the plan completes.
    /// Returns the number of steps taken.
    ///
    /// Swaps go through the aggregator; when it cannot quote and fallback is
    /// enabled, the step uses the liquidator instead.
    pub async fn unwind<V: Venue>(
        &mut self,
        strategy: &mut PairStrategy<V>,
        plan: &PlanParams,
        entry_to_pool: EntryToPool,
    ) -> Result<usize, StrategyError> {
        for step in 1..=self.config.max_withdraw_steps {
            let quote = strategy.quote_withdraw_by_agg(plan)?;
            let (aggregator, payload) = match quote.token_to_swap {
                Some(token_in) => {
                    let request = SwapQuoteRequest {
                        token_in,
                        token_out: strategy.counter_token(token_in)?,
                        amount_in: quote.amount_to_swap,
                        max_slippage_bps: strategy.config().max_slippage_bps,
                    };
                    match self.provider.quote(&request).await {
                        Ok(agg) => (agg.router, agg.payload),
                        Err(e) if self.config.fallback_to_self_swap => {
                            warn!(error = %e, "aggregator quote failed, using liquidator");
                            (Address::ZERO, Vec::new())
                        }
                        Err(e) => return Err(e),
                    }
                }
                None => (Address::ZERO, Vec::new()),
            };

            let completed = strategy.withdraw_by_agg_step(
                quote.token_to_swap,
                aggregator,
                quote.amount_to_swap,
                &payload,
                plan,
                entry_to_pool,
            )?;
            self.emit(KeeperEvent::UnwindStep {
                step,
                completed,
                timestamp: chrono::Utc::now().timestamp(),
            })
            .await;
            if completed {
                info!(steps = step, plan = plan.kind.as_str(), "unwind completed");
                return Ok(step);
            }
        }
        Err(StrategyError::DebtUnwindIncomplete {
            steps: self.config.max_withdraw_steps,
        })
    }

    async fn record_failure(&mut self, e: &StrategyError) {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= FAILURE_ALERT_THRESHOLD {
            error!(
                error = %e,
                consecutive_failures = self.consecutive_failures,
                "keeper tick keeps failing"
            );
        } else {
            warn!(error = %e, retryable = e.is_retryable(), "keeper tick failed");
        }
        self.emit(KeeperEvent::TickFailed {
            error: e.to_string(),
            retryable: e.is_retryable(),
            timestamp: chrono::Utc::now().timestamp(),
        })
        .await;
    }

    async fn emit(&self, event: KeeperEvent) {
        if let Err(e) = self.event_tx.send(event).await {
            warn!(error = %e, "failed to send keeper event, channel closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::LendingService;
    use crate::sim::fixtures::{self, keeper_config, TOKEN_B};
    use crate::sim::OracleQuoteProvider;
    use crate::types::{RebalanceMode, WithdrawPlan};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_tick_without_drift_is_idle() {
        let (mut strategy, market) = fixtures::invested_strategy(dec!(1000));
        let (tx, mut rx) = mpsc::channel(8);
        let mut keeper = Keeper::new(OracleQuoteProvider::new(market), keeper_config(), tx);
        assert!(keeper.tick(&mut strategy).await.unwrap().is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_tick_rebalances_through_aggregator() {
        let (mut strategy, market) = fixtures::invested_strategy(dec!(1000));
        let (tx, mut rx) = mpsc::channel(8);
        let mut keeper = Keeper::new(OracleQuoteProvider::new(market.clone()), keeper_config(), tx);
        market.set_price(TOKEN_B, dec!(1.02)).unwrap();

        let outcome = keeper.tick(&mut strategy).await.unwrap().unwrap();
        assert_eq!(outcome.mode, RebalanceMode::Aggregator);
        assert!(!strategy.need_rebalance().unwrap());
        assert!(matches!(rx.try_recv().unwrap(), KeeperEvent::Rebalanced { .. }));
    }

    #[tokio::test]
    async fn test_tick_falls_back_to_self_swap() {
        let (mut strategy, market) = fixtures::invested_strategy(dec!(1000));
        let (tx, _rx) = mpsc::channel(8);
        let mut provider = OracleQuoteProvider::new(market.clone());
        provider.set_available(false);
        let mut keeper = Keeper::new(provider, keeper_config(), tx);
        market.set_price(TOKEN_B, dec!(1.02)).unwrap();

        let outcome = keeper.tick(&mut strategy).await.unwrap().unwrap();
        assert_eq!(outcome.mode, RebalanceMode::SelfSwap);
    }

    #[tokio::test]
    async fn test_tick_without_fallback_propagates_outage() {
        let (mut strategy, market) = fixtures::invested_strategy(dec!(1000));
        let (tx, _rx) = mpsc::channel(8);
        let mut provider = OracleQuoteProvider::new(market.clone());
        provider.set_available(false);
        let config = KeeperConfig {
            fallback_to_self_swap: false,
            ..keeper_config()
        };
        let mut keeper = Keeper::new(provider, config, tx);
        market.set_price(TOKEN_B, dec!(1.02)).unwrap();

        let err = keeper.tick(&mut strategy).await.unwrap_err();
        assert!(matches!(err, StrategyError::AggregatorUnavailable { .. }));
        assert!(strategy.need_rebalance().unwrap());
    }

    #[tokio::test]
    async fn test_unwind_completes_within_budget() {
        let (mut strategy, market) = fixtures::invested_strategy(dec!(1000));
        let (tx, mut rx) = mpsc::channel(32);
        let mut keeper = Keeper::new(OracleQuoteProvider::new(market.clone()), keeper_config(), tx);

        let plan = PlanParams::full_unwind(WithdrawPlan::RepaySwapRepay);
        let steps = keeper
            .unwind(&mut strategy, &plan, EntryToPool::None)
            .await
            .unwrap();
        assert!(steps <= 10);
        assert!(market
            .debt_snapshot()
            .unwrap()
            .iter()
            .all(|p| p.debt_amount <= dec!(0.000001)));
        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event);
        }
        assert!(matches!(last, Some(KeeperEvent::UnwindStep { completed: true, .. })));
        assert!(strategy.wallet().balance_of(fixtures::TOKEN_A) > dec!(990));
    }

    #[tokio::test]
    async fn test_unwind_step_budget_exhausted() {
        let (mut strategy, market) = fixtures::invested_strategy(dec!(1000));
        let (tx, _rx) = mpsc::channel(32);
        let config = KeeperConfig {
            max_withdraw_steps: 1,
            ..keeper_config()
        };
        let mut keeper = Keeper::new(OracleQuoteProvider::new(market), config, tx);
        // Swap-only steps never repay, so the debt outlives the budget.
        let plan = PlanParams::full_unwind(WithdrawPlan::SwapOnly);
        let err = keeper
            .unwind(&mut strategy, &plan, EntryToPool::None)
            .await
            .unwrap_err();
        assert!(matches!(err, StrategyError::DebtUnwindIncomplete { steps: 1 }));
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let (mut strategy, market) = fixtures::invested_strategy(dec!(1000));
        let (tx, mut rx) = mpsc::channel(8);
        let mut keeper = Keeper::new(OracleQuoteProvider::new(market.clone()), keeper_config(), tx);
        market.set_price(TOKEN_B, dec!(1.02)).unwrap();

        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });
        let rebalances = keeper.run(&mut strategy, shutdown).await;
        assert_eq!(rebalances, 1);
        assert!(matches!(rx.try_recv().unwrap(), KeeperEvent::Rebalanced { .. }));
        assert!(strategy.total_assets().unwrap() > Decimal::ZERO);
    }
}
