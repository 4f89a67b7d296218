use std::path::PathBuf;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{info, warn};

use converter_strategy::config;
use converter_strategy::core::keeper::{Keeper, KeeperEvent};
use converter_strategy::core::strategy::PairStrategy;
use converter_strategy::core::vault::Vault;
use converter_strategy::logging;
use converter_strategy::sim::{OracleQuoteProvider, SimMarket};
use converter_strategy::types::FuseSide;

#[derive(Debug, Default)]
struct EventTally {
    rebalances: usize,
    failures: usize,
}

impl EventTally {
    fn drain(&mut self, rx: &mut mpsc::Receiver<KeeperEvent>) {
        while let Ok(event) = rx.try_recv() {
            match event {
                KeeperEvent::Rebalanced { .. } => self.rebalances += 1,
                KeeperEvent::TickFailed { .. } => self.failures += 1,
                KeeperEvent::UnwindStep { .. } => {}
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignore if missing).
    let _ = dotenvy::dotenv();

    let config_dir = std::env::var("STRATEGY_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let config = config::load_config(&config_dir)?;

    // Hold the guard for the process lifetime.
    let _guard = logging::init_tracing(&config.app.logging)?;

    info!(
        name = %config.app.name,
        kind = config.strategy.kind.as_str(),
        pair = %format!("{}/{}", config.strategy.token_a.symbol, config.strategy.token_b.symbol),
        walk_len = config.simulation.price_walk.len(),
        "converter simulator starting"
    );

    // -----------------------------------------------------------------------
    // Venue, strategy, vault
    // -----------------------------------------------------------------------

    let sim = &config.simulation;
    let token_a = config.strategy.token_a.address;
    let token_b = config.strategy.token_b.address;

    let market = SimMarket::from_config(sim, token_a, token_b)
        .context("failed to build simulated market")?;
    let strategy = PairStrategy::new(market.clone(), config.strategy.clone())
        .context("failed to initialise strategy")?;
    let mut vault = Vault::new(strategy, config.keeper.max_withdraw_steps);

    let shares = vault
        .deposit(sim.depositor, sim.deposit_amount)
        .context("initial deposit failed")?;
    info!(depositor = %sim.depositor, amount = %sim.deposit_amount, %shares, "initial deposit");

    // -----------------------------------------------------------------------
    // Keeper over the price walk
    // -----------------------------------------------------------------------

    let (event_tx, mut event_rx) = mpsc::channel(config.keeper.event_channel_capacity);
    let mut keeper = Keeper::new(
        OracleQuoteProvider::new(market.clone()),
        config.keeper.clone(),
        event_tx,
    );
    let mut tally = EventTally::default();

    for (step, multiplier) in sim.price_walk.iter().enumerate() {
        let price_b = sim.price_b * multiplier;
        market
            .set_price(token_b, price_b)
            .with_context(|| format!("failed to move price at step {step}"))?;

        match keeper.tick(vault.strategy_mut()).await {
            Ok(Some(outcome)) => info!(
                step,
                mode = outcome.mode.as_str(),
                lower = outcome.lower_tick,
                upper = outcome.upper_tick,
                "rebalanced"
            ),
            Ok(None) => {
                if let Err(e) = vault.do_hard_work() {
                    warn!(step, error = %e, "hard work skipped");
                }
            }
            Err(e) => warn!(step, error = %e, retryable = e.is_retryable(), "keeper tick failed"),
        }
        tally.drain(&mut event_rx);

        let locked = vault
            .strategy()
            .get_locked_underlying_amount()
            .context("failed to read locked amount")?;
        info!(
            step,
            %price_b,
            share_price = %vault.share_price()?,
            locked = %locked.estimated_underlying_amount,
            total_assets = %locked.total_assets,
            fuse_a = vault.strategy().fuse_status(FuseSide::A).as_str(),
            fuse_b = vault.strategy().fuse_status(FuseSide::B).as_str(),
            "walk step"
        );
    }

    // -----------------------------------------------------------------------
    // Unwind and report
    // -----------------------------------------------------------------------

    let paid = vault
        .withdraw_all(sim.depositor)
        .context("final withdrawal failed")?;
    let pnl = paid - sim.deposit_amount;
    let pnl_bps = if sim.deposit_amount.is_zero() {
        Decimal::ZERO
    } else {
        (pnl / sim.deposit_amount * Decimal::from(10_000)).round_dp(2)
    };

    info!(
        %paid,
        %pnl,
        %pnl_bps,
        rebalances = tally.rebalances,
        failures = tally.failures,
        "simulation complete"
    );

    let summary = serde_json::json!({
        "deposited": sim.deposit_amount.to_string(),
        "withdrawn": paid.to_string(),
        "pnl_bps": pnl_bps.to_string(),
        "rebalances": tally.rebalances,
        "failed_ticks": tally.failures,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
