pub mod types;
pub mod validate;

pub use types::*;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Load and merge all config JSON files into a single [`Config`],
/// then apply environment variable overrides and validate.
///
/// Expected directory layout:
/// ```text
/// config/
///   app.json
///   strategy.json
///   keeper.json
///   simulation.json
/// ```
///
/// # Environment variable overrides
///
/// | Env Var                          | Config Field                       |
/// |----------------------------------|------------------------------------|
/// | `STRATEGY_TICK_RANGE`            | `strategy.tick_range`              |
/// | `STRATEGY_REBALANCE_TICK_RANGE`  | `strategy.rebalance_tick_range`    |
/// | `STRATEGY_MAX_SLIPPAGE_BPS`      | `strategy.max_slippage_bps`        |
/// | `KEEPER_INTERVAL_SECONDS`        | `keeper.interval_seconds`          |
/// | `KEEPER_MAX_WITHDRAW_STEPS`      | `keeper.max_withdraw_steps`        |
/// | `KEEPER_FALLBACK_TO_SELF_SWAP`   | `keeper.fallback_to_self_swap`     |
/// | `SIM_DEPOSIT_AMOUNT`             | `simulation.deposit_amount`        |
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let read = |name: &str| -> Result<String> {
        let path = config_dir.join(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))
    };

    let app: AppConfig = serde_json::from_str(&read("app.json")?).context("parsing app.json")?;

    let strategy: StrategyConfig =
        serde_json::from_str(&read("strategy.json")?).context("parsing strategy.json")?;

    let keeper: KeeperConfig =
        serde_json::from_str(&read("keeper.json")?).context("parsing keeper.json")?;

    let simulation: SimulationConfig =
        serde_json::from_str(&read("simulation.json")?).context("parsing simulation.json")?;

    let mut config = Config {
        app,
        strategy,
        keeper,
        simulation,
    };

    apply_env_overrides(&mut config);
    validate::validate_config(&config)?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Only non-empty env vars take effect. Parse failures are skipped and the
/// JSON value remains.
fn apply_env_overrides(config: &mut Config) {
    // -- Strategy ------------------------------------------------------------
    if let Some(val) = env_parse::<i32>("STRATEGY_TICK_RANGE") {
        info!(val, "env override: STRATEGY_TICK_RANGE");
        config.strategy.tick_range = val;
    }

    if let Some(val) = env_parse::<i32>("STRATEGY_REBALANCE_TICK_RANGE") {
        info!(val, "env override: STRATEGY_REBALANCE_TICK_RANGE");
        config.strategy.rebalance_tick_range = val;
    }

    if let Some(val) = env_parse::<u32>("STRATEGY_MAX_SLIPPAGE_BPS") {
        info!(val, "env override: STRATEGY_MAX_SLIPPAGE_BPS");
        config.strategy.max_slippage_bps = val;
    }

    // -- Keeper --------------------------------------------------------------
    if let Some(val) = env_parse::<u64>("KEEPER_INTERVAL_SECONDS") {
        info!(val, "env override: KEEPER_INTERVAL_SECONDS");
        config.keeper.interval_seconds = val;
    }

    if let Some(val) = env_parse::<usize>("KEEPER_MAX_WITHDRAW_STEPS") {
        info!(val, "env override: KEEPER_MAX_WITHDRAW_STEPS");
        config.keeper.max_withdraw_steps = val;
    }

    if let Some(val) = env_bool("KEEPER_FALLBACK_TO_SELF_SWAP") {
        info!(val, "env override: KEEPER_FALLBACK_TO_SELF_SWAP");
        config.keeper.fallback_to_self_swap = val;
    }

    // -- Simulation ----------------------------------------------------------
    if let Some(val) = env_decimal("SIM_DEPOSIT_AMOUNT") {
        info!(%val, "env override: SIM_DEPOSIT_AMOUNT");
        config.simulation.deposit_amount = val;
    }
}

/// Read a non-empty env var as a `String`.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Read a non-empty env var as a bool (`true`, `1`, `yes` → true).
fn env_bool(key: &str) -> Option<bool> {
    env_string(key).map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
}

/// Read a non-empty env var and parse it as `T`.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

/// Read a non-empty env var and parse it as `Decimal`.
fn env_decimal(key: &str) -> Option<Decimal> {
    env_string(key).and_then(|v| Decimal::from_str(&v).ok())
}
