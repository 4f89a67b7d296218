use alloy::primitives::Address;
use anyhow::{bail, Result};
use rust_decimal::Decimal;

use super::types::{Config, TokenConfig};
use crate::constants::MAX_FULL_WITHDRAW_STEPS;

/// Largest fee or tolerance expressible in basis points.
const MAX_BPS: u32 = 10_000;

/// `rust_decimal` keeps at most 28 fractional digits.
const MAX_TOKEN_DECIMALS: u32 = 28;

/// Validate invariants across the merged config that serde alone cannot
/// enforce. Called automatically by [`super::load_config`].
pub fn validate_config(config: &Config) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    validate_app_config(config, &mut errors);
    validate_strategy_config(config, &mut errors);
    validate_keeper_config(config, &mut errors);
    validate_simulation_config(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        let msg = format!(
            "Configuration validation failed ({} error{}):\n  - {}",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" },
            errors.join("\n  - ")
        );
        bail!("{msg}");
    }
}

// ---------------------------------------------------------------------------
// App config
// ---------------------------------------------------------------------------

fn validate_app_config(config: &Config, errors: &mut Vec<String>) {
    if config.app.logging.log_dir.is_empty() {
        errors.push("app.logging: log_dir is empty".into());
    }
    if config.app.logging.file_name.is_empty() {
        errors.push("app.logging: file_name is empty".into());
    }
}

// ---------------------------------------------------------------------------
// Strategy config
// ---------------------------------------------------------------------------

fn validate_strategy_config(config: &Config, errors: &mut Vec<String>) {
    let s = &config.strategy;

    validate_token("strategy.token_a", &s.token_a, errors);
    validate_token("strategy.token_b", &s.token_b, errors);
    if s.token_a.address == s.token_b.address {
        errors.push(format!(
            "strategy: token_a and token_b must differ, both are {}",
            s.token_a.address
        ));
    }

    if s.rebalance_tick_range < 0 {
        errors.push(format!(
            "strategy: rebalance_tick_range ({}) must be >= 0",
            s.rebalance_tick_range
        ));
    }
    if s.tick_range < s.rebalance_tick_range {
        errors.push(format!(
            "strategy: tick_range ({}) must be >= rebalance_tick_range ({})",
            s.tick_range, s.rebalance_tick_range
        ));
    }

    for (name, thresholds) in [("fuse_a", &s.fuse_a), ("fuse_b", &s.fuse_b)] {
        if let Err(reason) = thresholds.validate() {
            errors.push(format!("strategy.{name}: {reason}"));
        }
    }

    for (name, bps) in [
        ("max_slippage_bps", s.max_slippage_bps),
        ("quote_tolerance_bps", s.quote_tolerance_bps),
        ("swap_buffer_bps", s.swap_buffer_bps),
    ] {
        if bps >= MAX_BPS {
            errors.push(format!("strategy.{name}: {bps} must be < {MAX_BPS}"));
        }
    }
}

fn validate_token(path: &str, token: &TokenConfig, errors: &mut Vec<String>) {
    if token.symbol.is_empty() {
        errors.push(format!("{path}: symbol is empty"));
    }
    if let Err(e) = validate_address(token.address) {
        errors.push(format!("{path}.address: {e}"));
    }
    if token.decimals > MAX_TOKEN_DECIMALS {
        errors.push(format!(
            "{path}: decimals ({}) must be <= {MAX_TOKEN_DECIMALS}",
            token.decimals
        ));
    }
    if token.swap_threshold < Decimal::ZERO {
        errors.push(format!(
            "{path}: swap_threshold ({}) must be >= 0",
            token.swap_threshold
        ));
    }
}

// ---------------------------------------------------------------------------
// Keeper config
// ---------------------------------------------------------------------------

fn validate_keeper_config(config: &Config, errors: &mut Vec<String>) {
    let k = &config.keeper;

    if k.interval_seconds == 0 {
        errors.push("keeper: interval_seconds must be > 0".into());
    }
    if k.max_withdraw_steps == 0 || k.max_withdraw_steps > MAX_FULL_WITHDRAW_STEPS {
        errors.push(format!(
            "keeper: max_withdraw_steps ({}) must be in [1, {MAX_FULL_WITHDRAW_STEPS}]",
            k.max_withdraw_steps
        ));
    }
    if k.event_channel_capacity == 0 {
        errors.push("keeper: event_channel_capacity must be > 0".into());
    }
}

// ---------------------------------------------------------------------------
// Simulation config
// ---------------------------------------------------------------------------

fn validate_simulation_config(config: &Config, errors: &mut Vec<String>) {
    let sim = &config.simulation;

    if let Err(e) = validate_address(sim.pool.address) {
        errors.push(format!("simulation.pool.address: {e}"));
    }
    if sim.pool.tick_spacing <= 0 {
        errors.push(format!(
            "simulation.pool: tick_spacing ({}) must be > 0",
            sim.pool.tick_spacing
        ));
    }
    if sim.pool.liquidity <= Decimal::ZERO {
        errors.push("simulation.pool: liquidity must be > 0".into());
    }

    if sim.lending.borrow_ratio <= Decimal::ZERO || sim.lending.borrow_ratio >= Decimal::ONE {
        errors.push(format!(
            "simulation.lending: borrow_ratio ({}) must be in (0, 1)",
            sim.lending.borrow_ratio
        ));
    }

    if let Err(e) = validate_address(sim.aggregator.router) {
        errors.push(format!("simulation.aggregator.router: {e}"));
    }

    for (name, bps) in [
        ("pool.fee_bps", sim.pool.fee_bps),
        ("aggregator.fee_bps", sim.aggregator.fee_bps),
        ("liquidator_fee_bps", sim.liquidator_fee_bps),
    ] {
        if bps >= config.strategy.max_slippage_bps {
            errors.push(format!(
                "simulation.{name}: {bps} must be < strategy.max_slippage_bps ({}) or every swap fails",
                config.strategy.max_slippage_bps
            ));
        }
    }

    if sim.price_a <= Decimal::ZERO || sim.price_b <= Decimal::ZERO {
        errors.push(format!(
            "simulation: prices must be > 0, got price_a={} price_b={}",
            sim.price_a, sim.price_b
        ));
    }
    if sim.deposit_amount <= Decimal::ZERO {
        errors.push("simulation: deposit_amount must be > 0".into());
    }
    if let Some(bad) = sim.price_walk.iter().find(|m| **m <= Decimal::ZERO) {
        errors.push(format!("simulation.price_walk: multiplier {bad} must be > 0"));
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_address(addr: Address) -> Result<(), String> {
    if addr == Address::ZERO {
        return Err("address is zero".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, LoggingConfig};
    use crate::sim::fixtures::{keeper_config, sim_config, strategy_config};
    use crate::types::FuseThresholds;
    use rust_decimal_macros::dec;

    fn valid_config() -> Config {
        Config {
            app: AppConfig {
                name: "converter-sim".into(),
                logging: LoggingConfig {
                    log_dir: "logs".into(),
                    file_name: "strategy.log".into(),
                },
            },
            strategy: strategy_config(),
            keeper: keeper_config(),
            simulation: sim_config(),
        }
    }

    fn error_message(config: &Config) -> String {
        validate_config(config).unwrap_err().to_string()
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_tick_range_ordering() {
        let mut config = valid_config();
        config.strategy.rebalance_tick_range = 300;
        assert!(error_message(&config).contains("must be >= rebalance_tick_range"));

        config.strategy.rebalance_tick_range = -1;
        assert!(error_message(&config).contains("rebalance_tick_range (-1) must be >= 0"));
    }

    #[test]
    fn test_fuse_thresholds_checked() {
        let mut config = valid_config();
        config.strategy.fuse_b =
            FuseThresholds::from_array([dec!(1.1), dec!(1.0), dec!(1.3), dec!(1.2)]);
        assert!(error_message(&config).contains("strategy.fuse_b"));
    }

    #[test]
    fn test_duplicate_and_zero_tokens() {
        let mut config = valid_config();
        config.strategy.token_b.address = config.strategy.token_a.address;
        assert!(error_message(&config).contains("must differ"));

        config.strategy.token_b.address = Address::ZERO;
        assert!(error_message(&config).contains("token_b.address: address is zero"));
    }

    #[test]
    fn test_keeper_bounds() {
        let mut config = valid_config();
        config.keeper.max_withdraw_steps = MAX_FULL_WITHDRAW_STEPS + 1;
        config.keeper.interval_seconds = 0;
        let msg = error_message(&config);
        assert!(msg.contains("max_withdraw_steps"));
        assert!(msg.contains("interval_seconds"));
        assert!(msg.contains("(2 errors)"));
    }

    #[test]
    fn test_fee_above_slippage_rejected() {
        let mut config = valid_config();
        config.simulation.liquidator_fee_bps = 150;
        assert!(error_message(&config).contains("liquidator_fee_bps"));
    }

    #[test]
    fn test_simulation_prices_and_walk() {
        let mut config = valid_config();
        config.simulation.price_b = Decimal::ZERO;
        config.simulation.price_walk = vec![dec!(1.1), dec!(-1)];
        let msg = error_message(&config);
        assert!(msg.contains("prices must be > 0"));
        assert!(msg.contains("multiplier -1"));
    }

    #[test]
    fn test_borrow_ratio_range() {
        let mut config = valid_config();
        config.simulation.lending.borrow_ratio = dec!(1.2);
        assert!(error_message(&config).contains("borrow_ratio"));
    }
}
