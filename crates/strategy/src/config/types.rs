use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::constants::{
    DEFAULT_KEEPER_INTERVAL_SECONDS, DEFAULT_MAX_SLIPPAGE_BPS, DEFAULT_MAX_WITHDRAW_STEPS,
    DEFAULT_QUOTE_TOLERANCE_BPS, DEFAULT_SWAP_BUFFER_BPS, DEFAULT_SWAP_THRESHOLD,
    DEFAULT_TOKEN_DECIMALS,
};
use crate::types::{FuseThresholds, StrategyKind};

// ---------------------------------------------------------------------------
// Top-level aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub strategy: StrategyConfig,
    pub keeper: KeeperConfig,
    pub simulation: SimulationConfig,
}

// ---------------------------------------------------------------------------
// app.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    #[serde(default = "default_log_file")]
    pub file_name: String,
}

fn default_log_file() -> String {
    "strategy.log".into()
}

// ---------------------------------------------------------------------------
// strategy.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    /// Underlying asset.
    pub token_a: TokenConfig,
    /// Paired asset.
    pub token_b: TokenConfig,
    pub tick_range: i32,
    pub rebalance_tick_range: i32,
    #[serde(default)]
    pub fuse_a: FuseThresholds,
    #[serde(default)]
    pub fuse_b: FuseThresholds,
    #[serde(default = "default_max_slippage_bps")]
    pub max_slippage_bps: u32,
    #[serde(default = "default_quote_tolerance_bps")]
    pub quote_tolerance_bps: u32,
    /// Extra secondary token kept above outstanding secondary debt.
    #[serde(default = "default_swap_buffer_bps")]
    pub swap_buffer_bps: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,
    pub address: Address,
    #[serde(default = "default_token_decimals")]
    pub decimals: u32,
    /// Swaps and debts at or below this amount are treated as dust.
    #[serde(default = "default_swap_threshold")]
    pub swap_threshold: Decimal,
}

fn default_max_slippage_bps() -> u32 {
    DEFAULT_MAX_SLIPPAGE_BPS
}

fn default_quote_tolerance_bps() -> u32 {
    DEFAULT_QUOTE_TOLERANCE_BPS
}

fn default_swap_buffer_bps() -> u32 {
    DEFAULT_SWAP_BUFFER_BPS
}

fn default_token_decimals() -> u32 {
    DEFAULT_TOKEN_DECIMALS
}

fn default_swap_threshold() -> Decimal {
    DEFAULT_SWAP_THRESHOLD
}

// ---------------------------------------------------------------------------
// keeper.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct KeeperConfig {
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    #[serde(default = "default_max_withdraw_steps")]
    pub max_withdraw_steps: usize,
    /// Use a pool swap when the quote provider cannot serve a payload.
    #[serde(default)]
    pub fallback_to_self_swap: bool,
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_interval_seconds() -> u64 {
    DEFAULT_KEEPER_INTERVAL_SECONDS
}

fn default_max_withdraw_steps() -> usize {
    DEFAULT_MAX_WITHDRAW_STEPS
}

fn default_event_channel_capacity() -> usize {
    256
}

// ---------------------------------------------------------------------------
// simulation.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    pub pool: SimPoolConfig,
    pub lending: SimLendingConfig,
    pub aggregator: SimAggregatorConfig,
    #[serde(default)]
    pub liquidator_fee_bps: u32,
    /// Initial oracle prices in the base currency.
    pub price_a: Decimal,
    pub price_b: Decimal,
    pub depositor: Address,
    pub deposit_amount: Decimal,
    /// Per-tick multipliers of the initial `price_b`.
    #[serde(default)]
    pub price_walk: Vec<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimPoolConfig {
    pub address: Address,
    pub tick_spacing: i32,
    #[serde(default)]
    pub fee_bps: u32,
    /// Virtual liquidity of other providers; sets swap price impact.
    pub liquidity: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimLendingConfig {
    /// Borrowed value per unit of collateral value.
    pub borrow_ratio: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimAggregatorConfig {
    pub router: Address,
    #[serde(default)]
    pub fee_bps: u32,
}
