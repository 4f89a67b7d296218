use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Numeric Constants
// ---------------------------------------------------------------------------

/// WAD: 1e18, fixed-point scale for proportions and oracle price ratios.
pub const WAD: Decimal = dec!(1_000_000_000_000_000_000);

/// Basis points denominator.
pub const BPS: Decimal = dec!(10_000);

/// Base of the tick price grid: price(tick) = 1.0001^tick.
pub const TICK_BASE: f64 = 1.0001;

/// Uniswap V3 tick bounds.
pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

/// Default token decimals when a config entry omits them.
pub const DEFAULT_TOKEN_DECIMALS: u32 = 18;

// ---------------------------------------------------------------------------
// Default Strategy Values
// ---------------------------------------------------------------------------

pub const DEFAULT_MAX_SLIPPAGE_BPS: u32 = 100;
pub const DEFAULT_QUOTE_TOLERANCE_BPS: u32 = 100;
pub const DEFAULT_SWAP_BUFFER_BPS: u32 = 10;

/// Swaps and debts at or below this many token units are dust.
pub const DEFAULT_SWAP_THRESHOLD: Decimal = dec!(0.000001);

// ---------------------------------------------------------------------------
// Keeper Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_KEEPER_INTERVAL_SECONDS: u64 = 15;
pub const DEFAULT_MAX_WITHDRAW_STEPS: usize = 10;

/// Iteration cap for the liquidator-driven full withdrawal.
pub const MAX_FULL_WITHDRAW_STEPS: usize = 16;
