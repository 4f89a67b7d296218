//! Shared test setup: a USDC/WETH-style pair at parity on a deep pool.

use alloy::primitives::Address;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::market::SimMarket;
use crate::config::{
    KeeperConfig, SimAggregatorConfig, SimLendingConfig, SimPoolConfig, SimulationConfig,
    StrategyConfig, TokenConfig,
};
use crate::constants::{
    DEFAULT_MAX_SLIPPAGE_BPS, DEFAULT_QUOTE_TOLERANCE_BPS, DEFAULT_SWAP_BUFFER_BPS,
    DEFAULT_SWAP_THRESHOLD,
};
use crate::core::strategy::PairStrategy;
use crate::types::{FuseThresholds, StrategyKind};

pub(crate) const TOKEN_A: Address = Address::new([0x0a; 20]);
pub(crate) const TOKEN_B: Address = Address::new([0x0b; 20]);
pub(crate) const POOL: Address = Address::new([0x01; 20]);
pub(crate) const ROUTER: Address = Address::new([0xee; 20]);
pub(crate) const DEPOSITOR: Address = Address::new([0xd0; 20]);

pub(crate) fn token(symbol: &str, address: Address) -> TokenConfig {
    TokenConfig {
        symbol: symbol.into(),
        address,
        decimals: 18,
        swap_threshold: DEFAULT_SWAP_THRESHOLD,
    }
}

pub(crate) fn strategy_config() -> StrategyConfig {
    StrategyConfig {
        kind: StrategyKind::UniswapV3,
        token_a: token("USDC", TOKEN_A),
        token_b: token("WETH", TOKEN_B),
        tick_range: 200,
        rebalance_tick_range: 100,
        fuse_a: FuseThresholds::disabled(),
        fuse_b: FuseThresholds::disabled(),
        max_slippage_bps: DEFAULT_MAX_SLIPPAGE_BPS,
        quote_tolerance_bps: DEFAULT_QUOTE_TOLERANCE_BPS,
        swap_buffer_bps: DEFAULT_SWAP_BUFFER_BPS,
    }
}

pub(crate) fn keeper_config() -> KeeperConfig {
    KeeperConfig {
        interval_seconds: 1,
        max_withdraw_steps: 10,
        fallback_to_self_swap: true,
        event_channel_capacity: 64,
    }
}

pub(crate) fn sim_config() -> SimulationConfig {
    SimulationConfig {
        pool: SimPoolConfig {
            address: POOL,
            tick_spacing: 10,
            fee_bps: 5,
            liquidity: dec!(1000000),
        },
        lending: SimLendingConfig {
            borrow_ratio: dec!(0.5),
        },
        aggregator: SimAggregatorConfig {
            router: ROUTER,
            fee_bps: 5,
        },
        liquidator_fee_bps: 5,
        price_a: Decimal::ONE,
        price_b: Decimal::ONE,
        depositor: DEPOSITOR,
        deposit_amount: dec!(1000),
        price_walk: Vec::new(),
    }
}

pub(crate) fn market() -> SimMarket {
    SimMarket::from_config(&sim_config(), TOKEN_A, TOKEN_B).unwrap()
}

/// Strategy bound to a fresh market. The market handle is shared, so the
/// returned copy can move prices under the strategy.
pub(crate) fn strategy() -> (PairStrategy<SimMarket>, SimMarket) {
    let market = market();
    let strategy = PairStrategy::new(market.clone(), strategy_config()).unwrap();
    (strategy, market)
}

/// Strategy holding `amount` of underlying, invested in the pool.
pub(crate) fn invested_strategy(amount: Decimal) -> (PairStrategy<SimMarket>, SimMarket) {
    let (mut strategy, market) = strategy();
    strategy.accept_deposit(amount);
    strategy.invest().unwrap();
    (strategy, market)
}

pub(crate) fn close(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}
