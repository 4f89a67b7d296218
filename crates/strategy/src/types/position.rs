use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pool flavour the strategy is deployed against.
///
/// Modelled as a plain tag: all three share the concentrated-liquidity
/// interface, the farming pools additionally signal restake epochs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    UniswapV3,
    Algebra,
    Kyber,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UniswapV3 => "uniswap_v3",
            Self::Algebra => "algebra",
            Self::Kyber => "kyber",
        }
    }

    /// Whether liquidity is staked in an external farm with epochs.
    pub fn supports_farming(&self) -> bool {
        matches!(self, Self::Algebra | Self::Kyber)
    }
}

/// Liquidity range and token roles of the strategy's pool position.
///
/// `token_a` is the underlying (accounting) asset, `token_b` the paired asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolPosition {
    pub pool: Address,
    pub token_a: Address,
    pub token_b: Address,
    pub tick_spacing: i32,
    /// Half-width of the liquidity range, in ticks.
    pub tick_range: i32,
    /// Distance from `anchor_tick` that triggers a rebalance.
    pub rebalance_tick_range: i32,
    pub lower_tick: i32,
    pub upper_tick: i32,
    /// Pool tick observed when the current range was set.
    pub anchor_tick: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_liquidity: Decimal,
    /// Liquidity was withdrawn while debt is still outstanding.
    pub deferred_unwind: bool,
}

impl PoolPosition {
    pub fn new(
        pool: Address,
        token_a: Address,
        token_b: Address,
        tick_spacing: i32,
        tick_range: i32,
        rebalance_tick_range: i32,
    ) -> Self {
        Self {
            pool,
            token_a,
            token_b,
            tick_spacing,
            tick_range,
            rebalance_tick_range,
            lower_tick: 0,
            upper_tick: 0,
            anchor_tick: 0,
            total_liquidity: Decimal::ZERO,
            deferred_unwind: false,
        }
    }

    pub fn has_liquidity(&self) -> bool {
        self.total_liquidity > Decimal::ZERO
    }

    /// Replace the range. Only valid while no liquidity is deposited.
    pub fn set_range(&mut self, lower_tick: i32, upper_tick: i32, anchor_tick: i32) {
        self.lower_tick = lower_tick;
        self.upper_tick = upper_tick;
        self.anchor_tick = anchor_tick;
    }

    /// Whether `tick` is still inside the no-rebalance band.
    ///
    /// With a zero rebalance range the band is the liquidity range itself.
    pub fn is_tick_in_band(&self, tick: i32) -> bool {
        if self.rebalance_tick_range == 0 {
            tick >= self.lower_tick && tick < self.upper_tick
        } else {
            (tick - self.anchor_tick).abs() <= self.rebalance_tick_range
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(rebalance_tick_range: i32) -> PoolPosition {
        let mut p = PoolPosition::new(
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x0a),
            Address::repeat_byte(0x0b),
            10,
            100,
            rebalance_tick_range,
        );
        p.set_range(-100, 100, 3);
        p
    }

    #[test]
    fn test_band_around_anchor() {
        let p = position(40);
        assert!(p.is_tick_in_band(3));
        assert!(p.is_tick_in_band(43));
        assert!(p.is_tick_in_band(-37));
        assert!(!p.is_tick_in_band(44));
        assert!(!p.is_tick_in_band(-38));
    }

    #[test]
    fn test_zero_rebalance_range_uses_liquidity_range() {
        let p = position(0);
        assert!(p.is_tick_in_band(-100));
        assert!(p.is_tick_in_band(99));
        assert!(!p.is_tick_in_band(100));
        assert!(!p.is_tick_in_band(-101));
    }

    #[test]
    fn test_farming_kinds() {
        assert!(!StrategyKind::UniswapV3.supports_farming());
        assert!(StrategyKind::Algebra.supports_farming());
        assert!(StrategyKind::Kyber.supports_farming());
    }
}
