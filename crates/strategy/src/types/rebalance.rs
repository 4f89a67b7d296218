use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::fuse::FuseStatus;

/// Direction of the swap that restores the hedge before re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapDirection {
    /// Sell underlying (token A) for token B.
    #[serde(rename = "a_to_b")]
    AToB,
    /// Sell token B for underlying.
    #[serde(rename = "b_to_a")]
    BToA,
}

impl SwapDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AToB => "a_to_b",
            Self::BToA => "b_to_a",
        }
    }
}

/// Read-only rebalance quote. Re-derive before every execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceQuote {
    pub needs_rebalance: bool,
    pub direction: SwapDirection,
    /// In units of the token being sold.
    #[serde(with = "rust_decimal::serde::str")]
    pub amount_to_swap: Decimal,
}

impl RebalanceQuote {
    pub fn requires_swap(&self) -> bool {
        self.amount_to_swap > Decimal::ZERO
    }
}

/// Where the rebalance swap is sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceMode {
    NoSwap,
    SelfSwap,
    Aggregator,
}

impl RebalanceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSwap => "no_swap",
            Self::SelfSwap => "self_swap",
            Self::Aggregator => "aggregator",
        }
    }
}

/// Caller-built external swap for `rebalance_with_aggregator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorSwapArgs {
    pub direction: SwapDirection,
    pub amount: Decimal,
    pub aggregator: Address,
    pub payload: Vec<u8>,
}

/// Summary of a successful rebalance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceOutcome {
    pub mode: RebalanceMode,
    #[serde(with = "rust_decimal::serde::str")]
    pub swapped_in: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub swapped_out: Decimal,
    pub lower_tick: i32,
    pub upper_tick: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub liquidity: Decimal,
    pub fuse_a: FuseStatus,
    pub fuse_b: FuseStatus,
}
