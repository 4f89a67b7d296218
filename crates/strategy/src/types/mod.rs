pub mod aggregator;
pub mod debt;
pub mod fuse;
pub mod position;
pub mod rebalance;
pub mod wad;
pub mod wallet;
pub mod withdraw;

pub use aggregator::{AggregatorQuote, SwapQuoteRequest};
pub use debt::{DebtKind, DebtPosition, PairDebts, RepayResult};
pub use fuse::{FuseSide, FuseState, FuseStatus, FuseThresholds};
pub use position::{PoolPosition, StrategyKind};
pub use rebalance::{
    AggregatorSwapArgs, RebalanceMode, RebalanceOutcome, RebalanceQuote, SwapDirection,
};
pub use wad::Wad;
pub use wallet::TokenBalances;
pub use withdraw::{EntryToPool, LockedAmount, PlanParams, WithdrawPlan, WithdrawQuote};
