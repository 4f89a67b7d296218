//! The full set of collaborators a strategy runs against.

use super::lending::LendingService;
use super::pool::LiquidityPool;
use super::swap::{AggregatorRouter, Liquidator};

/// Checkpoint/rollback of external state, giving mutating strategy calls
/// all-or-nothing semantics.
pub trait Transactional {
    type Checkpoint;

    fn checkpoint(&self) -> Self::Checkpoint;
    fn rollback(&mut self, checkpoint: Self::Checkpoint);
}

/// Lending service, pool, liquidator and aggregator router behind one handle.
pub trait Venue: LendingService + LiquidityPool + Liquidator + AggregatorRouter + Transactional {}

impl<T> Venue for T where
    T: LendingService + LiquidityPool + Liquidator + AggregatorRouter + Transactional
{
}
