//! Lending/borrowing service interface.
//!
//! The strategy treats the service's ledger as authoritative: every decision
//! re-reads `debt_snapshot` instead of caching debts across calls.

use alloy::primitives::Address;
use rust_decimal::Decimal;

use crate::errors::StrategyError;
use crate::types::{DebtPosition, RepayResult};

pub trait LendingService {
    /// Supply `collateral_amount` of `collateral_asset` and borrow `borrow_asset`
    /// at the service's target ratio. Returns the borrowed amount.
    fn borrow(
        &mut self,
        collateral_asset: Address,
        collateral_amount: Decimal,
        borrow_asset: Address,
    ) -> Result<Decimal, StrategyError>;

    /// Repay up to `amount` of the `borrow_asset` debt backed by `collateral_asset`.
    /// Overpayment is not taken.
    fn repay(
        &mut self,
        collateral_asset: Address,
        borrow_asset: Address,
        amount: Decimal,
    ) -> Result<RepayResult, StrategyError>;

    /// Amount `borrow` would return, without side effects.
    fn quote_borrow(
        &self,
        collateral_asset: Address,
        collateral_amount: Decimal,
        borrow_asset: Address,
    ) -> Result<Decimal, StrategyError>;

    /// Result `repay` would produce, without side effects.
    fn quote_repay(
        &self,
        collateral_asset: Address,
        borrow_asset: Address,
        amount: Decimal,
    ) -> Result<RepayResult, StrategyError>;

    /// All open collateral/debt pairs of the strategy.
    fn debt_snapshot(&self) -> Result<Vec<DebtPosition>, StrategyError>;

    /// Oracle price of `asset` in the service's base currency.
    fn price(&self, asset: Address) -> Result<Decimal, StrategyError>;
}
