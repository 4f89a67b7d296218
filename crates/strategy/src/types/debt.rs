use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One collateral/borrow pair as reported by the lending service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtPosition {
    pub collateral_asset: Address,
    pub borrow_asset: Address,
    #[serde(with = "rust_decimal::serde::str")]
    pub collateral_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub debt_amount: Decimal,
}

/// Orientation of a debt relative to the strategy's underlying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtKind {
    /// Collateral = underlying, borrow = secondary.
    Direct,
    /// Collateral = secondary, borrow = underlying.
    Reverse,
}

impl DebtPosition {
    /// Orientation relative to the pair `(token_a, token_b)`; `None` for a
    /// position in any other asset.
    pub fn kind(&self, token_a: Address, token_b: Address) -> Option<DebtKind> {
        match (self.collateral_asset, self.borrow_asset) {
            (c, d) if c == token_a && d == token_b => Some(DebtKind::Direct),
            (c, d) if c == token_b && d == token_a => Some(DebtKind::Reverse),
            _ => None,
        }
    }
}

/// Result of a repay call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepayResult {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount_repaid: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub collateral_returned: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub debt_remaining: Decimal,
}

/// Direct and reverse debt of the strategy's pair, flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PairDebts {
    /// Underlying supplied as collateral (direct).
    pub collateral_a: Decimal,
    /// Secondary owed (direct).
    pub debt_b: Decimal,
    /// Secondary supplied as collateral (reverse).
    pub collateral_b: Decimal,
    /// Underlying owed (reverse).
    pub debt_a: Decimal,
}

impl PairDebts {
    /// Fold a lending snapshot into the pair's two orientations.
    pub fn from_snapshot(snapshot: &[DebtPosition], token_a: Address, token_b: Address) -> Self {
        let mut debts = Self::default();
        for pos in snapshot {
            match pos.kind(token_a, token_b) {
                Some(DebtKind::Direct) => {
                    debts.collateral_a += pos.collateral_amount;
                    debts.debt_b += pos.debt_amount;
                }
                Some(DebtKind::Reverse) => {
                    debts.collateral_b += pos.collateral_amount;
                    debts.debt_a += pos.debt_amount;
                }
                None => {}
            }
        }
        debts
    }

    pub fn is_empty(&self, dust_a: Decimal, dust_b: Decimal) -> bool {
        self.debt_a <= dust_a && self.debt_b <= dust_b
    }
}
