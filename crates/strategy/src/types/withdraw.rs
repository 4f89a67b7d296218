use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::wad::Wad;

/// Order of operations for one unwind step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawPlan {
    /// Swap, then repay.
    SwapRepay,
    /// Repay with what is on hand, swap the remainder, repay again.
    RepaySwapRepay,
    /// Swap toward the target proportion without repaying.
    SwapOnly,
}

impl WithdrawPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SwapRepay => "swap_repay",
            Self::RepaySwapRepay => "repay_swap_repay",
            Self::SwapOnly => "swap_only",
        }
    }

    pub fn repays(&self) -> bool {
        !matches!(self, Self::SwapOnly)
    }
}

/// Whether leftover assets go back into the pool after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryToPool {
    None = 0,
    Always = 1,
    IfCompleted = 2,
}

impl EntryToPool {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Always),
            2 => Some(Self::IfCompleted),
            _ => None,
        }
    }

    pub fn allows(&self, completed: bool) -> bool {
        match self {
            Self::None => false,
            Self::Always => true,
            Self::IfCompleted => completed,
        }
    }
}

/// Parameters of a staged withdrawal, rebuilt for every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanParams {
    pub kind: WithdrawPlan,
    /// Fraction of assets allowed to stay in token B, at most `Wad::ONE`;
    /// zero converts everything.
    pub proportion_not_underlying: Wad,
    /// Cap on one step's swap, in underlying units.
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub max_swap_value: Option<Decimal>,
}

impl PlanParams {
    /// Convert everything back to the underlying.
    pub fn full_unwind(kind: WithdrawPlan) -> Self {
        Self {
            kind,
            proportion_not_underlying: Wad::ZERO,
            max_swap_value: None,
        }
    }

    pub fn with_proportion(mut self, proportion: Wad) -> Self {
        self.proportion_not_underlying = proportion;
        self
    }

    pub fn with_max_swap_value(mut self, cap: Decimal) -> Self {
        self.max_swap_value = Some(cap);
        self
    }
}

/// Next incremental swap of the unwind. `token_to_swap == None` means no swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawQuote {
    pub token_to_swap: Option<Address>,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount_to_swap: Decimal,
}

impl WithdrawQuote {
    pub fn none() -> Self {
        Self {
            token_to_swap: None,
            amount_to_swap: Decimal::ZERO,
        }
    }

    pub fn is_none(&self) -> bool {
        self.token_to_swap.is_none()
    }
}

/// Point-in-time read of over-collateralisation overhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedAmount {
    #[serde(with = "rust_decimal::serde::str")]
    pub estimated_underlying_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_assets: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_entry_mode_codes() {
        assert_eq!(EntryToPool::from_u8(0), Some(EntryToPool::None));
        assert_eq!(EntryToPool::from_u8(1), Some(EntryToPool::Always));
        assert_eq!(EntryToPool::from_u8(2), Some(EntryToPool::IfCompleted));
        assert_eq!(EntryToPool::from_u8(3), None);
        assert_eq!(EntryToPool::IfCompleted as u8, 2);
    }

    #[test]
    fn test_entry_mode_gating() {
        assert!(!EntryToPool::None.allows(true));
        assert!(EntryToPool::Always.allows(false));
        assert!(!EntryToPool::IfCompleted.allows(false));
        assert!(EntryToPool::IfCompleted.allows(true));
    }

    #[test]
    fn test_plan_params_builders() {
        let plan = PlanParams::full_unwind(WithdrawPlan::RepaySwapRepay)
            .with_proportion(Wad::from_decimal(dec!(0.2)))
            .with_max_swap_value(dec!(100));
        assert_eq!(plan.proportion_not_underlying.to_decimal(), Some(dec!(0.2)));
        assert_eq!(plan.max_swap_value, Some(dec!(100)));
        assert!(plan.kind.repays());
        assert!(!WithdrawPlan::SwapOnly.repays());
    }
}
