use std::collections::HashMap;

use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::StrategyError;

/// Token balances held directly by the strategy (outside pool and lending).
///
/// External swap payloads move funds through this ledger, so realised swap
/// output is always measured as a balance delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenBalances {
    balances: HashMap<Address, Decimal>,
}

impl TokenBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, token: Address) -> Decimal {
        self.balances.get(&token).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn credit(&mut self, token: Address, amount: Decimal) {
        if amount <= Decimal::ZERO {
            return;
        }
        *self.balances.entry(token).or_insert(Decimal::ZERO) += amount;
    }

    pub fn debit(&mut self, token: Address, amount: Decimal) -> Result<(), StrategyError> {
        if amount <= Decimal::ZERO {
            return Ok(());
        }
        let balance = self.balance_of(token);
        if balance < amount {
            return Err(StrategyError::InvalidState {
                reason: format!("insufficient {token} balance: have {balance}, need {amount}"),
            });
        }
        self.balances.insert(token, balance - amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_credit_and_debit() {
        let token = Address::repeat_byte(0x0a);
        let mut wallet = TokenBalances::new();
        assert_eq!(wallet.balance_of(token), Decimal::ZERO);
        wallet.credit(token, dec!(10));
        wallet.debit(token, dec!(4)).unwrap();
        assert_eq!(wallet.balance_of(token), dec!(6));
    }

    #[test]
    fn test_overdraft_rejected() {
        let token = Address::repeat_byte(0x0a);
        let mut wallet = TokenBalances::new();
        wallet.credit(token, dec!(1));
        let err = wallet.debit(token, dec!(2)).unwrap_err();
        assert!(err.to_string().contains("insufficient"));
        assert_eq!(wallet.balance_of(token), dec!(1));
    }
}
