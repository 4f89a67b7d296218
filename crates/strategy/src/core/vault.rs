//! Share ledger in front of a single strategy.
//!
//! Shares are minted against `total_assets` at deposit time and redeemed
//! pro rata. A redemption of the whole supply runs the full unwind; anything
//! smaller unwinds a proportional slice.

use std::collections::HashMap;

use alloy::primitives::Address;
use rust_decimal::Decimal;
use tracing::info;

use super::strategy::PairStrategy;
use crate::errors::StrategyError;
use crate::execution::Venue;

pub struct Vault<V: Venue> {
    strategy: PairStrategy<V>,
    shares: HashMap<Address, Decimal>,
    total_supply: Decimal,
    max_withdraw_steps: usize,
}

impl<V: Venue> Vault<V> {
    pub fn new(strategy: PairStrategy<V>, max_withdraw_steps: usize) -> Self {
        Self {
            strategy,
            shares: HashMap::new(),
            total_supply: Decimal::ZERO,
            max_withdraw_steps,
        }
    }

    pub fn strategy(&self) -> &PairStrategy<V> {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut PairStrategy<V> {
        &mut self.strategy
    }

    pub fn total_supply(&self) -> Decimal {
        self.total_supply
    }

    pub fn balance_of(&self, owner: Address) -> Decimal {
        self.shares.get(&owner).copied().unwrap_or(Decimal::ZERO)
    }

    /// Underlying per share; one while the vault is empty.
    pub fn share_price(&self) -> Result<Decimal, StrategyError> {
        if self.total_supply.is_zero() {
            return Ok(Decimal::ONE);
        }
        Ok(self.strategy.total_assets()? / self.total_supply)
    }

    /// Deposit underlying for `owner` and invest it. Returns shares minted.
    pub fn deposit(&mut self, owner: Address, amount: Decimal) -> Result<Decimal, StrategyError> {
        if amount <= Decimal::ZERO {
            return Err(StrategyError::Vault {
                reason: format!("deposit amount must be positive, got {amount}"),
            });
        }
        let total_assets = self.strategy.total_assets()?;
        let minted = if self.total_supply.is_zero() {
            amount
        } else if total_assets.is_zero() {
            return Err(StrategyError::Vault {
                reason: format!(
                    "{} outstanding shares back no assets, deposit would be diluted",
                    self.total_supply
                ),
            });
        } else {
            amount * self.total_supply / total_assets
        };
        let liquidity = self.strategy.atomically(|s| {
            s.accept_deposit(amount);
            s.invest()
        })?;

        *self.shares.entry(owner).or_insert(Decimal::ZERO) += minted;
        self.total_supply += minted;
        info!(%owner, %amount, shares = %minted, %liquidity, "deposit");
        Ok(minted)
    }

    /// Redeem `shares` of `owner` for underlying. Returns the amount paid.
    pub fn withdraw(&mut self, owner: Address, shares: Decimal) -> Result<Decimal, StrategyError> {
        let held = self.balance_of(owner);
        if shares <= Decimal::ZERO || shares > held {
            return Err(StrategyError::Vault {
                reason: format!("cannot redeem {shares} shares, {owner} holds {held}"),
            });
        }

        let paid = if shares == self.total_supply {
            self.strategy.withdraw_all_underlying(self.max_withdraw_steps)?
        } else {
            let amount = self.strategy.total_assets()? * shares / self.total_supply;
            self.strategy.withdraw_underlying(amount)?
        };

        let remaining = held - shares;
        if remaining.is_zero() {
            self.shares.remove(&owner);
        } else {
            self.shares.insert(owner, remaining);
        }
        self.total_supply -= shares;
        info!(%owner, %shares, %paid, "withdraw");
        Ok(paid)
    }

    /// Redeem every share `owner` holds.
    pub fn withdraw_all(&mut self, owner: Address) -> Result<Decimal, StrategyError> {
        self.withdraw(owner, self.balance_of(owner))
    }

    /// Invest idle balances. Refused while a rebalance is pending.
    pub fn do_hard_work(&mut self) -> Result<Decimal, StrategyError> {
        if self.strategy.need_rebalance()? {
            return Err(StrategyError::InvalidState {
                reason: "rebalance pending, hard work refused".into(),
            });
        }
        self.strategy.invest()
    }
}
