//! Locked-amount estimator.
//!
//! Locked = value immobilised as over-collateralisation: over the pair's
//! direct and reverse debt positions, collateral value minus debt value, in
//! underlying at lending oracle prices (never the pool price). Positions in
//! other assets are not part of the strategy and are skipped.

use rust_decimal::Decimal;

use super::strategy::PairStrategy;
use crate::errors::StrategyError;
use crate::execution::Venue;
use crate::types::{DebtPosition, LockedAmount};

/// Signed surplus of one debt position in underlying units. Negative when
/// the position is underwater.
pub fn locked_value(
    position: &DebtPosition,
    collateral_price: Decimal,
    debt_price: Decimal,
    underlying_price: Decimal,
) -> Decimal {
    let surplus = position.collateral_amount * collateral_price - position.debt_amount * debt_price;
    surplus / underlying_price
}

impl<V: Venue> PairStrategy<V> {
    pub fn get_locked_underlying_amount(&self) -> Result<LockedAmount, StrategyError> {
        let (token_a, token_b) = (self.token_a(), self.token_b());
        let underlying_price = self.oracle_price(token_a)?;
        let mut locked = Decimal::ZERO;
        for position in self.venue.debt_snapshot()? {
            if position.kind(token_a, token_b).is_none() {
                continue;
            }
            let collateral_price = self.oracle_price(position.collateral_asset)?;
            let debt_price = self.oracle_price(position.borrow_asset)?;
            locked += locked_value(&position, collateral_price, debt_price, underlying_price);
        }
        Ok(LockedAmount {
            estimated_underlying_amount: self.truncate_a(locked.max(Decimal::ZERO)),
            total_assets: self.total_assets()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;
    use rust_decimal_macros::dec;

    fn debt(collateral: Decimal, debt: Decimal) -> DebtPosition {
        DebtPosition {
            collateral_asset: Address::repeat_byte(0x0a),
            borrow_asset: Address::repeat_byte(0x0b),
            collateral_amount: collateral,
            debt_amount: debt,
        }
    }

    #[test]
    fn test_locked_value_equal_prices() {
        assert_eq!(
            locked_value(&debt(dec!(1000), dec!(700)), dec!(1), dec!(1), dec!(1)),
            dec!(300)
        );
    }

    #[test]
    fn test_locked_value_skewed_prices() {
        // 8000 * 0.5 - 1200 * 2 = 1600 base units = 3200 underlying at 0.5.
        assert_eq!(
            locked_value(&debt(dec!(8000), dec!(1200)), dec!(0.5), dec!(2), dec!(0.5)),
            dec!(3200)
        );
    }

    #[test]
    fn test_locked_value_underwater_is_negative() {
        assert_eq!(
            locked_value(&debt(dec!(100), dec!(150)), dec!(1), dec!(1), dec!(1)),
            dec!(-50)
        );
    }

    #[test]
    fn test_no_debt_locks_nothing() {
        let (mut strategy, _market) = crate::sim::fixtures::strategy();
        strategy.accept_deposit(dec!(250));
        let locked = strategy.get_locked_underlying_amount().unwrap();
        assert_eq!(locked.estimated_underlying_amount, Decimal::ZERO);
        assert_eq!(locked.total_assets, dec!(250));
    }

    #[test]
    fn test_injected_debt_position() {
        use crate::sim::fixtures::{self, TOKEN_A, TOKEN_B};

        let (mut strategy, market) = fixtures::strategy();
        market.set_debt_position(TOKEN_A, TOKEN_B, dec!(1000), dec!(700));
        strategy.accept_deposit(dec!(200));
        let locked = strategy.get_locked_underlying_amount().unwrap();
        assert_eq!(locked.estimated_underlying_amount, dec!(300));
        assert_eq!(locked.total_assets, dec!(500));
    }

    #[test]
    fn test_locked_uses_oracle_prices() {
        use crate::sim::fixtures::{self, TOKEN_A, TOKEN_B};

        let (strategy, market) = fixtures::strategy();
        market.set_price(TOKEN_A, dec!(0.5)).unwrap();
        market.set_price(TOKEN_B, dec!(2)).unwrap();
        market.set_debt_position(TOKEN_A, TOKEN_B, dec!(8000), dec!(1200));
        let locked = strategy.get_locked_underlying_amount().unwrap();
        assert_eq!(locked.estimated_underlying_amount, dec!(3200));
    }

    #[test]
    fn test_underwater_reverse_position_reduces_locked() {
        use crate::sim::fixtures::{self, TOKEN_A, TOKEN_B};

        let (mut strategy, market) = fixtures::strategy();
        market.set_debt_position(TOKEN_A, TOKEN_B, dec!(1000), dec!(700));
        market.set_debt_position(TOKEN_B, TOKEN_A, dec!(100), dec!(150));
        strategy.accept_deposit(dec!(200));
        let locked = strategy.get_locked_underlying_amount().unwrap();
        assert_eq!(locked.estimated_underlying_amount, dec!(250));
        assert_eq!(locked.total_assets, dec!(450));
    }

    #[test]
    fn test_foreign_positions_are_skipped() {
        use crate::sim::fixtures::{self, TOKEN_A};

        let (strategy, market) = fixtures::strategy();
        let foreign = Address::repeat_byte(0x0c);
        market.set_price(foreign, dec!(1)).unwrap();
        market.set_debt_position(foreign, TOKEN_A, dec!(5000), dec!(100));
        let locked = strategy.get_locked_underlying_amount().unwrap();
        assert_eq!(locked.estimated_underlying_amount, Decimal::ZERO);
        assert_eq!(locked.total_assets, Decimal::ZERO);
    }

    #[test]
    fn test_locked_sum_floors_at_zero() {
        use crate::sim::fixtures::{self, TOKEN_A, TOKEN_B};

        let (strategy, market) = fixtures::strategy();
        market.set_debt_position(TOKEN_B, TOKEN_A, dec!(100), dec!(150));
        let locked = strategy.get_locked_underlying_amount().unwrap();
        assert_eq!(locked.estimated_underlying_amount, Decimal::ZERO);
    }
}
