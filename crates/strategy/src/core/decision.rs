//! Pure sizing helpers shared by the rebalance and withdrawal paths.
//!
//! Everything here is arithmetic on already-fetched balances and prices.
//! Callers own the reads, so the helpers stay deterministic and testable.

use rust_decimal::Decimal;

use crate::constants::BPS;
use crate::types::SwapDirection;

/// Oracle prices of the pair in the lending service's base currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairPrices {
    pub a: Decimal,
    pub b: Decimal,
}

impl PairPrices {
    /// Price of one A expressed in B.
    pub fn a_in_b(&self) -> Decimal {
        self.a / self.b
    }

    /// Value of `amount_b` expressed in A.
    pub fn b_to_a(&self, amount_b: Decimal) -> Decimal {
        amount_b * self.b / self.a
    }

    /// Amount of B worth `amount_a`.
    pub fn a_to_b(&self, amount_a: Decimal) -> Decimal {
        amount_a * self.a / self.b
    }
}

/// Per-token dust thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DustThresholds {
    pub a: Decimal,
    pub b: Decimal,
}

impl DustThresholds {
    pub fn for_direction(&self, direction: SwapDirection) -> Decimal {
        match direction {
            SwapDirection::AToB => self.a,
            SwapDirection::BToA => self.b,
        }
    }
}

/// `1 + bps / 10_000`.
pub fn bps_multiplier(bps: u32) -> Decimal {
    Decimal::ONE + Decimal::from(bps) / BPS
}

/// Swap that leaves exactly `debt_b * buffer` of B on hand.
///
/// Amounts are in units of the token sold; anything at or below the seller's
/// dust threshold collapses to zero.
pub fn hedge_swap(
    a: Decimal,
    b: Decimal,
    debt_b: Decimal,
    buffer: Decimal,
    prices: PairPrices,
    dust: DustThresholds,
) -> (SwapDirection, Decimal) {
    let target_b = debt_b * buffer;
    let (direction, amount) = if b < target_b {
        let amount_a = prices.b_to_a(target_b - b).min(a);
        (SwapDirection::AToB, amount_a)
    } else {
        (SwapDirection::BToA, b - target_b)
    };
    if amount <= dust.for_direction(direction) {
        (SwapDirection::AToB, Decimal::ZERO)
    } else {
        (direction, amount)
    }
}

/// Collateral in A to supply so that, after borrowing, the B share of value
/// on hand equals `prop`.
///
/// `k` is the value (in A) of B borrowed per unit of A collateral. Solves
/// `(b_value + C*k) / (a - C + b_value + C*k) = prop`, clamped to `[0, a]`.
pub fn collateral_for_target(prop: Decimal, a: Decimal, b_value: Decimal, k: Decimal) -> Decimal {
    if k <= Decimal::ZERO || a <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let denominator = k * (Decimal::ONE - prop) + prop;
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let collateral = (prop * a - (Decimal::ONE - prop) * b_value) / denominator;
    collateral.max(Decimal::ZERO).min(a)
}

/// Swap that moves free balances to a B value share of `proportion`.
///
/// Returns `None` when already balanced within dust.
pub fn proportion_swap(
    free_a: Decimal,
    free_b: Decimal,
    proportion: Decimal,
    prices: PairPrices,
    dust: DustThresholds,
) -> Option<(SwapDirection, Decimal)> {
    let free_a = free_a.max(Decimal::ZERO);
    let free_b = free_b.max(Decimal::ZERO);
    let total = free_a + prices.b_to_a(free_b);
    let target_b = prices.a_to_b(total * proportion);
    if free_b > target_b {
        let amount = free_b - target_b;
        (amount > dust.b).then_some((SwapDirection::BToA, amount))
    } else if proportion > Decimal::ZERO {
        let amount = prices.b_to_a(target_b - free_b).min(free_a);
        (amount > dust.a).then_some((SwapDirection::AToB, amount))
    } else {
        None
    }
}

/// Whether `actual` is within `tolerance_bps` of `expected`.
pub fn within_tolerance(expected: Decimal, actual: Decimal, tolerance_bps: u32) -> bool {
    let tolerance = expected.abs() * Decimal::from(tolerance_bps) / BPS;
    (actual - expected).abs() <= tolerance
}

/// Minimum acceptable output for `amount_in` at oracle prices.
pub fn min_swap_output(
    amount_in: Decimal,
    price_in: Decimal,
    price_out: Decimal,
    max_slippage_bps: u32,
) -> Decimal {
    let expected = amount_in * price_in / price_out;
    expected * (Decimal::ONE - Decimal::from(max_slippage_bps) / BPS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const EQUAL: PairPrices = PairPrices {
        a: Decimal::ONE,
        b: Decimal::ONE,
    };

    fn dust() -> DustThresholds {
        DustThresholds {
            a: dec!(0.001),
            b: dec!(0.001),
        }
    }

    #[test]
    fn test_hedge_swap_empty_is_zero() {
        let (_, amount) = hedge_swap(
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
            dec!(1.001),
            EQUAL,
            dust(),
        );
        assert_eq!(amount, Decimal::ZERO);
    }

    #[test]
    fn test_hedge_swap_buys_b_for_shortage() {
        let prices = PairPrices {
            a: dec!(1),
            b: dec!(2),
        };
        // Need 100 B, hold 80: short 20 B = 40 A.
        let (dir, amount) = hedge_swap(dec!(500), dec!(80), dec!(100), Decimal::ONE, prices, dust());
        assert_eq!(dir, SwapDirection::AToB);
        assert_eq!(amount, dec!(40));
    }

    #[test]
    fn test_hedge_swap_shortage_capped_by_a() {
        let (dir, amount) = hedge_swap(dec!(5), dec!(0), dec!(100), Decimal::ONE, EQUAL, dust());
        assert_eq!(dir, SwapDirection::AToB);
        assert_eq!(amount, dec!(5));
    }

    #[test]
    fn test_hedge_swap_sells_surplus_b() {
        let (dir, amount) = hedge_swap(dec!(10), dec!(130), dec!(100), dec!(1.1), EQUAL, dust());
        assert_eq!(dir, SwapDirection::BToA);
        assert_eq!(amount, dec!(20));
    }

    #[test]
    fn test_hedge_swap_dust_collapses() {
        let (_, amount) = hedge_swap(dec!(10), dec!(100.0005), dec!(100), Decimal::ONE, EQUAL, dust());
        assert_eq!(amount, Decimal::ZERO);
    }

    #[test]
    fn test_collateral_for_target_balances_value() {
        // prop 0.5, k 0.5: supply C, borrow 0.5C of B value.
        // (0.5C) / (1000 - C + 0.5C) = 0.5 -> C = 1000 * 0.5 / 0.75.
        let c = collateral_for_target(dec!(0.5), dec!(1000), Decimal::ZERO, dec!(0.5));
        let expected = dec!(500) / dec!(0.75);
        assert!((c - expected).abs() < dec!(0.000001));
        let b_value = c * dec!(0.5);
        let share = b_value / (dec!(1000) - c + b_value);
        assert!((share - dec!(0.5)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_collateral_for_target_clamps() {
        // Already more B than the target: no borrowing.
        assert_eq!(
            collateral_for_target(dec!(0.1), dec!(100), dec!(500), dec!(0.5)),
            Decimal::ZERO
        );
        // Range entirely in B: everything becomes collateral.
        assert_eq!(
            collateral_for_target(Decimal::ONE, dec!(100), Decimal::ZERO, dec!(0.5)),
            dec!(100)
        );
        assert_eq!(
            collateral_for_target(dec!(0.5), dec!(100), Decimal::ZERO, Decimal::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_proportion_swap_full_conversion() {
        let swap = proportion_swap(dec!(10), dec!(5), Decimal::ZERO, EQUAL, dust());
        assert_eq!(swap, Some((SwapDirection::BToA, dec!(5))));
        assert_eq!(proportion_swap(dec!(10), dec!(0.0001), Decimal::ZERO, EQUAL, dust()), None);
    }

    #[test]
    fn test_proportion_swap_towards_b_share() {
        // 100 A, 0 B, target 25% in B -> sell 25 A.
        let swap = proportion_swap(dec!(100), Decimal::ZERO, dec!(0.25), EQUAL, dust());
        assert_eq!(swap, Some((SwapDirection::AToB, dec!(25))));
    }

    #[test]
    fn test_within_tolerance() {
        assert!(within_tolerance(dec!(100), dec!(100.9), 100));
        assert!(within_tolerance(dec!(100), dec!(99), 100));
        assert!(!within_tolerance(dec!(100), dec!(98.9), 100));
        assert!(within_tolerance(Decimal::ZERO, Decimal::ZERO, 0));
    }

    #[test]
    fn test_min_swap_output() {
        // 10 A at 2 / 1 -> 20 B, minus 1%.
        assert_eq!(min_swap_output(dec!(10), dec!(2), dec!(1), 100), dec!(19.8));
        assert_eq!(bps_multiplier(10), dec!(1.001));
    }
}
