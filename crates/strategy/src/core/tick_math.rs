//! Tick grid and concentrated-liquidity amount math.
//!
//! Prices are token1 per token0 and `sqrt_price` is its square root. Tick
//! conversion goes through `f64` (the grid is logarithmic); liquidity and
//! token amounts stay in `Decimal`.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, MathematicalOps};

use crate::constants::{MAX_TICK, MIN_TICK, TICK_BASE};
use crate::errors::StrategyError;

/// Absorbs `ln` rounding so that exact grid prices map onto their own tick.
const TICK_EPSILON: f64 = 1e-9;

/// `sqrt(1.0001^tick)`.
pub fn sqrt_price_at_tick(tick: i32) -> Result<Decimal, StrategyError> {
    let tick = tick.clamp(MIN_TICK, MAX_TICK);
    let value = TICK_BASE.powf(tick as f64 / 2.0);
    Decimal::from_f64(value).ok_or_else(|| StrategyError::Pool {
        reason: format!("sqrt price at tick {tick} is not representable"),
    })
}

/// Greatest tick whose price does not exceed `price`.
pub fn tick_at_price(price: Decimal) -> Result<i32, StrategyError> {
    let value = price.to_f64().filter(|p| *p > 0.0).ok_or_else(|| StrategyError::Pool {
        reason: format!("cannot derive tick from price {price}"),
    })?;
    let tick = (value.ln() / TICK_BASE.ln() + TICK_EPSILON).floor();
    Ok((tick as i64).clamp(MIN_TICK as i64, MAX_TICK as i64) as i32)
}

pub fn tick_at_sqrt_price(sqrt_price: Decimal) -> Result<i32, StrategyError> {
    tick_at_price(sqrt_price * sqrt_price)
}

/// Price (token1 per token0) from a square-root price.
pub fn price_from_sqrt(sqrt_price: Decimal) -> Decimal {
    sqrt_price * sqrt_price
}

/// Square-root price from a price (token1 per token0).
pub fn sqrt_from_price(price: Decimal) -> Result<Decimal, StrategyError> {
    price.sqrt().ok_or_else(|| StrategyError::Pool {
        reason: format!("negative price {price}"),
    })
}

/// Round `tick` down to a multiple of `spacing`.
pub fn align_tick_down(tick: i32, spacing: i32) -> i32 {
    if spacing <= 1 {
        return tick;
    }
    tick.div_euclid(spacing) * spacing
}

/// Liquidity range around `tick`.
///
/// A zero `tick_range` yields the single spacing-wide bucket holding `tick`;
/// otherwise the half-width is rounded up to whole spacings and applied to
/// the bucket's lower edge.
pub fn centered_range(tick: i32, tick_range: i32, spacing: i32) -> (i32, i32) {
    let spacing = spacing.max(1);
    let base = align_tick_down(tick, spacing);
    let (lower, upper) = if tick_range == 0 {
        (base, base + spacing)
    } else {
        let half = (tick_range + spacing - 1) / spacing * spacing;
        (base - half, base + half)
    };
    let min = align_tick_down(MIN_TICK, spacing) + spacing;
    let max = align_tick_down(MAX_TICK, spacing);
    (lower.max(min), upper.min(max))
}

// ---------------------------------------------------------------------------
// Liquidity <-> amounts
// ---------------------------------------------------------------------------

fn ordered(sqrt_a: Decimal, sqrt_b: Decimal) -> (Decimal, Decimal) {
    if sqrt_a <= sqrt_b {
        (sqrt_a, sqrt_b)
    } else {
        (sqrt_b, sqrt_a)
    }
}

/// Token amounts represented by `liquidity` over `[sqrt_lower, sqrt_upper]`
/// at `sqrt_price`.
pub fn amounts_for_liquidity(
    sqrt_price: Decimal,
    sqrt_lower: Decimal,
    sqrt_upper: Decimal,
    liquidity: Decimal,
) -> (Decimal, Decimal) {
    let (sa, sb) = ordered(sqrt_lower, sqrt_upper);
    if liquidity <= Decimal::ZERO || sa.is_zero() || sa == sb {
        return (Decimal::ZERO, Decimal::ZERO);
    }
    if sqrt_price <= sa {
        (liquidity * (sb - sa) / (sa * sb), Decimal::ZERO)
    } else if sqrt_price >= sb {
        (Decimal::ZERO, liquidity * (sb - sa))
    } else {
        (
            liquidity * (sb - sqrt_price) / (sqrt_price * sb),
            liquidity * (sqrt_price - sa),
        )
    }
}

/// Largest liquidity that `amount0`/`amount1` can fund over the range.
pub fn liquidity_for_amounts(
    sqrt_price: Decimal,
    sqrt_lower: Decimal,
    sqrt_upper: Decimal,
    amount0: Decimal,
    amount1: Decimal,
) -> Decimal {
    let (sa, sb) = ordered(sqrt_lower, sqrt_upper);
    if sa.is_zero() || sa == sb {
        return Decimal::ZERO;
    }
    let from0 = |sp: Decimal| amount0 * sp * sb / (sb - sp);
    let from1 = |sp: Decimal| amount1 / (sp - sa);
    let liquidity = if sqrt_price <= sa {
        from0(sa)
    } else if sqrt_price >= sb {
        from1(sb)
    } else {
        from0(sqrt_price).min(from1(sqrt_price))
    };
    liquidity.max(Decimal::ZERO)
}

/// Share of a position's value held in token1, valued at the pool price.
pub fn token1_value_share(sqrt_price: Decimal, sqrt_lower: Decimal, sqrt_upper: Decimal) -> Decimal {
    let (amount0, amount1) = amounts_for_liquidity(sqrt_price, sqrt_lower, sqrt_upper, Decimal::ONE);
    let value0 = amount0 * price_from_sqrt(sqrt_price);
    let total = value0 + amount1;
    if total.is_zero() {
        return Decimal::ZERO;
    }
    amount1 / total
}
