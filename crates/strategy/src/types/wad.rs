//! Newtype wrapper for 18-decimal fixed-point values.
//!
//! Proportions (`proportion_not_underlying`) and oracle price ratios cross the
//! API as WAD-scaled integers, the same way the on-chain contracts take them.
//! Arithmetic happens on `Decimal`; `Wad` is the boundary representation.

use alloy::primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::WAD;

/// WAD-scaled value (18 decimals). `Wad::ONE` is 100% / a price ratio of 1.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Wad(pub U256);

impl Wad {
    pub const ONE: Wad = Wad(U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]));
    pub const ZERO: Wad = Wad(U256::ZERO);

    /// Convert the raw WAD integer to `Decimal`. `None` when the raw value
    /// exceeds what `Decimal` can hold (about 7.9e28).
    pub fn to_decimal(self) -> Option<Decimal> {
        let raw = Decimal::from_str(&self.0.to_string()).ok()?;
        Some(raw / WAD)
    }

    /// Scale a `Decimal` to WAD, truncating toward zero. Negative input maps to zero.
    pub fn from_decimal(value: Decimal) -> Self {
        if value <= Decimal::ZERO {
            return Self::ZERO;
        }
        let scaled = (value * WAD).trunc();
        U256::from_str(&scaled.to_string())
            .map(Self)
            .unwrap_or(Self::ZERO)
    }

    /// Create from a `U256` that is already WAD-scaled.
    pub fn from_raw(val: U256) -> Self {
        Self(val)
    }

    /// Inner `U256`.
    pub fn raw(self) -> U256 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Debug for Wad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wad({self})")
    }
}

impl fmt::Display for Wad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Some(value) => write!(f, "{value}"),
            None => write!(f, "{}e-18", self.0),
        }
    }
}

impl From<U256> for Wad {
    fn from(val: U256) -> Self {
        Self(val)
    }
}

/// Serialized as the decimal value string ("0.25"), not the raw integer.
impl Serialize for Wad {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let Some(value) = self.to_decimal() else {
            return Err(serde::ser::Error::custom(format!(
                "wad {} out of decimal range",
                self.0
            )));
        };
        serializer.serialize_str(&value.normalize().to_string())
    }
}

impl<'de> Deserialize<'de> for Wad {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let value = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Ok(Wad::from_decimal(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_wad_one_is_one() {
        assert_eq!(Wad::ONE.to_decimal(), Some(dec!(1)));
    }

    #[test]
    fn test_wad_zero() {
        assert_eq!(Wad::ZERO.to_decimal(), Some(dec!(0)));
        assert!(Wad::ZERO.is_zero());
    }

    #[test]
    fn test_from_decimal_quarter() {
        let w = Wad::from_decimal(dec!(0.25));
        assert_eq!(w.raw(), U256::from(250_000_000_000_000_000u128));
        assert_eq!(w.to_decimal(), Some(dec!(0.25)));
    }

    #[test]
    fn test_from_decimal_truncates_below_wad_precision() {
        let w = Wad::from_decimal(dec!(0.0000000000000000019));
        assert_eq!(w.raw(), U256::from(1u64));
    }

    #[test]
    fn test_out_of_range_raw_is_not_zero() {
        let w = Wad::from_raw(U256::MAX);
        assert_eq!(w.to_decimal(), None);
        assert!(serde_json::to_string(&w).is_err());
        assert!(w > Wad::ONE);
    }

    #[test]
    fn test_negative_maps_to_zero() {
        assert_eq!(Wad::from_decimal(dec!(-1)), Wad::ZERO);
    }

    #[test]
    fn test_serde_as_decimal_string() {
        let w = Wad::from_decimal(dec!(0.5));
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, "\"0.5\"");
        let back: Wad = serde_json::from_str(&json).unwrap();
        assert_eq!(back, w);
    }
}
