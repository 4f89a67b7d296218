use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Circuit-breaker status of one token side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuseStatus {
    /// All thresholds are zero; the fuse never trips.
    Disabled,
    Off,
    OnLowerLimit,
    OnUpperLimit,
}

impl FuseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Off => "off",
            Self::OnLowerLimit => "on_lower_limit",
            Self::OnUpperLimit => "on_upper_limit",
        }
    }

    /// Whether this status blocks new exposure.
    pub fn is_on(&self) -> bool {
        matches!(self, Self::OnLowerLimit | Self::OnUpperLimit)
    }
}

/// `[lowerLimitOn, lowerLimitOff, upperLimitOn, upperLimitOff]`.
///
/// Valid when all zero (disabled) or when
/// `lower_limit_on < lower_limit_off <= upper_limit_off < upper_limit_on`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FuseThresholds {
    #[serde(with = "rust_decimal::serde::str")]
    pub lower_limit_on: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub lower_limit_off: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub upper_limit_on: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub upper_limit_off: Decimal,
}

impl FuseThresholds {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Build from the on-chain tuple order.
    pub fn from_array(values: [Decimal; 4]) -> Self {
        Self {
            lower_limit_on: values[0],
            lower_limit_off: values[1],
            upper_limit_on: values[2],
            upper_limit_off: values[3],
        }
    }

    pub fn as_array(&self) -> [Decimal; 4] {
        [
            self.lower_limit_on,
            self.lower_limit_off,
            self.upper_limit_on,
            self.upper_limit_off,
        ]
    }

    pub fn is_disabled(&self) -> bool {
        self.as_array().iter().all(|v| v.is_zero())
    }

    /// Check the hysteresis ordering. Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_disabled() {
            return Ok(());
        }
        if self.as_array().iter().any(|v| *v <= Decimal::ZERO) {
            return Err(format!(
                "fuse thresholds must all be positive or all zero, got {:?}",
                self.as_array()
            ));
        }
        if self.lower_limit_on >= self.lower_limit_off {
            return Err(format!(
                "lower_limit_on ({}) must be < lower_limit_off ({})",
                self.lower_limit_on, self.lower_limit_off
            ));
        }
        if self.lower_limit_off > self.upper_limit_off {
            return Err(format!(
                "lower_limit_off ({}) must be <= upper_limit_off ({})",
                self.lower_limit_off, self.upper_limit_off
            ));
        }
        if self.upper_limit_off >= self.upper_limit_on {
            return Err(format!(
                "upper_limit_off ({}) must be < upper_limit_on ({})",
                self.upper_limit_off, self.upper_limit_on
            ));
        }
        Ok(())
    }
}

/// Fuse of one token side: thresholds plus the last committed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuseState {
    pub status: FuseStatus,
    pub thresholds: FuseThresholds,
}

/// Which token's price a fuse monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuseSide {
    /// Oracle price of token A in token B.
    A,
    /// Oracle price of token B in token A.
    B,
}
