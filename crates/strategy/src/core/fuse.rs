//! Fuse controller: price circuit breaker with hysteresis.
//!
//! One [`FuseState`] per token side. A fuse that is ON blocks all new
//! exposure: the next rebalance repays debt and leaves the pool empty until
//! both sides are back OFF (or disabled).

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::errors::StrategyError;
use crate::types::{FuseSide, FuseState, FuseStatus, FuseThresholds};

impl FuseState {
    /// Initial state for `thresholds`: `Disabled` when all zero, else `Off`.
    pub fn new(thresholds: FuseThresholds) -> Self {
        let status = if thresholds.is_disabled() {
            FuseStatus::Disabled
        } else {
            FuseStatus::Off
        };
        Self { status, thresholds }
    }

    /// Next status for `price` without committing it.
    ///
    /// ON states only fall back to OFF; ON_LOWER -> ON_UPPER always passes
    /// through OFF on a separate evaluation.
    pub fn evaluate(&self, price: Decimal) -> (FuseStatus, bool) {
        let t = &self.thresholds;
        let next = match self.status {
            FuseStatus::Disabled => FuseStatus::Disabled,
            FuseStatus::Off => {
                if price <= t.lower_limit_on {
                    FuseStatus::OnLowerLimit
                } else if price >= t.upper_limit_on {
                    FuseStatus::OnUpperLimit
                } else {
                    FuseStatus::Off
                }
            }
            FuseStatus::OnLowerLimit => {
                if price >= t.lower_limit_off {
                    FuseStatus::Off
                } else {
                    FuseStatus::OnLowerLimit
                }
            }
            FuseStatus::OnUpperLimit => {
                if price <= t.upper_limit_off {
                    FuseStatus::Off
                } else {
                    FuseStatus::OnUpperLimit
                }
            }
        };
        (next, next != self.status)
    }

    /// Commit a status produced by [`FuseState::evaluate`].
    pub fn apply(&mut self, status: FuseStatus) {
        self.status = status;
    }
}

/// Both fuse sides of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FusePair {
    pub a: FuseState,
    pub b: FuseState,
}

/// Pending result of evaluating both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuseEvaluation {
    pub status_a: FuseStatus,
    pub status_b: FuseStatus,
    pub changed: bool,
}

impl FuseEvaluation {
    pub fn allows_exposure(&self) -> bool {
        allows_exposure(self.status_a, self.status_b)
    }
}

/// Exposure is allowed only when neither side is ON. Two ON sides with
/// opposite directions are treated the same as one.
pub fn allows_exposure(status_a: FuseStatus, status_b: FuseStatus) -> bool {
    !status_a.is_on() && !status_b.is_on()
}

impl FusePair {
    pub fn new(thresholds_a: FuseThresholds, thresholds_b: FuseThresholds) -> Self {
        Self {
            a: FuseState::new(thresholds_a),
            b: FuseState::new(thresholds_b),
        }
    }

    pub fn side(&self, side: FuseSide) -> &FuseState {
        match side {
            FuseSide::A => &self.a,
            FuseSide::B => &self.b,
        }
    }

    /// Evaluate both sides from the oracle price of A in B.
    ///
    /// Side B sees the inverse ratio. A non-positive price is an oracle failure.
    pub fn evaluate(&self, price_a_in_b: Decimal) -> Result<FuseEvaluation, StrategyError> {
        if price_a_in_b <= Decimal::ZERO {
            return Err(StrategyError::ZeroPriceOrOracleFailure {
                asset: alloy::primitives::Address::ZERO,
                reason: format!("non-positive pair price {price_a_in_b}"),
            });
        }
        let (status_a, changed_a) = self.a.evaluate(price_a_in_b);
        let (status_b, changed_b) = self.b.evaluate(Decimal::ONE / price_a_in_b);
        if changed_a || changed_b {
            debug!(
                from_a = self.a.status.as_str(),
                to_a = status_a.as_str(),
                from_b = self.b.status.as_str(),
                to_b = status_b.as_str(),
                %price_a_in_b,
                "fuse transition pending"
            );
        }
        Ok(FuseEvaluation {
            status_a,
            status_b,
            changed: changed_a || changed_b,
        })
    }

    pub fn apply(&mut self, evaluation: &FuseEvaluation) {
        if evaluation.changed && !evaluation.allows_exposure() {
            warn!(
                fuse_a = evaluation.status_a.as_str(),
                fuse_b = evaluation.status_b.as_str(),
                "fuse tripped, exposure suspended"
            );
        }
        self.a.apply(evaluation.status_a);
        self.b.apply(evaluation.status_b);
    }

    pub fn allows_exposure(&self) -> bool {
        allows_exposure(self.a.status, self.b.status)
    }

    /// Replace one side's thresholds; its status restarts from OFF/DISABLED.
    pub fn set_thresholds(
        &mut self,
        side: FuseSide,
        thresholds: FuseThresholds,
    ) -> Result<(), StrategyError> {
        thresholds
            .validate()
            .map_err(|reason| StrategyError::InvalidState { reason })?;
        let state = FuseState::new(thresholds);
        match side {
            FuseSide::A => self.a = state,
            FuseSide::B => self.b = state,
        }
        Ok(())
    }
}
