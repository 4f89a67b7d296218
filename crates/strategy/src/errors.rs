use alloy::primitives::Address;
use rust_decimal::Decimal;
use thiserror::Error;

/// Typed error hierarchy for the converter strategy engine.
///
/// Library code returns specific variants; the binary and the config loader
/// wrap with `anyhow::Context` for propagation. Every mutating strategy call
/// that returns one of these has already rolled back its state.
#[derive(Error, Debug)]
pub enum StrategyError {
    // -- Call preconditions -------------------------------------------------
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },

    // -- Swap validation ----------------------------------------------------
    #[error("slippage exceeded: received {received}, expected at least {min_expected}")]
    SlippageExceeded {
        received: Decimal,
        min_expected: Decimal,
    },

    #[error("stale quote: {reason}")]
    StaleQuote { reason: String },

    #[error("swap failed: {reason}")]
    SwapFailed { reason: String },

    #[error("aggregator unavailable: {reason}")]
    AggregatorUnavailable { reason: String },

    // -- Oracle -------------------------------------------------------------
    #[error("oracle failure for {asset}: {reason}")]
    ZeroPriceOrOracleFailure { asset: Address, reason: String },

    // -- Withdrawal ---------------------------------------------------------
    #[error("debt unwind incomplete after {steps} steps")]
    DebtUnwindIncomplete { steps: usize },

    // -- Collaborators ------------------------------------------------------
    #[error("lending service error: {reason}")]
    Lending { reason: String },

    #[error("liquidity pool error: {reason}")]
    Pool { reason: String },

    #[error("vault error: {reason}")]
    Vault { reason: String },

    // -- Configuration ------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),

    // -- Forwarded errors ---------------------------------------------------
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StrategyError {
    /// Whether the caller should re-quote and retry with fresh parameters.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SlippageExceeded { .. } | Self::StaleQuote { .. } | Self::SwapFailed { .. }
        )
    }
}
