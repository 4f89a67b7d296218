//! Oracle-priced aggregator: order payload codec and the quote provider that
//! produces payloads the simulated router executes.

use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::market::SimMarket;
use crate::constants::BPS;
use crate::errors::StrategyError;
use crate::execution::{LendingService, SwapQuoteProvider};
use crate::types::{AggregatorQuote, SwapQuoteRequest};

/// Calldata understood by the simulated router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorOrder {
    pub token_in: Address,
    pub token_out: Address,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount_in: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub min_amount_out: Decimal,
}

impl AggregatorOrder {
    pub fn encode(&self) -> Result<Vec<u8>, StrategyError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

/// Quotes at oracle prices minus the router fee, so quotes and execution
/// agree unless prices move in between.
#[derive(Debug, Clone)]
pub struct OracleQuoteProvider {
    market: SimMarket,
    available: bool,
}

impl OracleQuoteProvider {
    pub fn new(market: SimMarket) -> Self {
        Self {
            market,
            available: true,
        }
    }

    /// Simulate an outage of the quoting API.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }
}

impl SwapQuoteProvider for OracleQuoteProvider {
    async fn quote(&self, request: &SwapQuoteRequest) -> Result<AggregatorQuote, StrategyError> {
        if !self.available {
            return Err(StrategyError::AggregatorUnavailable {
                reason: "quote API offline".into(),
            });
        }
        if request.amount_in <= Decimal::ZERO {
            return Err(StrategyError::AggregatorUnavailable {
                reason: format!("no route for amount {}", request.amount_in),
            });
        }
        let price_in = self.market.price(request.token_in)?;
        let price_out = self.market.price(request.token_out)?;
        let fee = Decimal::from(self.market.aggregator_fee_bps()) / BPS;
        let to_amount = request.amount_in * price_in / price_out * (Decimal::ONE - fee);
        let to_amount_min =
            to_amount * (Decimal::ONE - Decimal::from(request.max_slippage_bps) / BPS);
        let payload = AggregatorOrder {
            token_in: request.token_in,
            token_out: request.token_out,
            amount_in: request.amount_in,
            min_amount_out: to_amount_min,
        }
        .encode()?;
        debug!(amount_in = %request.amount_in, %to_amount, "oracle quote");
        Ok(AggregatorQuote {
            provider: "oracle".into(),
            token_in: request.token_in,
            token_out: request.token_out,
            amount_in: request.amount_in,
            to_amount,
            to_amount_min,
            router: self.market.aggregator_router(),
            payload,
        })
    }
}
