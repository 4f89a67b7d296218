use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request sent to a swap quote provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuoteRequest {
    pub token_in: Address,
    pub token_out: Address,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount_in: Decimal,
    pub max_slippage_bps: u32,
}

/// Swap transaction built off-chain by an aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorQuote {
    /// Provider name, e.g. "1inch".
    pub provider: String,
    pub token_in: Address,
    pub token_out: Address,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount_in: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub to_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub to_amount_min: Decimal,
    /// Contract to call with `payload`.
    pub router: Address,
    /// Raw calldata for the router.
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
}

/// Hex-encode/decode Vec<u8> for JSON serialization.
mod hex_bytes {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let hex_string = format!("0x{}", hex::encode(bytes));
        serializer.serialize_str(&hex_string)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payload_hex_encoding() {
        let quote = AggregatorQuote {
            provider: "mock".into(),
            token_in: Address::repeat_byte(0x0a),
            token_out: Address::repeat_byte(0x0b),
            amount_in: dec!(10),
            to_amount: dec!(9.9),
            to_amount_min: dec!(9.8),
            router: Address::repeat_byte(0xee),
            payload: vec![0xde, 0xad, 0xbe, 0xef],
        };
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["payload"], "0xdeadbeef");
        let back: AggregatorQuote = serde_json::from_value(json).unwrap();
        assert_eq!(back.payload, vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(back.to_amount, dec!(9.9));
    }
}
