use alloy::primitives::Address;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// Token metadata and last observed USD price.
///
/// Primary Key: address
/// Created the first time a pool references the token; the price is
/// refreshed by the statistics aggregator before each USD computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,

    // Current price state
    pub last_price_usd: BigDecimal,
    pub last_price_block_number: u64,
}

impl Token {
    /// Constructor for just metadata (used by the token registry)
    pub fn new(address: Address, symbol: String, decimals: u8) -> Self {
        Self {
            address,
            symbol,
            decimals,
            last_price_usd: BigDecimal::from(0),
            last_price_block_number: 0,
        }
    }

    /// Record a fresh oracle observation.
    pub fn update_price(&mut self, price_usd: BigDecimal, block_number: u64) {
        self.last_price_usd = price_usd;
        self.last_price_block_number = block_number;
    }
}
