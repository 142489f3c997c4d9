use std::collections::{BTreeMap, HashMap};

use alloy::primitives::Address;
use bigdecimal::BigDecimal;
use rustc_hash::FxHashMap;

use crate::{config::PricePoint, error::EngineResult, oracle::PriceOracle};

/// Per-token price schedule: a price observed at block `b` holds until the
/// next observation.
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    prices: FxHashMap<Address, BTreeMap<u64, BigDecimal>>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(prices: &HashMap<Address, Vec<PricePoint>>) -> Self {
        let mut book = Self::new();
        for (token, points) in prices {
            for point in points {
                book.insert(*token, point.block, point.price_usd.clone());
            }
        }
        book
    }

    pub fn insert(&mut self, token: Address, block_number: u64, price_usd: BigDecimal) {
        self.prices
            .entry(token)
            .or_default()
            .insert(block_number, price_usd);
    }

    /// Latest observation at or before `block_number`.
    pub fn price_at(&self, token: &Address, block_number: u64) -> Option<&BigDecimal> {
        self.prices
            .get(token)?
            .range(..=block_number)
            .next_back()
            .map(|(_, price)| price)
    }

    pub fn token_count(&self) -> usize {
        self.prices.len()
    }
}

impl PriceOracle for PriceBook {
    fn usd_price(&self, token: &Address, block_number: u64) -> EngineResult<Option<BigDecimal>> {
        Ok(self.price_at(token, block_number).cloned())
    }
}
