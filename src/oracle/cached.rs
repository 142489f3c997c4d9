use alloy::primitives::Address;
use bigdecimal::BigDecimal;
use moka::sync::Cache;

use crate::{error::EngineResult, oracle::PriceOracle};

/// Bounded cache in front of a slower oracle.
///
/// Both hits and "unavailable" answers are cached per `(token, block)`;
/// errors are not, so a failed lookup is retried on the next call.
pub struct CachedPriceOracle<O> {
    inner: O,
    cache: Cache<(Address, u64), Option<BigDecimal>>,
}

impl<O: PriceOracle> CachedPriceOracle<O> {
    pub fn new(inner: O, capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(capacity).build();
        Self { inner, cache }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<O: PriceOracle> PriceOracle for CachedPriceOracle<O> {
    fn usd_price(&self, token: &Address, block_number: u64) -> EngineResult<Option<BigDecimal>> {
        let key = (*token, block_number);
        if let Some(price) = self.cache.get(&key) {
            return Ok(price);
        }
        let price = self.inner.usd_price(token, block_number)?;
        self.cache.insert(key, price.clone());
        Ok(price)
    }
}
