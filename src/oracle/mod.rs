//! USD price and token metadata sources.
//!
//! - [`PriceBook`] - block-indexed price schedule
//! - [`CachedPriceOracle`] - bounded `(token, block)` cache in front of any oracle
//! - [`TokenRegistry`] - token decimals/symbols with a default-decimals fallback

use alloy::primitives::Address;
use bigdecimal::BigDecimal;

use crate::error::EngineResult;

pub mod cached;
pub mod price_book;
pub mod tokens;

pub use cached::CachedPriceOracle;
pub use price_book::PriceBook;
pub use tokens::TokenRegistry;

/// USD price source.
///
/// `Ok(None)` means no price is available for the token at this block, which
/// the aggregator tolerates. `Err` means the lookup itself failed and aborts
/// the event being processed.
pub trait PriceOracle: Send + Sync {
    fn usd_price(&self, token: &Address, block_number: u64) -> EngineResult<Option<BigDecimal>>;
}
