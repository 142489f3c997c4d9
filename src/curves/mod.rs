//! Invariant curve strategies.
//!
//! A pool references its curve by id plus an opaque parameter blob. The
//! [`CurveRegistry`] resolves the id to a [`CurveStrategy`], which answers the
//! two questions the attribution engine needs:
//!
//! - [`CurveStrategy::lp_token_underlying`] - token amounts a perfectly
//!   proportional deposit/withdrawal of some LP amount would move
//! - [`CurveStrategy::lp_token_supply`] - LP supply implied by a reserve vector
//!
//! Both return `None` for degenerate inputs (empty pool, wrong arity,
//! undecodable params) instead of failing.

use std::fmt::Debug;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

pub mod constant_product;
pub mod constant_product2;
pub mod registry;
pub mod stable2;

pub use constant_product::ConstantProduct;
pub use constant_product2::ConstantProduct2;
pub use registry::CurveRegistry;
pub use stable2::Stable2;

/// A pool invariant.
pub trait CurveStrategy: Send + Sync + Debug {
    /// Registry key of this strategy.
    fn id(&self) -> &'static str;

    /// LP supply implied by `reserves` under this invariant.
    fn lp_token_supply(&self, reserves: &[BigInt], params: &[u8]) -> Option<BigInt>;

    /// Underlying token amounts for `lp_amount` against the given state.
    ///
    /// Every built-in invariant is homogeneous, so a balanced move is
    /// `lp_amount * reserves[i] / lp_supply` for each token.
    fn lp_token_underlying(
        &self,
        lp_amount: &BigInt,
        reserves: &[BigInt],
        lp_supply: &BigInt,
        _params: &[u8],
    ) -> Option<Vec<BigInt>> {
        proportional_underlying(lp_amount, reserves, lp_supply)
    }
}

/// `lp_amount * r / lp_supply` for every reserve, rounding toward zero.
pub fn proportional_underlying(
    lp_amount: &BigInt,
    reserves: &[BigInt],
    lp_supply: &BigInt,
) -> Option<Vec<BigInt>> {
    if !lp_supply.is_positive() || reserves.iter().any(|r| r.is_negative()) {
        return None;
    }
    if lp_amount.is_zero() {
        return Some(vec![BigInt::zero(); reserves.len()]);
    }
    Some(
        reserves
            .iter()
            .map(|r| lp_amount * r / lp_supply)
            .collect(),
    )
}
