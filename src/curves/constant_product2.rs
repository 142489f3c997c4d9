use num_bigint::BigInt;
use num_traits::Signed;

use crate::{curves::CurveStrategy, utils::conversion::big_pow10};

/// Precision multiplier applied before taking the square root.
const EXP_PRECISION: u32 = 12;

/// Two-token constant product: `lpSupply = sqrt(r0 * r1 * 1e12)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantProduct2;

impl ConstantProduct2 {
    pub const ID: &'static str = "constant-product-2";
}

impl CurveStrategy for ConstantProduct2 {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn lp_token_supply(&self, reserves: &[BigInt], _params: &[u8]) -> Option<BigInt> {
        let [r0, r1] = reserves else {
            return None;
        };
        if r0.is_negative() || r1.is_negative() {
            return None;
        }
        Some((r0 * r1 * big_pow10(EXP_PRECISION)).sqrt())
    }
}
