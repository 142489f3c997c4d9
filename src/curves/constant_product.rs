use num_bigint::BigInt;
use num_traits::{One, Signed};

use crate::curves::CurveStrategy;

/// N-token constant product: `lpSupply = n * (r0 * r1 * ... * rn-1)^(1/n)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantProduct;

impl ConstantProduct {
    pub const ID: &'static str = "constant-product";
}

impl CurveStrategy for ConstantProduct {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn lp_token_supply(&self, reserves: &[BigInt], _params: &[u8]) -> Option<BigInt> {
        let n = u32::try_from(reserves.len()).ok()?;
        if n < 2 || reserves.iter().any(|r| r.is_negative()) {
            return None;
        }
        let product = reserves.iter().fold(BigInt::one(), |acc, r| acc * r);
        Some(product.nth_root(n) * BigInt::from(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_three_tokens() {
        let curve = ConstantProduct;
        let reserves = vec![BigInt::from(8), BigInt::from(27), BigInt::from(125)];
        // cbrt(27000) = 30
        assert_eq!(curve.lp_token_supply(&reserves, &[]), Some(BigInt::from(90)));
    }

    #[test]
    fn test_empty_pool_has_zero_supply() {
        let curve = ConstantProduct;
        let reserves = vec![BigInt::from(0), BigInt::from(27)];
        assert_eq!(curve.lp_token_supply(&reserves, &[]), Some(BigInt::from(0)));
    }

    #[test]
    fn test_balanced_move_is_proportional() {
        let curve = ConstantProduct;
        let reserves = vec![BigInt::from(900), BigInt::from(300), BigInt::from(600)];
        let out = curve
            .lp_token_underlying(&BigInt::from(10), &reserves, &BigInt::from(100), &[])
            .unwrap();
        assert_eq!(out, vec![BigInt::from(90), BigInt::from(30), BigInt::from(60)]);
    }
}
