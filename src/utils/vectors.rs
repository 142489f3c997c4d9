//! Element-wise arithmetic over per-token amount vectors.
//!
//! Every per-token vector in a pool is index-aligned with the pool's token
//! list; these helpers assume equal lengths and are only called after the
//! event amounts have been padded to the pool's width.

use alloy::primitives::Address;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

/// A zero vector of length `n`.
pub fn zeros(n: usize) -> Vec<BigInt> {
    vec![BigInt::zero(); n]
}

pub fn add(a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

pub fn sub(a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

pub fn neg(a: &[BigInt]) -> Vec<BigInt> {
    a.iter().map(|x| -x).collect()
}

pub fn abs(a: &[BigInt]) -> Vec<BigInt> {
    a.iter().map(|x| x.abs()).collect()
}

pub fn is_zero(a: &[BigInt]) -> bool {
    a.iter().all(|x| x.is_zero())
}

/// Expand amounts reported for a subset of tokens into a full vector aligned
/// to `pool_tokens`, zero-filling every token the event did not mention.
///
/// Returns the offending token when an amount is reported for a token that is
/// not part of the pool.
pub fn pad_token_amounts(
    pool_tokens: &[Address],
    event_tokens: &[Address],
    amounts: &[BigInt],
) -> Result<Vec<BigInt>, Address> {
    let mut padded = zeros(pool_tokens.len());
    for (token, amount) in event_tokens.iter().zip(amounts) {
        let index = pool_tokens
            .iter()
            .position(|t| t == token)
            .ok_or(*token)?;
        padded[index] += amount;
    }
    Ok(padded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const BEAN: Address = address!("bea0000029ad1c77d3d5d23ba2d8893db9d1efab");
    const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    const USDC: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");

    fn ints(values: &[i64]) -> Vec<BigInt> {
        values.iter().map(|v| BigInt::from(*v)).collect()
    }

    #[test]
    fn test_pad_single_token_amount() {
        let padded = pad_token_amounts(&[BEAN, WETH], &[WETH], &ints(&[-42])).unwrap();
        assert_eq!(padded, ints(&[0, -42]));
    }

    #[test]
    fn test_pad_reordered_tokens() {
        let padded =
            pad_token_amounts(&[BEAN, WETH, USDC], &[USDC, BEAN], &ints(&[5, 7])).unwrap();
        assert_eq!(padded, ints(&[7, 0, 5]));
    }

    #[test]
    fn test_pad_rejects_foreign_token() {
        let err = pad_token_amounts(&[BEAN, WETH], &[USDC], &ints(&[1])).unwrap_err();
        assert_eq!(err, USDC);
    }

    #[test]
    fn test_elementwise_ops() {
        let a = ints(&[5, -3]);
        let b = ints(&[2, 4]);
        assert_eq!(add(&a, &b), ints(&[7, 1]));
        assert_eq!(sub(&a, &b), ints(&[3, -7]));
        assert_eq!(neg(&a), ints(&[-5, 3]));
        assert_eq!(abs(&a), ints(&[5, 3]));
        assert!(is_zero(&zeros(3)));
        assert!(!is_zero(&a));
    }
}
