use alloy::primitives::U256;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::{curves::CurveStrategy, utils::conversion::big_pow10};

/// Target precision reserves are scaled to before solving the invariant.
const PRECISION_DECIMALS: u32 = 18;
const DEFAULT_AMPLIFICATION: u32 = 10;
const MAX_ITERATIONS: usize = 255;
const N_COINS: u32 = 2;

/// Two-token stable-swap invariant.
///
/// `lpSupply = D`, solved by Newton iteration on
/// `A·n^n·Σx + D = A·D·n^n + D^(n+1) / (n^n·Πx)` with reserves scaled to
/// 18 decimals.
///
/// Params are ABI words: `decimals0`, `decimals1`, optional amplification.
/// Empty params mean both tokens have 18 decimals and `A = 10`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stable2;

impl Stable2 {
    pub const ID: &'static str = "stable-2";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stable2Params {
    decimals: [u32; 2],
    amplification: u32,
}

fn decode_params(params: &[u8]) -> Option<Stable2Params> {
    if params.is_empty() {
        return Some(Stable2Params {
            decimals: [PRECISION_DECIMALS; 2],
            amplification: DEFAULT_AMPLIFICATION,
        });
    }
    if params.len() % 32 != 0 || params.len() < 64 {
        return None;
    }
    let word = |i: usize| u32::try_from(U256::from_be_slice(&params[i * 32..(i + 1) * 32])).ok();

    let decimals = [word(0)?, word(1)?];
    if decimals.iter().any(|d| *d > PRECISION_DECIMALS) {
        return None;
    }
    let amplification = if params.len() >= 96 {
        word(2)?
    } else {
        DEFAULT_AMPLIFICATION
    };
    if amplification == 0 {
        return None;
    }
    Some(Stable2Params {
        decimals,
        amplification,
    })
}

/// Solve for `D` given reserves already scaled to a common precision.
fn solve_invariant(xp: &[BigInt; 2], amplification: u32) -> Option<BigInt> {
    let sum: BigInt = xp.iter().sum();
    if sum.is_zero() {
        return Some(BigInt::zero());
    }
    if xp.iter().any(|x| x.is_zero()) {
        return None;
    }

    let one = BigInt::from(1u32);
    let n = BigInt::from(N_COINS);
    let ann = BigInt::from(amplification) * BigInt::from(N_COINS.pow(N_COINS));
    let mut d = sum.clone();

    for _ in 0..MAX_ITERATIONS {
        let mut d_p = d.clone();
        for x in xp {
            d_p = d_p * &d / (x * &n);
        }
        let previous = d.clone();
        let numerator = (&ann * &sum + &d_p * &n) * &d;
        let denominator: BigInt = (&ann - &one) * &d + (&n + &one) * &d_p;
        if denominator.is_zero() {
            return None;
        }
        d = numerator / denominator;

        if (&d - &previous).abs() <= one {
            return Some(d);
        }
    }
    None
}

impl CurveStrategy for Stable2 {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn lp_token_supply(&self, reserves: &[BigInt], params: &[u8]) -> Option<BigInt> {
        let [r0, r1] = reserves else {
            return None;
        };
        if r0.is_negative() || r1.is_negative() {
            return None;
        }
        let params = decode_params(params)?;
        let xp = [
            r0 * big_pow10(PRECISION_DECIMALS - params.decimals[0]),
            r1 * big_pow10(PRECISION_DECIMALS - params.decimals[1]),
        ];
        solve_invariant(&xp, params.amplification)
    }
}
