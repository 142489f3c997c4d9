//! Event normalization.
//!
//! Reduces every event kind to a signed reserve delta and LP delta aligned to
//! the pool's token order, plus the operation the event represents. Shift
//! events get their input side inferred here; Syncs without an LP amount get
//! one derived from the curve.

use alloy::primitives::Address;
use log::{debug, warn};
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::{
    curves::CurveStrategy,
    db::models::{EventKind, Pool, PoolEvent},
    error::{EngineError, EngineResult},
    utils::{pad_token_amounts, vectors},
};

/// What the event did, economically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Swap {
        from_index: usize,
        amount_in: BigInt,
        to_index: usize,
        amount_out: BigInt,
    },
    Deposit,
    Withdraw,
}

/// An event expressed as pool-aligned deltas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub operation: Operation,
    /// Signed change of every reserve (negative = left the pool)
    pub delta_reserves: Vec<BigInt>,
    /// Signed change of LP supply (negative = burned)
    pub delta_lp: BigInt,
}

/// Normalize `event` against the pool state before it.
pub fn normalize(
    pool: &Pool,
    event: &PoolEvent,
    curve: &dyn CurveStrategy,
) -> EngineResult<NormalizedEvent> {
    let n = pool.token_count();

    match &event.kind {
        EventKind::Swap {
            from_token,
            amount_in,
            to_token,
            amount_out,
        } => {
            let from_index = pool.token_index(from_token)?;
            let to_index = pool.token_index(to_token)?;

            let mut delta_reserves = vectors::zeros(n);
            delta_reserves[from_index] += amount_in;
            delta_reserves[to_index] -= amount_out;

            Ok(NormalizedEvent {
                operation: Operation::Swap {
                    from_index,
                    amount_in: amount_in.clone(),
                    to_index,
                    amount_out: amount_out.clone(),
                },
                delta_reserves,
                delta_lp: BigInt::zero(),
            })
        }

        EventKind::Shift {
            reserves,
            to_token,
            amount_out,
        } => {
            ensure_len(n, reserves.len())?;
            let to_index = pool.token_index(to_token)?;
            let delta_reserves = vectors::sub(reserves, &pool.reserves);
            let from_index = infer_from_index(&delta_reserves, to_index);

            let mut amount_in = delta_reserves[from_index].clone();
            if amount_in.is_negative() {
                warn!(
                    "Shift on pool {} at block {} decreased the inferred input reserve, treating amount in as 0",
                    pool.id, event.block_number
                );
                amount_in = BigInt::zero();
            }

            Ok(NormalizedEvent {
                operation: Operation::Swap {
                    from_index,
                    amount_in,
                    to_index,
                    amount_out: amount_out.clone(),
                },
                delta_reserves,
                delta_lp: BigInt::zero(),
            })
        }

        EventKind::Sync {
            reserves,
            lp_amount_out,
        } => {
            ensure_len(n, reserves.len())?;
            let delta_reserves = vectors::sub(reserves, &pool.reserves);
            let delta_lp = match lp_amount_out {
                Some(lp) => lp.clone(),
                None => derive_sync_lp_delta(pool, reserves, curve),
            };
            let operation = if delta_lp.is_negative() {
                Operation::Withdraw
            } else {
                Operation::Deposit
            };

            Ok(NormalizedEvent {
                operation,
                delta_reserves,
                delta_lp,
            })
        }

        EventKind::AddLiquidity {
            tokens,
            token_amounts_in,
            lp_amount_out,
        } => Ok(NormalizedEvent {
            operation: Operation::Deposit,
            delta_reserves: align_amounts(pool, tokens, token_amounts_in)?,
            delta_lp: lp_amount_out.clone(),
        }),

        EventKind::RemoveLiquidity {
            lp_amount_in,
            tokens,
            token_amounts_out,
        } => Ok(NormalizedEvent {
            operation: Operation::Withdraw,
            delta_reserves: vectors::neg(&align_amounts(pool, tokens, token_amounts_out)?),
            delta_lp: -lp_amount_in,
        }),

        EventKind::RemoveLiquidityOneToken {
            lp_amount_in,
            token_out,
            token_amount_out,
        } => {
            let index = pool.token_index(token_out)?;
            let mut delta_reserves = vectors::zeros(n);
            delta_reserves[index] -= token_amount_out;

            Ok(NormalizedEvent {
                operation: Operation::Withdraw,
                delta_reserves,
                delta_lp: -lp_amount_in,
            })
        }
    }
}

fn ensure_len(expected: usize, got: usize) -> EngineResult<()> {
    if expected != got {
        return Err(EngineError::AmountLengthMismatch { expected, got });
    }
    Ok(())
}

/// Pad amounts reported for `tokens` to the pool's width. An empty token
/// list means the amounts are already in pool order.
fn align_amounts(
    pool: &Pool,
    tokens: &[Address],
    amounts: &[BigInt],
) -> EngineResult<Vec<BigInt>> {
    if tokens.is_empty() {
        ensure_len(pool.token_count(), amounts.len())?;
        return Ok(amounts.to_vec());
    }
    ensure_len(tokens.len(), amounts.len())?;
    pad_token_amounts(&pool.tokens, tokens, amounts).map_err(|token| {
        EngineError::UnknownToken {
            pool: pool.id,
            token,
        }
    })
}

/// Input side of a Shift: the only other token for two-token pools,
/// otherwise the non-output token whose reserve grew the most.
fn infer_from_index(delta_reserves: &[BigInt], to_index: usize) -> usize {
    let mut best: Option<usize> = None;
    for (i, delta) in delta_reserves.iter().enumerate() {
        if i == to_index {
            continue;
        }
        match best {
            Some(b) if delta_reserves[b] >= *delta => {}
            _ => best = Some(i),
        }
    }
    best.unwrap_or(to_index)
}

/// LP delta implied by a Sync to `new_reserves`:
/// `supply * S(new) / S(old) - supply`, where `S` is the curve's supply
/// function. A pool without supply mints `S(new)`.
fn derive_sync_lp_delta(
    pool: &Pool,
    new_reserves: &[BigInt],
    curve: &dyn CurveStrategy,
) -> BigInt {
    let params = pool.curve.params.as_ref();
    let Some(new_invariant) = curve.lp_token_supply(new_reserves, params) else {
        debug!(
            "Curve {} has no supply for sync reserves of pool {}",
            curve.id(),
            pool.id
        );
        return BigInt::zero();
    };
    if pool.lp_token_supply.is_zero() {
        return new_invariant;
    }
    match curve.lp_token_supply(&pool.reserves, params) {
        Some(old_invariant) if old_invariant.is_positive() => {
            &pool.lp_token_supply * &new_invariant / &old_invariant - &pool.lp_token_supply
        }
        _ => BigInt::zero(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        curves::ConstantProduct2,
        db::models::{CurveRef, PoolRegistration},
    };
    use alloy::primitives::{address, Bytes, B256};

    const WELL: Address = address!("bea0e11282e2bb5893bece110cf199501e872bad");
    const BEAN: Address = address!("bea0000029ad1c77d3d5d23ba2d8893db9d1efab");
    const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    const USDC: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");

    fn pool(tokens: Vec<Address>, reserves: Vec<i64>, supply: i64) -> Pool {
        let mut pool = Pool::from_registration(&PoolRegistration {
            pool: WELL,
            tokens,
            curve: CurveRef {
                id: ConstantProduct2::ID.to_string(),
                params: Bytes::new(),
            },
            block_number: 0,
            block_timestamp: 0,
        })
        .unwrap();
        pool.reserves = reserves.into_iter().map(BigInt::from).collect();
        pool.lp_token_supply = BigInt::from(supply);
        pool
    }

    fn event(kind: EventKind) -> PoolEvent {
        PoolEvent {
            pool: WELL,
            block_number: 10,
            block_timestamp: 36_000,
            tx_hash: B256::ZERO,
            log_index: 0,
            account: Address::ZERO,
            kind,
        }
    }

    fn ints(values: &[i64]) -> Vec<BigInt> {
        values.iter().map(|v| BigInt::from(*v)).collect()
    }

    #[test]
    fn test_swap_deltas() {
        let pool = pool(vec![BEAN, WETH], vec![1000, 1000], 1000);
        let normalized = normalize(
            &pool,
            &event(EventKind::Swap {
                from_token: BEAN,
                amount_in: BigInt::from(50),
                to_token: WETH,
                amount_out: BigInt::from(45),
            }),
            &ConstantProduct2,
        )
        .unwrap();
        assert_eq!(normalized.delta_reserves, ints(&[50, -45]));
        assert!(matches!(normalized.operation, Operation::Swap { .. }));
    }

    #[test]
    fn test_shift_infers_input_side() {
        let pool = pool(vec![BEAN, WETH], vec![1000, 1000], 1000);
        let normalized = normalize(
            &pool,
            &event(EventKind::Shift {
                reserves: ints(&[1100, 910]),
                to_token: WETH,
                amount_out: BigInt::from(90),
            }),
            &ConstantProduct2,
        )
        .unwrap();
        assert_eq!(
            normalized.operation,
            Operation::Swap {
                from_index: 0,
                amount_in: BigInt::from(100),
                to_index: 1,
                amount_out: BigInt::from(90),
            }
        );
        assert_eq!(normalized.delta_reserves, ints(&[100, -90]));
    }

    #[test]
    fn test_shift_three_tokens_picks_largest_increase() {
        let pool = pool(vec![BEAN, WETH, USDC], vec![1000, 1000, 1000], 1000);
        let normalized = normalize(
            &pool,
            &event(EventKind::Shift {
                reserves: ints(&[1001, 900, 1120]),
                to_token: WETH,
                amount_out: BigInt::from(100),
            }),
            &ConstantProduct2,
        )
        .unwrap();
        let Operation::Swap {
            from_index,
            amount_in,
            ..
        } = normalized.operation
        else {
            panic!("shift should normalize to a swap");
        };
        assert_eq!(from_index, 2);
        assert_eq!(amount_in, BigInt::from(120));
    }

    #[test]
    fn test_single_token_removal_is_padded() {
        let pool = pool(vec![BEAN, WETH, USDC], vec![1000, 1000, 1000], 1000);
        let normalized = normalize(
            &pool,
            &event(EventKind::RemoveLiquidityOneToken {
                lp_amount_in: BigInt::from(30),
                token_out: USDC,
                token_amount_out: BigInt::from(80),
            }),
            &ConstantProduct2,
        )
        .unwrap();
        assert_eq!(normalized.operation, Operation::Withdraw);
        assert_eq!(normalized.delta_reserves, ints(&[0, 0, -80]));
        assert_eq!(normalized.delta_lp, BigInt::from(-30));
    }

    #[test]
    fn test_add_liquidity_subset_of_tokens() {
        let pool = pool(vec![BEAN, WETH, USDC], vec![1000, 1000, 1000], 1000);
        let normalized = normalize(
            &pool,
            &event(EventKind::AddLiquidity {
                tokens: vec![USDC, BEAN],
                token_amounts_in: ints(&[7, 3]),
                lp_amount_out: BigInt::from(5),
            }),
            &ConstantProduct2,
        )
        .unwrap();
        assert_eq!(normalized.delta_reserves, ints(&[3, 0, 7]));
    }

    #[test]
    fn test_amount_length_mismatch() {
        let pool = pool(vec![BEAN, WETH], vec![0, 0], 0);
        let result = normalize(
            &pool,
            &event(EventKind::AddLiquidity {
                tokens: vec![],
                token_amounts_in: ints(&[1, 2, 3]),
                lp_amount_out: BigInt::from(5),
            }),
            &ConstantProduct2,
        );
        assert_eq!(
            result,
            Err(EngineError::AmountLengthMismatch {
                expected: 2,
                got: 3
            })
        );
    }

    #[test]
    fn test_foreign_token_is_rejected() {
        let pool = pool(vec![BEAN, WETH], vec![0, 0], 0);
        let result = normalize(
            &pool,
            &event(EventKind::AddLiquidity {
                tokens: vec![USDC],
                token_amounts_in: ints(&[1]),
                lp_amount_out: BigInt::from(5),
            }),
            &ConstantProduct2,
        );
        assert_eq!(
            result,
            Err(EngineError::UnknownToken {
                pool: WELL,
                token: USDC
            })
        );
    }

    #[test]
    fn test_sync_derives_lp_delta_from_curve() {
        // sqrt(4 * 9 * 1e12) = 6e6, sqrt(16 * 9 * 1e12) = 12e6
        let pool = pool(vec![BEAN, WETH], vec![4, 9], 600);
        let normalized = normalize(
            &pool,
            &event(EventKind::Sync {
                reserves: ints(&[16, 9]),
                lp_amount_out: None,
            }),
            &ConstantProduct2,
        )
        .unwrap();
        assert_eq!(normalized.operation, Operation::Deposit);
        assert_eq!(normalized.delta_reserves, ints(&[12, 0]));
        assert_eq!(normalized.delta_lp, BigInt::from(600));
    }

    #[test]
    fn test_sync_with_negative_lp_is_withdrawal() {
        let pool = pool(vec![BEAN, WETH], vec![4, 9], 600);
        let normalized = normalize(
            &pool,
            &event(EventKind::Sync {
                reserves: ints(&[2, 9]),
                lp_amount_out: Some(BigInt::from(-100)),
            }),
            &ConstantProduct2,
        )
        .unwrap();
        assert_eq!(normalized.operation, Operation::Withdraw);
        assert_eq!(normalized.delta_lp, BigInt::from(-100));
    }
}
