//! Volume attribution: splits a reserve change into trade and transfer volume.
//!
//! Trade volume is counted on the bought side only. For a swap that is the
//! output token. For a liquidity operation the bought amounts are implicit:
//! the operation is decomposed into a perfectly proportional move of the same
//! LP amount plus a residual swap, and the residual is the trade vector.
//!
//! Example: adding 1500 BEAN to a 1500 BEAN / 1 ETH constant-product pool is
//! equivalent to buying ~0.29289 ETH for ~621 BEAN and then adding both tokens
//! proportionally.

use log::debug;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::{
    curves::CurveStrategy,
    db::models::Pool,
    engine::normalize::{NormalizedEvent, Operation},
    utils::{clamp_non_negative, vectors},
};

/// Per-token attribution of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    /// Signed trade vector: positive = bought by the actor, negative = sold
    pub trade: Vec<BigInt>,
    /// Unsigned gross movement per token
    pub transfer: Vec<BigInt>,
}

/// Attribute `event` against the pool state before it.
pub fn attribute(pool: &Pool, event: &NormalizedEvent, curve: &dyn CurveStrategy) -> Attribution {
    let n = pool.token_count();

    match &event.operation {
        Operation::Swap {
            from_index,
            amount_in,
            to_index,
            amount_out,
        } => {
            let mut trade = vectors::zeros(n);
            trade[*to_index] += amount_out.abs();

            let mut transfer = vectors::zeros(n);
            transfer[*from_index] += amount_in.abs();
            transfer[*to_index] += amount_out.abs();

            Attribution { trade, transfer }
        }
        Operation::Deposit | Operation::Withdraw => Attribution {
            trade: liquidity_trade(pool, &event.delta_reserves, &event.delta_lp, curve),
            transfer: vectors::abs(&event.delta_reserves),
        },
    }
}

/// Implied trade vector of a liquidity operation.
///
/// The proportional part is evaluated against the state with the larger LP
/// supply: the post-deposit state for deposits, the pre-withdrawal state for
/// withdrawals. `trade = ±proportional − deltaReserves`.
///
/// Returns zeros when there is no prior supply (pool genesis), when no LP
/// moved, or when the curve has no answer for the reference state.
pub fn liquidity_trade(
    pool: &Pool,
    delta_reserves: &[BigInt],
    delta_lp: &BigInt,
    curve: &dyn CurveStrategy,
) -> Vec<BigInt> {
    let n = pool.token_count();
    if pool.lp_token_supply.is_zero() || delta_lp.is_zero() {
        return vectors::zeros(n);
    }

    let deposit = delta_lp.is_positive();
    let (reference_reserves, reference_supply) = if deposit {
        let after: Vec<BigInt> = vectors::add(&pool.reserves, delta_reserves)
            .into_iter()
            .map(|r| clamp_non_negative(r).0)
            .collect();
        (after, &pool.lp_token_supply + delta_lp)
    } else {
        (pool.reserves.clone(), pool.lp_token_supply.clone())
    };
    if !reference_supply.is_positive() {
        return vectors::zeros(n);
    }

    let proportional = match curve.lp_token_underlying(
        &delta_lp.abs(),
        &reference_reserves,
        &reference_supply,
        pool.curve.params.as_ref(),
    ) {
        Some(amounts) if amounts.len() == n => amounts,
        _ => {
            debug!(
                "Curve {} returned no underlying amounts for pool {}, no implied trade",
                curve.id(),
                pool.id
            );
            return vectors::zeros(n);
        }
    };

    let signed = if deposit {
        proportional
    } else {
        vectors::neg(&proportional)
    };
    vectors::sub(&signed, delta_reserves)
}
