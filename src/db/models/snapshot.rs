use std::fmt;

use alloy::primitives::Address;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::{
    db::models::{Pool, VolumeStats},
    utils::{bigint_string, vec_bigint_string},
};

/// Snapshot granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotPeriod {
    Hourly,
    Daily,
}

impl fmt::Display for SnapshotPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotPeriod::Hourly => write!(f, "hourly"),
            SnapshotPeriod::Daily => write!(f, "daily"),
        }
    }
}

/// Primary key of a snapshot: (pool, period, period id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub pool: Address,
    pub period: SnapshotPeriod,
    pub period_id: i64,
}

impl SnapshotKey {
    pub fn hourly(pool: Address, hour_id: i64) -> Self {
        Self {
            pool,
            period: SnapshotPeriod::Hourly,
            period_id: hour_id,
        }
    }

    pub fn daily(pool: Address, day_id: i64) -> Self {
        Self {
            pool,
            period: SnapshotPeriod::Daily,
            period_id: day_id,
        }
    }
}

/// Pool state captured at the close of an hour or day.
///
/// Population: written by the snapshot scheduler the first time an event
/// (or heartbeat) is seen in a later period than the last closed one.
///
/// Query Patterns:
///   - "Get TVL history for pool X over 30 days"
///   - "Get hourly volume for pool X"
///
/// The `delta_*` fields hold the change against the previous snapshot of the
/// same granularity; the first snapshot of a pool carries zero deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    // Identifiers
    pub pool: Address,
    pub period: SnapshotPeriod,
    pub period_id: i64,

    // Liquidity state
    #[serde(with = "bigint_string")]
    pub lp_token_supply: BigInt,
    #[serde(with = "vec_bigint_string")]
    pub reserves: Vec<BigInt>,
    pub reserves_usd: Vec<BigDecimal>,
    pub total_liquidity_usd: BigDecimal,

    // Cumulative stats as of the period close
    pub cumulative: VolumeStats,
    pub cumulative_deposit_count: u64,
    pub cumulative_withdraw_count: u64,
    pub cumulative_swap_count: u64,

    // Change since the previous snapshot
    #[serde(with = "bigint_string")]
    pub delta_lp_token_supply: BigInt,
    pub delta_liquidity_usd: BigDecimal,
    pub delta: VolumeStats,
    pub delta_deposit_count: u64,
    pub delta_withdraw_count: u64,
    pub delta_swap_count: u64,

    // Activity tracking
    pub last_update_timestamp: u64,
    pub last_update_block_number: u64,
}

impl PoolSnapshot {
    /// Copy the pool's current state into a snapshot with zero deltas.
    pub fn capture(pool: &Pool, key: SnapshotKey) -> Self {
        let n = pool.token_count();
        Self {
            pool: pool.id,
            period: key.period,
            period_id: key.period_id,
            lp_token_supply: pool.lp_token_supply.clone(),
            reserves: pool.reserves.clone(),
            reserves_usd: pool.reserves_usd.clone(),
            total_liquidity_usd: pool.total_liquidity_usd.clone(),
            cumulative: pool.cumulative.clone(),
            cumulative_deposit_count: pool.cumulative_deposit_count,
            cumulative_withdraw_count: pool.cumulative_withdraw_count,
            cumulative_swap_count: pool.cumulative_swap_count,
            delta_lp_token_supply: BigInt::from(0),
            delta_liquidity_usd: BigDecimal::from(0),
            delta: VolumeStats::empty(n),
            delta_deposit_count: 0,
            delta_withdraw_count: 0,
            delta_swap_count: 0,
            last_update_timestamp: pool.last_update_timestamp,
            last_update_block_number: pool.last_update_block_number,
        }
    }

    /// Fill the delta fields as `self − previous`.
    pub fn with_deltas_from(mut self, previous: &PoolSnapshot) -> Self {
        self.delta_lp_token_supply = &self.lp_token_supply - &previous.lp_token_supply;
        self.delta_liquidity_usd = &self.total_liquidity_usd - &previous.total_liquidity_usd;
        self.delta = self.cumulative.difference(&previous.cumulative);
        self.delta_deposit_count = self
            .cumulative_deposit_count
            .saturating_sub(previous.cumulative_deposit_count);
        self.delta_withdraw_count = self
            .cumulative_withdraw_count
            .saturating_sub(previous.cumulative_withdraw_count);
        self.delta_swap_count = self
            .cumulative_swap_count
            .saturating_sub(previous.cumulative_swap_count);
        self
    }

    pub fn key(&self) -> SnapshotKey {
        SnapshotKey {
            pool: self.pool,
            period: self.period,
            period_id: self.period_id,
        }
    }
}
