use alloy::primitives::{Address, Bytes};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::{
    db::models::VolumeStats,
    error::{EngineError, EngineResult},
    utils::{bigint_string, vec_bigint_string},
};

/// Reference to the invariant curve a pool prices with.
///
/// `id` is the registry key of a curve strategy (or an alias configured for
/// it, such as a well-function contract address); `params` is the opaque
/// parameter blob handed to the strategy on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveRef {
    pub id: String,
    #[serde(default)]
    pub params: Bytes,
}

/// Pool registration as delivered by the (external) pool discovery layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRegistration {
    pub pool: Address,
    pub tokens: Vec<Address>,
    pub curve: CurveRef,
    #[serde(default)]
    pub block_number: u64,
    #[serde(default)]
    pub block_timestamp: u64,
}

/// Liquidity pool ("Well") state and running statistics.
///
/// Primary Key: id
/// Query Pattern: "Get current reserves and volume for pool X"
///
/// Every per-token vector has exactly `tokens.len()` entries and is
/// index-aligned with `tokens`, whose order is fixed at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    // Primary key
    pub id: Address,

    // Topology (immutable after registration)
    pub tokens: Vec<Address>,
    pub curve: CurveRef,
    pub created_timestamp: u64,
    pub created_block_number: u64,

    // Liquidity state
    #[serde(with = "vec_bigint_string")]
    pub reserves: Vec<BigInt>,
    pub reserves_usd: Vec<BigDecimal>,
    pub total_liquidity_usd: BigDecimal,
    #[serde(with = "bigint_string")]
    pub lp_token_supply: BigInt,

    // Lifetime stats
    pub cumulative: VolumeStats,
    pub cumulative_deposit_count: u64,
    pub cumulative_withdraw_count: u64,
    pub cumulative_swap_count: u64,

    // Rolling window stats (24h / 7d)
    pub rolling_daily: VolumeStats,
    pub rolling_weekly: VolumeStats,

    // Snapshot bookkeeping: id of the most recently closed period
    pub last_snapshot_hour_id: Option<i64>,
    pub last_snapshot_day_id: Option<i64>,

    // Activity tracking
    pub last_update_timestamp: u64,
    pub last_update_block_number: u64,
}

impl Pool {
    /// Build a fresh pool with zeroed reserves and counters.
    pub fn from_registration(registration: &PoolRegistration) -> EngineResult<Self> {
        let tokens = &registration.tokens;
        if tokens.len() < 2 {
            return Err(EngineError::InvalidPool(format!(
                "pool {} has {} tokens, at least 2 are required",
                registration.pool,
                tokens.len()
            )));
        }
        for (i, token) in tokens.iter().enumerate() {
            if tokens[..i].contains(token) {
                return Err(EngineError::InvalidPool(format!(
                    "pool {} lists token {} twice",
                    registration.pool, token
                )));
            }
        }

        let n = tokens.len();
        Ok(Self {
            id: registration.pool,
            tokens: tokens.clone(),
            curve: registration.curve.clone(),
            created_timestamp: registration.block_timestamp,
            created_block_number: registration.block_number,
            reserves: vec![BigInt::from(0); n],
            reserves_usd: vec![BigDecimal::from(0); n],
            total_liquidity_usd: BigDecimal::from(0),
            lp_token_supply: BigInt::from(0),
            cumulative: VolumeStats::empty(n),
            cumulative_deposit_count: 0,
            cumulative_withdraw_count: 0,
            cumulative_swap_count: 0,
            rolling_daily: VolumeStats::empty(n),
            rolling_weekly: VolumeStats::empty(n),
            last_snapshot_hour_id: None,
            last_snapshot_day_id: None,
            last_update_timestamp: registration.block_timestamp,
            last_update_block_number: registration.block_number,
        })
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Position of `token` in the pool's fixed token order.
    pub fn token_index(&self, token: &Address) -> EngineResult<usize> {
        self.tokens
            .iter()
            .position(|t| t == token)
            .ok_or(EngineError::UnknownToken {
                pool: self.id,
                token: *token,
            })
    }
}
