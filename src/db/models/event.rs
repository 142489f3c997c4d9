use alloy::primitives::{Address, B256};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::{
    db::models::PoolRegistration,
    utils::{bigint_string, opt_bigint_string, vec_bigint_string},
};

/// One on-chain pool log, as delivered by the event feed.
///
/// Events for the same pool must be applied in `(block_number, log_index)`
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEvent {
    // Identifiers
    pub pool: Address,
    pub block_number: u64,
    pub block_timestamp: u64,
    pub tx_hash: B256,
    pub log_index: u32,

    // Actor (swapper / liquidity provider / sync recipient)
    #[serde(default)]
    pub account: Address,

    #[serde(flatten)]
    pub kind: EventKind,
}

impl PoolEvent {
    /// Position of the event in the ordered stream.
    pub fn position(&self) -> (u64, u32) {
        (self.block_number, self.log_index)
    }
}

/// Event payloads.
///
/// Amounts are raw, token-native integers carried as decimal strings. Where
/// an event lists `tokens`, the amounts are aligned to that list and padded
/// to the pool's token order before attribution; an empty `tokens` list means
/// the amounts are already in pool order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// Explicit swap: `amount_in` of `from_token` for `amount_out` of `to_token`.
    Swap {
        from_token: Address,
        #[serde(with = "bigint_string")]
        amount_in: BigInt,
        to_token: Address,
        #[serde(with = "bigint_string")]
        amount_out: BigInt,
    },

    /// Swap reported as a reserve update: only the new reserves and the
    /// output side are known; the input side is inferred.
    Shift {
        #[serde(with = "vec_bigint_string")]
        reserves: Vec<BigInt>,
        to_token: Address,
        #[serde(with = "bigint_string")]
        amount_out: BigInt,
    },

    /// Reserve re-sync to `reserves`, optionally with the LP amount minted
    /// (positive) or burned (negative).
    Sync {
        #[serde(with = "vec_bigint_string")]
        reserves: Vec<BigInt>,
        #[serde(default, with = "opt_bigint_string")]
        lp_amount_out: Option<BigInt>,
    },

    AddLiquidity {
        #[serde(default)]
        tokens: Vec<Address>,
        #[serde(with = "vec_bigint_string")]
        token_amounts_in: Vec<BigInt>,
        #[serde(with = "bigint_string")]
        lp_amount_out: BigInt,
    },

    RemoveLiquidity {
        #[serde(with = "bigint_string")]
        lp_amount_in: BigInt,
        #[serde(default)]
        tokens: Vec<Address>,
        #[serde(with = "vec_bigint_string")]
        token_amounts_out: Vec<BigInt>,
    },

    RemoveLiquidityOneToken {
        #[serde(with = "bigint_string")]
        lp_amount_in: BigInt,
        token_out: Address,
        #[serde(with = "bigint_string")]
        token_amount_out: BigInt,
    },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Swap { .. } => "swap",
            EventKind::Shift { .. } => "shift",
            EventKind::Sync { .. } => "sync",
            EventKind::AddLiquidity { .. } => "add_liquidity",
            EventKind::RemoveLiquidity { .. } => "remove_liquidity",
            EventKind::RemoveLiquidityOneToken { .. } => "remove_liquidity_one_token",
        }
    }
}

/// One line of the replay feed: either a pool registration or an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedRecord {
    Register(PoolRegistration),
    Event(PoolEvent),
}

impl FeedRecord {
    pub fn pool(&self) -> Address {
        match self {
            FeedRecord::Register(registration) => registration.pool,
            FeedRecord::Event(event) => event.pool,
        }
    }

    pub fn block_timestamp(&self) -> u64 {
        match self {
            FeedRecord::Register(registration) => registration.block_timestamp,
            FeedRecord::Event(event) => event.block_timestamp,
        }
    }
}
