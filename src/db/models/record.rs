use alloy::primitives::{Address, B256};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::utils::{bigint_string, vec_bigint_string};

/// Identity of a discrete event record: the source log's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId {
    pub tx_hash: B256,
    pub log_index: u32,
}

impl EventId {
    pub fn new(tx_hash: B256, log_index: u32) -> Self {
        Self { tx_hash, log_index }
    }
}

/// Immutable swap record (explicit Swap, or a Shift with its inferred input).
///
/// Query Pattern: "Get swap at tx X, log Y"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRecord {
    pub id: EventId,
    pub pool: Address,
    pub account: Address,

    pub from_token: Address,
    #[serde(with = "bigint_string")]
    pub amount_in: BigInt,
    pub to_token: Address,
    #[serde(with = "bigint_string")]
    pub amount_out: BigInt,

    // Token prices used for this update, aligned to the pool tokens
    pub token_prices_usd: Vec<BigDecimal>,

    pub block_number: u64,
    pub timestamp: DateTime<Utc>,
}

/// Immutable deposit or withdrawal record.
///
/// `reserves` holds the unsigned per-token amounts moved, padded to the pool
/// token order; `liquidity` is the unsigned LP amount minted or burned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityRecord {
    pub id: EventId,
    pub pool: Address,
    pub account: Address,

    pub tokens: Vec<Address>,
    #[serde(with = "vec_bigint_string")]
    pub reserves: Vec<BigInt>,
    #[serde(with = "bigint_string")]
    pub liquidity: BigInt,

    pub token_prices_usd: Vec<BigDecimal>,

    pub block_number: u64,
    pub timestamp: DateTime<Utc>,
}

/// Discrete event record, one per source event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum EventRecord {
    Swap(SwapRecord),
    Deposit(LiquidityRecord),
    Withdraw(LiquidityRecord),
}

impl EventRecord {
    pub fn id(&self) -> EventId {
        match self {
            EventRecord::Swap(record) => record.id,
            EventRecord::Deposit(record) | EventRecord::Withdraw(record) => record.id,
        }
    }
}

/// Convert a block timestamp (unix seconds) to a UTC datetime.
pub fn block_time(timestamp: u64) -> DateTime<Utc> {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_default()
}
