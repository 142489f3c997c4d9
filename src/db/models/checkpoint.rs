use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::block_time;

/// Per-pool replay progress checkpoint.
///
/// Tracks the position of the last event applied to each pool. Written in
/// the same batch as the pool update, so resuming a replay never applies an
/// event twice or skips one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub pool: Address,
    pub block_number: u64,
    pub log_index: u32,
    /// Block time of the checkpointed event
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(pool: Address, block_number: u64, log_index: u32, block_timestamp: u64) -> Self {
        Self {
            pool,
            block_number,
            log_index,
            updated_at: block_time(block_timestamp),
        }
    }

    /// Whether an event at `position` was already applied.
    pub fn covers(&self, position: (u64, u32)) -> bool {
        position <= (self.block_number, self.log_index)
    }
}
