//! Pool state store.
//!
//! The engine reads entities through [`StateStore`] and writes them back as a
//! single [`WriteBatch`] per event, so an event is either fully applied (pool,
//! snapshots, tokens, record and checkpoint) or not applied at all.

use std::collections::BTreeMap;

use alloy::primitives::Address;
use rustc_hash::FxHashMap;

use crate::error::EngineResult;

pub mod memory;
pub mod models;

pub use memory::{MemoryStore, StoreExport};

use models::{
    Checkpoint, EventId, EventRecord, Pool, PoolSnapshot, SnapshotKey, SnapshotPeriod, Token,
};

// ============================================
// Repository
// ============================================

/// Read access to persisted entities plus atomic batch commit.
pub trait StateStore: Send + Sync {
    fn get_pool(&self, id: &Address) -> EngineResult<Option<Pool>>;

    fn get_pools(&self) -> EngineResult<Vec<Pool>>;

    fn get_snapshot(&self, key: &SnapshotKey) -> EngineResult<Option<PoolSnapshot>>;

    /// All snapshots of one granularity for a pool, ordered by period id.
    fn get_snapshots(
        &self,
        pool: &Address,
        period: SnapshotPeriod,
    ) -> EngineResult<Vec<PoolSnapshot>>;

    fn get_token(&self, address: &Address) -> EngineResult<Option<Token>>;

    fn get_record(&self, id: &EventId) -> EngineResult<Option<EventRecord>>;

    fn get_checkpoint(&self, pool: &Address) -> EngineResult<Option<Checkpoint>>;

    /// Apply every write in `batch`, or none of them.
    fn commit(&self, batch: WriteBatch) -> EngineResult<()>;
}

// ============================================
// Write Batch
// ============================================

/// All entity writes produced by one event (or heartbeat).
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub pools: FxHashMap<Address, Pool>,
    pub snapshots: BTreeMap<SnapshotKey, PoolSnapshot>,
    pub tokens: FxHashMap<Address, Token>,
    pub records: Vec<EventRecord>,
    pub checkpoints: FxHashMap<Address, Checkpoint>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pool(&mut self, pool: Pool) {
        self.pools.insert(pool.id, pool);
    }

    pub fn set_snapshot(&mut self, snapshot: PoolSnapshot) {
        self.snapshots.insert(snapshot.key(), snapshot);
    }

    pub fn set_token(&mut self, token: Token) {
        self.tokens.insert(token.address, token);
    }

    pub fn push_record(&mut self, record: EventRecord) {
        self.records.push(record);
    }

    pub fn set_checkpoint(&mut self, checkpoint: Checkpoint) {
        self.checkpoints.insert(checkpoint.pool, checkpoint);
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
            && self.snapshots.is_empty()
            && self.tokens.is_empty()
            && self.records.is_empty()
            && self.checkpoints.is_empty()
    }
}

// ============================================
// Staged View
// ============================================

/// A store view that sees uncommitted writes before persisted ones.
///
/// Components working on the same event read through this so a snapshot
/// created earlier in the event is visible later in the same event.
pub struct StagedStore<'a> {
    store: &'a dyn StateStore,
    batch: WriteBatch,
}

impl<'a> StagedStore<'a> {
    pub fn new(store: &'a dyn StateStore) -> Self {
        Self {
            store,
            batch: WriteBatch::new(),
        }
    }

    pub fn get_snapshot(&self, key: &SnapshotKey) -> EngineResult<Option<PoolSnapshot>> {
        match self.batch.snapshots.get(key) {
            Some(snapshot) => Ok(Some(snapshot.clone())),
            None => self.store.get_snapshot(key),
        }
    }

    pub fn get_token(&self, address: &Address) -> EngineResult<Option<Token>> {
        match self.batch.tokens.get(address) {
            Some(token) => Ok(Some(token.clone())),
            None => self.store.get_token(address),
        }
    }

    pub fn set_snapshot(&mut self, snapshot: PoolSnapshot) {
        self.batch.set_snapshot(snapshot);
    }

    pub fn set_token(&mut self, token: Token) {
        self.batch.set_token(token);
    }

    pub fn batch_mut(&mut self) -> &mut WriteBatch {
        &mut self.batch
    }

    /// Hand the accumulated writes to the store.
    pub fn commit(self) -> EngineResult<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        self.store.commit(self.batch)
    }
}
