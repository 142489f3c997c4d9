use std::{
    collections::BTreeMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use alloy::primitives::Address;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::{
    db::models::{Checkpoint, EventId, EventRecord, Pool, PoolSnapshot, SnapshotKey, Token},
    error::{EngineError, EngineResult},
};

/// Tables held by the in-memory store.
#[derive(Debug, Default)]
pub(super) struct Tables {
    pub pools: FxHashMap<Address, Pool>,
    // Ordered so range scans by (pool, period, id) come out sorted
    pub snapshots: BTreeMap<SnapshotKey, PoolSnapshot>,
    pub tokens: FxHashMap<Address, Token>,
    pub records: FxHashMap<EventId, EventRecord>,
    pub checkpoints: FxHashMap<Address, Checkpoint>,
}

/// In-process pool state store.
///
/// All tables sit behind one lock, so a batch commit is atomic with respect
/// to every reader.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub(super) tables: RwLock<Tables>,
}

/// Serializable dump of the whole store, ordered for stable output.
#[derive(Debug, Clone, Serialize)]
pub struct StoreExport {
    pub pools: Vec<Pool>,
    pub tokens: Vec<Token>,
    pub snapshots: Vec<PoolSnapshot>,
    pub records: Vec<EventRecord>,
    pub checkpoints: Vec<Checkpoint>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn read(&self) -> EngineResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| EngineError::Store("memory store lock poisoned".to_string()))
    }

    pub(super) fn write(&self) -> EngineResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| EngineError::Store("memory store lock poisoned".to_string()))
    }

    pub fn pool_count(&self) -> EngineResult<usize> {
        Ok(self.read()?.pools.len())
    }

    pub fn snapshot_count(&self) -> EngineResult<usize> {
        Ok(self.read()?.snapshots.len())
    }

    pub fn record_count(&self) -> EngineResult<usize> {
        Ok(self.read()?.records.len())
    }

    /// Copy every table out, sorted by primary key.
    pub fn export(&self) -> EngineResult<StoreExport> {
        let tables = self.read()?;

        let mut pools: Vec<Pool> = tables.pools.values().cloned().collect();
        pools.sort_by_key(|p| p.id);

        let mut tokens: Vec<Token> = tables.tokens.values().cloned().collect();
        tokens.sort_by_key(|t| t.address);

        let snapshots = tables.snapshots.values().cloned().collect();

        let mut records: Vec<EventRecord> = tables.records.values().cloned().collect();
        records.sort_by_key(|r| r.id());

        let mut checkpoints: Vec<Checkpoint> = tables.checkpoints.values().cloned().collect();
        checkpoints.sort_by_key(|c| c.pool);

        Ok(StoreExport {
            pools,
            tokens,
            snapshots,
            records,
            checkpoints,
        })
    }
}
