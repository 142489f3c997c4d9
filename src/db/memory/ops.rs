use alloy::primitives::Address;
use log::debug;

use crate::{
    db::{
        models::{
            Checkpoint, EventId, EventRecord, Pool, PoolSnapshot, SnapshotKey, SnapshotPeriod,
            Token,
        },
        MemoryStore, StateStore, WriteBatch,
    },
    error::{EngineError, EngineResult},
};

impl StateStore for MemoryStore {
    fn get_pool(&self, id: &Address) -> EngineResult<Option<Pool>> {
        Ok(self.read()?.pools.get(id).cloned())
    }

    fn get_pools(&self) -> EngineResult<Vec<Pool>> {
        let mut pools: Vec<Pool> = self.read()?.pools.values().cloned().collect();
        pools.sort_by_key(|p| p.id);
        Ok(pools)
    }

    fn get_snapshot(&self, key: &SnapshotKey) -> EngineResult<Option<PoolSnapshot>> {
        Ok(self.read()?.snapshots.get(key).cloned())
    }

    fn get_snapshots(
        &self,
        pool: &Address,
        period: SnapshotPeriod,
    ) -> EngineResult<Vec<PoolSnapshot>> {
        let start = SnapshotKey {
            pool: *pool,
            period,
            period_id: i64::MIN,
        };
        let end = SnapshotKey {
            pool: *pool,
            period,
            period_id: i64::MAX,
        };
        Ok(self
            .read()?
            .snapshots
            .range(start..=end)
            .map(|(_, snapshot)| snapshot.clone())
            .collect())
    }

    fn get_token(&self, address: &Address) -> EngineResult<Option<Token>> {
        Ok(self.read()?.tokens.get(address).cloned())
    }

    fn get_record(&self, id: &EventId) -> EngineResult<Option<EventRecord>> {
        Ok(self.read()?.records.get(id).cloned())
    }

    fn get_checkpoint(&self, pool: &Address) -> EngineResult<Option<Checkpoint>> {
        Ok(self.read()?.checkpoints.get(pool).cloned())
    }

    fn commit(&self, batch: WriteBatch) -> EngineResult<()> {
        let mut tables = self.write()?;

        // Validate before mutating anything
        for record in &batch.records {
            if tables.records.contains_key(&record.id()) {
                return Err(EngineError::Store(format!(
                    "event record {}:{} already exists",
                    record.id().tx_hash,
                    record.id().log_index
                )));
            }
        }

        debug!(
            "Committing batch: {} pools, {} snapshots, {} tokens, {} records",
            batch.pools.len(),
            batch.snapshots.len(),
            batch.tokens.len(),
            batch.records.len()
        );

        tables.pools.extend(batch.pools);
        tables.snapshots.extend(batch.snapshots);
        tables.tokens.extend(batch.tokens);
        for record in batch.records {
            tables.records.insert(record.id(), record);
        }
        tables.checkpoints.extend(batch.checkpoints);

        Ok(())
    }
}
