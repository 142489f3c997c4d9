use std::{
    collections::{BTreeMap, BTreeSet},
    hash::{Hash, Hasher},
    pin::pin,
};

use alloy::primitives::Address;
use anyhow::{Context, Result};
use futures::{Stream, StreamExt};
use log::{error, info, warn};
use rustc_hash::{FxHashMap, FxHasher};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    config::ReplaySettings,
    db::models::{FeedRecord, PoolEvent, PoolRegistration},
    engine::{EventProcessor, ProcessOutcome},
    error::EngineError,
    utils::{hour_from_timestamp, SECONDS_PER_HOUR},
};

/// Work item for a shard worker.
#[derive(Debug)]
enum ShardMessage {
    Register(PoolRegistration),
    Event(Box<PoolEvent>),
    Heartbeat { pool: Address, timestamp: u64 },
}

/// Totals reported at the end of a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub registered: u64,
    pub applied: u64,
    pub skipped: u64,
    pub heartbeats: u64,
    /// Events dropped because their pool had already failed
    pub rejected: u64,
    pub failed_pools: BTreeMap<Address, EngineError>,
}

impl ReplaySummary {
    fn merge(&mut self, other: ReplaySummary) {
        self.registered += other.registered;
        self.applied += other.applied;
        self.skipped += other.skipped;
        self.heartbeats += other.heartbeats;
        self.rejected += other.rejected;
        self.failed_pools.extend(other.failed_pools);
    }
}

/// Replays a feed across per-pool shards.
///
/// Every pool is pinned to one shard, so its events are applied in feed
/// order while different pools progress in parallel. When feed time enters a
/// new hour, a heartbeat is queued for every known pool so idle pools close
/// their periods on time. A pool stops at its first failing event; other
/// pools keep going.
pub struct ShardedReplayer {
    processor: EventProcessor,
    shards: usize,
    channel_capacity: usize,
    heartbeats: bool,
}

impl ShardedReplayer {
    pub fn new(processor: EventProcessor, settings: &ReplaySettings) -> Self {
        Self {
            processor,
            shards: settings.shards.max(1),
            channel_capacity: settings.channel_capacity.max(1),
            heartbeats: settings.heartbeats,
        }
    }

    fn shard_for(&self, pool: &Address) -> usize {
        let mut hasher = FxHasher::default();
        pool.hash(&mut hasher);
        (hasher.finish() % self.shards as u64) as usize
    }

    /// Replay `records` until the stream ends or `cancellation_token` fires.
    pub async fn run<S>(
        self,
        records: S,
        cancellation_token: CancellationToken,
    ) -> Result<ReplaySummary>
    where
        S: Stream<Item = Result<FeedRecord>>,
    {
        let mut senders = Vec::with_capacity(self.shards);
        let mut handles: Vec<JoinHandle<ReplaySummary>> = Vec::with_capacity(self.shards);
        for shard in 0..self.shards {
            let (tx, rx) = mpsc::channel(self.channel_capacity);
            let processor = self.processor.clone();
            handles.push(tokio::spawn(run_shard(shard, processor, rx)));
            senders.push(tx);
        }
        info!("Replay started with {} shards", self.shards);

        let mut records = pin!(records);
        let mut known_pools: BTreeSet<Address> = BTreeSet::new();
        let mut current_hour: Option<i64> = None;
        let mut dispatched: u64 = 0;

        loop {
            let record = tokio::select! {
                _ = cancellation_token.cancelled() => {
                    warn!("Replay cancelled after {} records", dispatched);
                    break;
                }
                next = records.next() => match next {
                    Some(record) => record.context("Failed to read feed record")?,
                    None => break,
                },
            };

            let timestamp = record.block_timestamp();
            let hour = hour_from_timestamp(i64::try_from(timestamp).unwrap_or(i64::MAX));
            if self.heartbeats && current_hour.is_some_and(|current| hour > current) {
                let hour_start = u64::try_from(hour * SECONDS_PER_HOUR).unwrap_or(timestamp);
                for pool in &known_pools {
                    let message = ShardMessage::Heartbeat {
                        pool: *pool,
                        timestamp: hour_start,
                    };
                    self.send(&senders, pool, message).await?;
                }
            }
            current_hour = Some(current_hour.map_or(hour, |current| current.max(hour)));

            let pool = record.pool();
            let message = match record {
                FeedRecord::Register(registration) => {
                    known_pools.insert(registration.pool);
                    ShardMessage::Register(registration)
                }
                FeedRecord::Event(event) => ShardMessage::Event(Box::new(event)),
            };
            self.send(&senders, &pool, message).await?;

            dispatched += 1;
            if dispatched % 100_000 == 0 {
                info!("Dispatched {} feed records", dispatched);
            }
        }

        // Closing the channels lets every worker drain and exit
        drop(senders);

        let mut summary = ReplaySummary::default();
        for handle in handles {
            summary.merge(handle.await.context("Shard worker panicked")?);
        }

        info!(
            "Replay finished: {} registered, {} applied, {} skipped, {} heartbeats, {} failed pools",
            summary.registered,
            summary.applied,
            summary.skipped,
            summary.heartbeats,
            summary.failed_pools.len()
        );
        Ok(summary)
    }

    async fn send(
        &self,
        senders: &[mpsc::Sender<ShardMessage>],
        pool: &Address,
        message: ShardMessage,
    ) -> Result<()> {
        let shard = self.shard_for(pool);
        senders[shard]
            .send(message)
            .await
            .map_err(|_| anyhow::anyhow!("Shard {} stopped accepting work", shard))
    }
}

/// Process one shard's messages in arrival order.
async fn run_shard(
    shard: usize,
    processor: EventProcessor,
    mut rx: mpsc::Receiver<ShardMessage>,
) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    let mut failed: FxHashMap<Address, EngineError> = FxHashMap::default();

    while let Some(message) = rx.recv().await {
        let pool = match &message {
            ShardMessage::Register(registration) => registration.pool,
            ShardMessage::Event(event) => event.pool,
            ShardMessage::Heartbeat { pool, .. } => *pool,
        };
        if failed.contains_key(&pool) {
            summary.rejected += 1;
            continue;
        }

        let result = match message {
            ShardMessage::Register(registration) => {
                match processor.register_pool(&registration) {
                    Ok(_) => {
                        summary.registered += 1;
                        Ok(())
                    }
                    Err(EngineError::PoolAlreadyRegistered(pool)) => {
                        warn!("[shard {}] Pool {} already registered", shard, pool);
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
            ShardMessage::Event(event) => match processor.process(&event) {
                Ok(ProcessOutcome::Applied { .. }) => {
                    summary.applied += 1;
                    Ok(())
                }
                Ok(ProcessOutcome::AlreadyApplied) => {
                    summary.skipped += 1;
                    Ok(())
                }
                Err(e) => Err(e),
            },
            ShardMessage::Heartbeat { pool, timestamp } => {
                processor.heartbeat(&pool, timestamp).map(|_| {
                    summary.heartbeats += 1;
                })
            }
        };

        if let Err(e) = result {
            error!("[shard {}] Pool {} stopped: {}", shard, pool, e);
            failed.insert(pool, e);
        }
    }

    summary.failed_pools.extend(failed);
    summary
}
