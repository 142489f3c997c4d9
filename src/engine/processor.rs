use std::sync::Arc;

use alloy::primitives::Address;
use bigdecimal::BigDecimal;
use log::{debug, info, warn};
use num_traits::Signed;

use crate::{
    config::Settings,
    curves::CurveRegistry,
    db::{
        models::{
            block_time, Checkpoint, EventId, EventRecord, LiquidityRecord, Pool, PoolEvent,
            PoolRegistration, SwapRecord, Token,
        },
        StagedStore, StateStore,
    },
    engine::{
        aggregator::StatisticsAggregator,
        attribution::attribute,
        normalize::{normalize, NormalizedEvent, Operation},
        scheduler::{ClosedPeriods, SnapshotScheduler},
    },
    error::{EngineError, EngineResult},
    oracle::{CachedPriceOracle, PriceBook, PriceOracle, TokenRegistry},
    utils::vectors,
};

/// Result of offering one event to the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Applied { closed: ClosedPeriods },
    /// At or before the pool's checkpoint; nothing was written
    AlreadyApplied,
}

/// Per-event driver of the aggregation pipeline.
///
/// Each call loads the pool, runs scheduler, attribution and aggregation on
/// a private copy, and commits pool, snapshots, tokens, record and checkpoint
/// in one batch. Any error leaves the store untouched.
///
/// Calls for the same pool must be serialized by the caller; different pools
/// can be processed concurrently.
#[derive(Clone)]
pub struct EventProcessor {
    store: Arc<dyn StateStore>,
    curves: Arc<CurveRegistry>,
    tokens: Arc<TokenRegistry>,
    aggregator: StatisticsAggregator,
    scheduler: SnapshotScheduler,
}

impl EventProcessor {
    pub fn new(
        store: Arc<dyn StateStore>,
        curves: CurveRegistry,
        tokens: TokenRegistry,
        oracle: Arc<dyn PriceOracle>,
        day_offset_seconds: i64,
    ) -> Self {
        Self {
            store,
            curves: Arc::new(curves),
            tokens: Arc::new(tokens),
            aggregator: StatisticsAggregator::new(oracle),
            scheduler: SnapshotScheduler::new(day_offset_seconds),
        }
    }

    /// Wire curves, token metadata and a cached price book from settings.
    pub fn from_settings(store: Arc<dyn StateStore>, settings: &Settings) -> Self {
        let mut curves = CurveRegistry::with_defaults();
        for (alias, id) in &settings.curves.aliases {
            curves.add_alias(alias, id);
        }

        let tokens =
            TokenRegistry::from_settings(&settings.tokens, settings.engine.default_token_decimals);

        let book = PriceBook::from_settings(&settings.oracle.prices);
        info!("Price book loaded for {} tokens", book.token_count());
        let oracle = CachedPriceOracle::new(book, settings.oracle.cache_capacity);

        Self::new(
            store,
            curves,
            tokens,
            Arc::new(oracle),
            settings.engine.day_offset_seconds,
        )
    }

    /// Create a pool and any of its tokens not seen before.
    pub fn register_pool(&self, registration: &PoolRegistration) -> EngineResult<Pool> {
        if self.store.get_pool(&registration.pool)?.is_some() {
            return Err(EngineError::PoolAlreadyRegistered(registration.pool));
        }
        let pool = Pool::from_registration(registration)?;

        let mut staged = StagedStore::new(self.store.as_ref());
        for address in &pool.tokens {
            if staged.get_token(address)?.is_none() {
                staged.set_token(self.tokens.create_token(address));
            }
        }
        staged.batch_mut().set_pool(pool.clone());
        staged.commit()?;

        info!(
            "Registered pool {} ({} tokens, curve {})",
            pool.id,
            pool.token_count(),
            pool.curve.id
        );
        Ok(pool)
    }

    /// Apply one event atomically.
    pub fn process(&self, event: &PoolEvent) -> EngineResult<ProcessOutcome> {
        let mut pool = self
            .store
            .get_pool(&event.pool)?
            .ok_or(EngineError::PoolNotFound(event.pool))?;

        if let Some(checkpoint) = self.store.get_checkpoint(&pool.id)? {
            if checkpoint.covers(event.position()) {
                warn!(
                    "Skipping {} at {}:{} for pool {}, already applied",
                    event.kind.name(),
                    event.block_number,
                    event.log_index,
                    pool.id
                );
                return Ok(ProcessOutcome::AlreadyApplied);
            }
        }

        let curve = self.curves.resolve(&pool.curve.id)?;
        let mut staged = StagedStore::new(self.store.as_ref());

        let closed = self
            .scheduler
            .advance(&mut pool, &mut staged, event.block_timestamp)?;

        let normalized = normalize(&pool, event, curve.as_ref())?;
        let attribution = attribute(&pool, &normalized, curve.as_ref());

        let mut tokens = self.load_tokens(&pool, &staged)?;
        let prices = self.aggregator.apply(
            &mut pool,
            &mut tokens,
            &normalized,
            &attribution,
            event.block_number,
            event.block_timestamp,
        )?;

        debug!(
            "Applied {} to pool {} at {}:{} (trade {:?})",
            event.kind.name(),
            pool.id,
            event.block_number,
            event.log_index,
            attribution
                .trade
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
        );

        let record = build_record(&pool, event, &normalized, prices);
        let checkpoint = Checkpoint::new(
            pool.id,
            event.block_number,
            event.log_index,
            event.block_timestamp,
        );

        for token in tokens {
            staged.set_token(token);
        }
        let batch = staged.batch_mut();
        batch.set_pool(pool);
        batch.push_record(record);
        batch.set_checkpoint(checkpoint);
        staged.commit()?;

        Ok(ProcessOutcome::Applied { closed })
    }

    /// Close periods for an idle pool as of `timestamp`.
    ///
    /// Only snapshot bookkeeping and rolling windows change; counters and
    /// the last-update fields are untouched.
    pub fn heartbeat(&self, pool_id: &Address, timestamp: u64) -> EngineResult<ClosedPeriods> {
        let mut pool = self
            .store
            .get_pool(pool_id)?
            .ok_or(EngineError::PoolNotFound(*pool_id))?;

        let mut staged = StagedStore::new(self.store.as_ref());
        let closed = self.scheduler.advance(&mut pool, &mut staged, timestamp)?;
        if closed.any() {
            staged.batch_mut().set_pool(pool);
            staged.commit()?;
        }
        Ok(closed)
    }

    /// Pool tokens in pool order, creating unseen ones from metadata.
    fn load_tokens(&self, pool: &Pool, staged: &StagedStore<'_>) -> EngineResult<Vec<Token>> {
        pool.tokens
            .iter()
            .map(|address| {
                Ok(match staged.get_token(address)? {
                    Some(token) => token,
                    None => self.tokens.create_token(address),
                })
            })
            .collect()
    }
}

fn build_record(
    pool: &Pool,
    event: &PoolEvent,
    normalized: &NormalizedEvent,
    token_prices_usd: Vec<BigDecimal>,
) -> EventRecord {
    let id = EventId::new(event.tx_hash, event.log_index);
    let timestamp = block_time(event.block_timestamp);

    match &normalized.operation {
        Operation::Swap {
            from_index,
            amount_in,
            to_index,
            amount_out,
        } => EventRecord::Swap(SwapRecord {
            id,
            pool: pool.id,
            account: event.account,
            from_token: pool.tokens[*from_index],
            amount_in: amount_in.clone(),
            to_token: pool.tokens[*to_index],
            amount_out: amount_out.clone(),
            token_prices_usd,
            block_number: event.block_number,
            timestamp,
        }),
        Operation::Deposit | Operation::Withdraw => {
            let record = LiquidityRecord {
                id,
                pool: pool.id,
                account: event.account,
                tokens: pool.tokens.clone(),
                reserves: vectors::abs(&normalized.delta_reserves),
                liquidity: normalized.delta_lp.abs(),
                token_prices_usd,
                block_number: event.block_number,
                timestamp,
            };
            if normalized.operation == Operation::Deposit {
                EventRecord::Deposit(record)
            } else {
                EventRecord::Withdraw(record)
            }
        }
    }
}
