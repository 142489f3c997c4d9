//! Snapshot scheduler.
//!
//! Runs on the pool state *before* the event (or heartbeat) that carries the
//! new timestamp, so everything already applied belongs to earlier periods.
//! A snapshot is keyed by the period it closes: an event in hour `h` closes
//! hour `h - 1`.
//!
//! Per granularity:
//! - first close ever: snapshot of the last completed period, zero deltas
//! - later closes: the period after the last recorded one gets the real
//!   delta (all activity since the last close happened in it); if more
//!   periods passed, the last completed one gets a zero-delta carry-forward
//!
//! After an hourly close, every hourly bucket that left the 24h / 168h window
//! is subtracted from the matching rolling accumulator.

use log::{debug, info};

use crate::{
    db::{
        models::{Pool, PoolSnapshot, SnapshotKey, SnapshotPeriod},
        StagedStore,
    },
    error::EngineResult,
    utils::{day_from_timestamp, hour_from_timestamp, HOURS_PER_DAY, HOURS_PER_WEEK},
};

/// Which periods a scheduler pass closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosedPeriods {
    pub hour: Option<i64>,
    pub day: Option<i64>,
}

impl ClosedPeriods {
    pub fn any(&self) -> bool {
        self.hour.is_some() || self.day.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SnapshotScheduler {
    day_offset_seconds: i64,
}

impl SnapshotScheduler {
    pub fn new(day_offset_seconds: i64) -> Self {
        Self { day_offset_seconds }
    }

    /// Close every hour and day that ended before `timestamp`.
    pub fn advance(
        &self,
        pool: &mut Pool,
        staged: &mut StagedStore<'_>,
        timestamp: u64,
    ) -> EngineResult<ClosedPeriods> {
        let timestamp = i64::try_from(timestamp).unwrap_or(i64::MAX);

        let hour = hour_from_timestamp(timestamp) - 1;
        let day = day_from_timestamp(timestamp, self.day_offset_seconds) - 1;

        let previous_hour = pool.last_snapshot_hour_id;
        let closed_hour = close_period(pool, staged, SnapshotPeriod::Hourly, hour)?;
        if closed_hour {
            if let Some(previous) = previous_hour {
                evict_expired(pool, staged, previous, hour)?;
            }
        }

        let closed_day = close_period(pool, staged, SnapshotPeriod::Daily, day)?;

        Ok(ClosedPeriods {
            hour: closed_hour.then_some(hour),
            day: closed_day.then_some(day),
        })
    }
}

fn last_id(pool: &Pool, period: SnapshotPeriod) -> Option<i64> {
    match period {
        SnapshotPeriod::Hourly => pool.last_snapshot_hour_id,
        SnapshotPeriod::Daily => pool.last_snapshot_day_id,
    }
}

fn set_last_id(pool: &mut Pool, period: SnapshotPeriod, id: i64) {
    match period {
        SnapshotPeriod::Hourly => pool.last_snapshot_hour_id = Some(id),
        SnapshotPeriod::Daily => pool.last_snapshot_day_id = Some(id),
    }
}

fn key(pool: &Pool, period: SnapshotPeriod, id: i64) -> SnapshotKey {
    match period {
        SnapshotPeriod::Hourly => SnapshotKey::hourly(pool.id, id),
        SnapshotPeriod::Daily => SnapshotKey::daily(pool.id, id),
    }
}

/// Close `period` up to and including `closing`. Returns whether anything
/// was closed.
fn close_period(
    pool: &mut Pool,
    staged: &mut StagedStore<'_>,
    period: SnapshotPeriod,
    closing: i64,
) -> EngineResult<bool> {
    let Some(last) = last_id(pool, period) else {
        let snapshot = PoolSnapshot::capture(pool, key(pool, period, closing));
        info!(
            "Pool {} first {} snapshot at period {}",
            pool.id, period, closing
        );
        staged.set_snapshot(snapshot);
        set_last_id(pool, period, closing);
        return Ok(true);
    };

    if closing <= last {
        return Ok(false);
    }

    // Lazily materialize the previous snapshot if it was never stored
    let previous = match staged.get_snapshot(&key(pool, period, last))? {
        Some(snapshot) => snapshot,
        None => {
            debug!(
                "Pool {} missing {} snapshot {}, recreating from current state",
                pool.id, period, last
            );
            let snapshot = PoolSnapshot::capture(pool, key(pool, period, last));
            staged.set_snapshot(snapshot.clone());
            snapshot
        }
    };

    let active = PoolSnapshot::capture(pool, key(pool, period, last + 1))
        .with_deltas_from(&previous);
    debug!(
        "Pool {} closed {} period {} (swaps +{}, deposits +{}, withdrawals +{})",
        pool.id,
        period,
        last + 1,
        active.delta_swap_count,
        active.delta_deposit_count,
        active.delta_withdraw_count
    );

    if closing > last + 1 {
        let carried = PoolSnapshot::capture(pool, key(pool, period, closing))
            .with_deltas_from(&active);
        staged.set_snapshot(carried);
    }
    staged.set_snapshot(active);

    set_last_id(pool, period, closing);
    Ok(true)
}

/// Subtract hourly buckets `(previous - w, closing - w]` from the window of
/// width `w`, for both rolling windows.
///
/// No bucket between `previous + 1` and `closing` is ever stored, so the scan
/// stops at `previous + 1`.
fn evict_expired(
    pool: &mut Pool,
    staged: &StagedStore<'_>,
    previous: i64,
    closing: i64,
) -> EngineResult<()> {
    for width in [HOURS_PER_DAY, HOURS_PER_WEEK] {
        let last_expired = (closing - width).min(previous + 1);
        for expired in (previous - width + 1)..=last_expired {
            let Some(bucket) =
                staged.get_snapshot(&key(pool, SnapshotPeriod::Hourly, expired))?
            else {
                continue;
            };
            let window = if width == HOURS_PER_DAY {
                &mut pool.rolling_daily
            } else {
                &mut pool.rolling_weekly
            };
            window.subtract(&bucket.delta);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        models::{CurveRef, PoolRegistration},
        MemoryStore, StateStore,
    };
    use alloy::primitives::{address, Address, Bytes};
    use num_bigint::BigInt;

    const WELL: Address = address!("bea0e11282e2bb5893bece110cf199501e872bad");
    const BEAN: Address = address!("bea0000029ad1c77d3d5d23ba2d8893db9d1efab");
    const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");

    const HOUR: u64 = 3_600;

    fn pool() -> Pool {
        Pool::from_registration(&PoolRegistration {
            pool: WELL,
            tokens: vec![BEAN, WETH],
            curve: CurveRef {
                id: "constant-product-2".to_string(),
                params: Bytes::new(),
            },
            block_number: 0,
            block_timestamp: 0,
        })
        .unwrap()
    }

    /// Run the scheduler at `timestamp` and commit its writes.
    fn advance(store: &MemoryStore, pool: &mut Pool, timestamp: u64) -> ClosedPeriods {
        let scheduler = SnapshotScheduler::new(0);
        let mut staged = StagedStore::new(store);
        let closed = scheduler.advance(pool, &mut staged, timestamp).unwrap();
        staged.batch_mut().set_pool(pool.clone());
        staged.commit().unwrap();
        closed
    }

    fn bump_trade(pool: &mut Pool, amount: i64) {
        pool.cumulative.trade_volume_reserves[0] += BigInt::from(amount);
        pool.rolling_daily.trade_volume_reserves[0] += BigInt::from(amount);
        pool.rolling_weekly.trade_volume_reserves[0] += BigInt::from(amount);
    }

    #[test]
    fn test_first_snapshot_has_zero_deltas() {
        let store = MemoryStore::new();
        let mut pool = pool();
        pool.cumulative.trade_volume_reserves[0] = BigInt::from(99);

        let closed = advance(&store, &mut pool, 10 * HOUR + 5);
        assert_eq!(closed.hour, Some(9));
        assert_eq!(pool.last_snapshot_hour_id, Some(9));

        let snapshot = store
            .get_snapshot(&SnapshotKey::hourly(WELL, 9))
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.cumulative.trade_volume_reserves[0], BigInt::from(99));
        assert_eq!(snapshot.delta.trade_volume_reserves[0], BigInt::from(0));
    }

    #[test]
    fn test_same_hour_does_not_close() {
        let store = MemoryStore::new();
        let mut pool = pool();
        advance(&store, &mut pool, 10 * HOUR);
        let closed = advance(&store, &mut pool, 10 * HOUR + 1_800);
        assert_eq!(closed.hour, None);
    }

    #[test]
    fn test_delta_lands_in_active_hour_and_gap_carries_forward() {
        let store = MemoryStore::new();
        let mut pool = pool();
        advance(&store, &mut pool, 10 * HOUR);

        // Activity during hour 10
        bump_trade(&mut pool, 40);

        // Next event in hour 14 closes hours 10..=13
        let closed = advance(&store, &mut pool, 14 * HOUR + 1);
        assert_eq!(closed.hour, Some(13));

        let active = store
            .get_snapshot(&SnapshotKey::hourly(WELL, 10))
            .unwrap()
            .unwrap();
        assert_eq!(active.delta.trade_volume_reserves[0], BigInt::from(40));

        let carried = store
            .get_snapshot(&SnapshotKey::hourly(WELL, 13))
            .unwrap()
            .unwrap();
        assert_eq!(carried.delta.trade_volume_reserves[0], BigInt::from(0));
        assert_eq!(carried.cumulative.trade_volume_reserves[0], BigInt::from(40));
    }

    #[test]
    fn test_rolling_daily_evicts_hour_after_24() {
        let store = MemoryStore::new();
        let mut pool = pool();
        advance(&store, &mut pool, 100 * HOUR);

        // 30 consecutive active hours, trade = hour number
        for h in 100..130u64 {
            advance(&store, &mut pool, h * HOUR + 10);
            bump_trade(&mut pool, h as i64);
        }
        advance(&store, &mut pool, 130 * HOUR);

        // Closed hours 100..=129 hold deltas; daily window = last 24 of them
        let expected: i64 = (106..130).sum();
        assert_eq!(
            pool.rolling_daily.trade_volume_reserves[0],
            BigInt::from(expected)
        );
        // Weekly window is not yet full
        let all: i64 = (100..130).sum();
        assert_eq!(
            pool.rolling_weekly.trade_volume_reserves[0],
            BigInt::from(all)
        );
        assert_eq!(pool.cumulative.trade_volume_reserves[0], BigInt::from(all));
    }

    #[test]
    fn test_idle_gap_evicts_every_expired_bucket() {
        let store = MemoryStore::new();
        let mut pool = pool();
        advance(&store, &mut pool, 100 * HOUR);
        bump_trade(&mut pool, 5);
        advance(&store, &mut pool, 101 * HOUR);
        bump_trade(&mut pool, 7);

        // Two days of silence: both buckets leave the daily window
        advance(&store, &mut pool, 160 * HOUR);
        assert_eq!(pool.rolling_daily.trade_volume_reserves[0], BigInt::from(0));
        assert_eq!(pool.rolling_weekly.trade_volume_reserves[0], BigInt::from(12));
    }

    #[test]
    fn test_day_boundary_uses_offset() {
        let store = MemoryStore::new();
        let mut pool = pool();
        let scheduler = SnapshotScheduler::new(8 * 3_600);

        let mut staged = StagedStore::new(&store);
        // 07:00 UTC on day 2 is still day 1 under an 8h offset
        let closed = scheduler
            .advance(&mut pool, &mut staged, 2 * 86_400 + 7 * HOUR)
            .unwrap();
        assert_eq!(closed.day, Some(0));

        let closed = scheduler
            .advance(&mut pool, &mut staged, 2 * 86_400 + 9 * HOUR)
            .unwrap();
        assert_eq!(closed.day, Some(1));
    }
}
