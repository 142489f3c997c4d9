//! Entity models held by the pool state store.

pub mod checkpoint;
pub mod event;
pub mod pool;
pub mod record;
pub mod snapshot;
pub mod token;
pub mod volume;

pub use checkpoint::Checkpoint;
pub use event::{EventKind, FeedRecord, PoolEvent};
pub use pool::{CurveRef, Pool, PoolRegistration};
pub use record::{block_time, EventId, EventRecord, LiquidityRecord, SwapRecord};
pub use snapshot::{PoolSnapshot, SnapshotKey, SnapshotPeriod};
pub use token::Token;
pub use volume::VolumeStats;
