//! Volume attribution and statistics aggregation.
//!
//! Per event, in order:
//!
//! 1. [`scheduler`] - close finished hours/days on the pre-event state and
//!    evict expired buckets from the rolling windows
//! 2. [`normalize`] - express the event as pool-aligned reserve/LP deltas
//! 3. [`attribution`] - split the deltas into trade and transfer volume
//! 4. [`aggregator`] - apply deltas, refresh prices, add volume
//!
//! [`EventProcessor`] runs the pipeline and commits the result atomically.

pub mod aggregator;
pub mod attribution;
pub mod normalize;
pub mod processor;
pub mod scheduler;

pub use aggregator::StatisticsAggregator;
pub use attribution::{attribute, liquidity_trade, Attribution};
pub use normalize::{normalize, NormalizedEvent, Operation};
pub use processor::{EventProcessor, ProcessOutcome};
pub use scheduler::{ClosedPeriods, SnapshotScheduler};
