//! Feed replay: the ordered event source driving the engine.

pub mod feed;
pub mod shards;

pub use feed::{parse_feed, parse_line, FeedReader};
pub use shards::{ReplaySummary, ShardedReplayer};
