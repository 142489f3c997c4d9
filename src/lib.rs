pub mod config;
pub mod curves;
pub mod db;
pub mod engine;
pub mod error;
pub mod oracle;
pub mod replay;
pub mod utils;

pub use config::Settings;
pub use curves::{CurveRegistry, CurveStrategy};
pub use db::{MemoryStore, StateStore};
pub use engine::{EventProcessor, ProcessOutcome};
pub use error::{EngineError, EngineResult};
pub use oracle::{PriceOracle, TokenRegistry};
pub use replay::{FeedReader, ReplaySummary, ShardedReplayer};
