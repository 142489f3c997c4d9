//! Error types for the aggregation engine.

use alloy::primitives::Address;
use thiserror::Error;

/// Errors that abort a single per-event update.
///
/// Any of these leaves the store untouched: the pool, its snapshots and the
/// event record are committed together or not at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Pool not found: {0}")]
    PoolNotFound(Address),

    #[error("Pool already registered: {0}")]
    PoolAlreadyRegistered(Address),

    #[error("Invalid pool definition: {0}")]
    InvalidPool(String),

    #[error("No curve strategy registered for curve id `{curve_id}`")]
    StrategyUnavailable { curve_id: String },

    #[error("Token {token} is not part of pool {pool}")]
    UnknownToken { pool: Address, token: Address },

    #[error("Expected {expected} token amounts, got {got}")]
    AmountLengthMismatch { expected: usize, got: usize },

    #[error("Price oracle error: {0}")]
    Oracle(String),

    #[error("Store error: {0}")]
    Store(String),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
