//! Utility functions for the Cistern engine.
//!
//! This module is organized into focused submodules:
//!
//! - [`conversion`] - Exact decimal conversions and serde adapters for big integers
//! - [`periods`] - Hour/day period ids and rolling window widths
//! - [`vectors`] - Element-wise math over per-token amount vectors

pub mod conversion;
pub mod periods;
pub mod vectors;

// ============================================
// Re-exports
// ============================================

// Conversion utilities
pub use conversion::{
    amount_to_usd, bigint_string, clamp_non_negative, opt_bigint_string, to_decimal,
    vec_bigint_string,
};

// Period utilities
pub use periods::{
    day_from_timestamp, hour_from_timestamp, HOURS_PER_DAY, HOURS_PER_WEEK, SECONDS_PER_DAY,
    SECONDS_PER_HOUR,
};

// Vector utilities
pub use vectors::pad_token_amounts;
