mod client;
mod ops;

pub use client::{MemoryStore, StoreExport};
