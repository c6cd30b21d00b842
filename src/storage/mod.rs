//! Durable storage: record snapshots and atomic file replacement.

pub mod atomic;
pub mod error;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use atomic::{write_atomic, write_atomic_all};
pub use error::{CacheError, CacheResult, StorageError};
pub use snapshot::RecordCache;
