//! Directory Block Synchronization Module
//!
//! This module keeps the local pegnet state in step with the factom ledger:
//!
//! - `sync`: The synchronizer. Walks directory blocks in order and applies each height atomically.
//! - `cursor`: The sync cursor and the repositories that persist it across restarts.
//! - `progress`: Counts applied heights and logs progress.
//! - `shutdown`: Cooperative cancellation checked between heights.
//! - `types`: Sync errors and the outcomes the outer loop acts on.

/// Sync cursor and cursor persistence
pub mod cursor;
/// Sync progress tracking
pub mod progress;
/// Cancellation signal
pub mod shutdown;
/// Directory block synchronizer
pub mod sync;
/// Errors and loop outcomes
pub mod types;

#[cfg(test)]
mod testing;

pub use cursor::{CursorRepository, FileCursorRepository, SyncCursor};
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use sync::{DBlockSynchronizer, ResolvedEBlock, SyncedBlock};
pub use types::{HeightOutcome, PassOutcome, SyncError};
