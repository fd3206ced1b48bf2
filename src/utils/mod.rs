//!
//! Utility module for pegnetd.
//!
//! Filesystem helpers shared by the file backed repositories.
/// Atomic file writes
pub mod fs;

pub use fs::write_atomic;
