//! PegNet domain module
//!
//! Everything the synchronizer needs to know about pegnet itself: which chains to follow, how
//! oracle price records are graded, where graded blocks are stored, and how transactions are named.

/// Oracle price record grading
pub mod grading;
/// Durable storage of graded blocks
pub mod store;
/// Chains followed by the synchronizer
pub mod tracking;
/// Transaction identifier codec
pub mod txid;

pub use grading::{DifficultyGrader, GradeError, GradedBlock, GradedRecord, Grader};
pub use store::{FileStore, PegnetStore, StoreError};
pub use tracking::{ChainTracking, OPR_CHAIN, TRANSACTION_CHAIN};
pub use txid::{DEFAULT_PAD, MAX_INDEX, TxId, TxIdError};
