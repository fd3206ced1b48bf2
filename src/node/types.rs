use crate::factom::{Bytes32, FactomError};
use crate::pegnet::{GradeError, StoreError};

/// Errors that abort the sync of one height
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
	#[error("sync cancelled")]
	Cancelled,

	#[error("failed to fetch directory block {height}")]
	DirectoryBlock { height: u32, source: FactomError },

	#[error("failed to fetch {chain} entry block at height {height}")]
	EntryBlock {
		height: u32,
		chain: String,
		source: FactomError,
	},

	#[error("failed to fetch {chain} entry {hash} at height {height}")]
	Entry {
		height: u32,
		chain: String,
		hash: Bytes32,
		source: FactomError,
	},

	#[error("failed to grade height {height}")]
	Grade { height: u32, source: GradeError },

	#[error("failed to apply height {height}")]
	Apply { height: u32, source: StoreError },

	#[error("failed to save sync cursor at height {height}")]
	Cursor { height: u32, source: StoreError },
}

impl SyncError {
	/// The height the failure happened at. `None` for cancellation.
	pub fn height(&self) -> Option<u32> {
		match self {
			SyncError::Cancelled => None,
			SyncError::DirectoryBlock { height, .. }
			| SyncError::EntryBlock { height, .. }
			| SyncError::Entry { height, .. }
			| SyncError::Grade { height, .. }
			| SyncError::Apply { height, .. }
			| SyncError::Cursor { height, .. } => Some(*height),
		}
	}

	pub fn is_cancelled(&self) -> bool {
		matches!(self, SyncError::Cancelled)
	}
}

/// What the outer loop does after one height was attempted.
#[derive(Debug)]
pub enum HeightOutcome {
	/// The height was applied and the cursor moved past it.
	Advanced,
	/// The height failed. Back off and re-query the remote height before trying again.
	RestartDiscovery(SyncError),
	/// Cancellation was observed before the height started.
	Cancelled,
}

/// Result of one pass of the outer loop.
#[derive(Debug)]
pub enum PassOutcome {
	Cancelled,
	/// The height query failed.
	Unreachable(FactomError),
	/// Nothing to do: the cursor is at or above the remote height.
	CaughtUp { remote: u32 },
	/// Every height up to `to` was applied.
	Synced { to: u32 },
	HeightFailed { height: u32, error: SyncError },
}
