//! Directory block synchronization.
//!
//! `DBlockSynchronizer` walks the factom ledger one directory block at a time. For every height it
//! pulls the entry blocks of the tracked chains, grades the oracle price records, and stores the
//! graded block. The sync cursor only moves past a height once all of that succeeded, so a crash or
//! a failed fetch never leaves a height half applied.
//!
//! Any failure abandons the current pass: the synchronizer backs off and asks the node for its
//! height again instead of retrying the same height in place. A node restarted with a different
//! database reports a fresh height and the next pass starts from there.

use crate::factom::{Bytes32, DBlock, EBlock, Entry, FactomError, LedgerSource};
use crate::node::cursor::{CursorRepository, SyncCursor};
use crate::node::progress::SyncProgress;
use crate::node::shutdown::Shutdown;
use crate::node::types::{HeightOutcome, PassOutcome, SyncError};
use crate::pegnet::{ChainTracking, Grader, OPR_CHAIN, PegnetStore, StoreError};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// An entry block with all of its entries fetched.
#[derive(Debug, Clone)]
pub struct ResolvedEBlock {
	pub eblock: EBlock,
	pub entries: Vec<Entry>,
}

/// What a successfully synced height contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncedBlock {
	pub height: u32,
	/// Tracked chains present at this height.
	pub tracked_eblocks: usize,
	/// Whether a graded block was stored.
	pub graded: bool,
}

pub struct DBlockSynchronizer {
	ledger: Arc<dyn LedgerSource>,
	tracking: ChainTracking,
	grader: Arc<dyn Grader>,
	store: Arc<dyn PegnetStore>,
	cursor_repo: Arc<dyn CursorRepository>,
	/// Wait between passes when caught up or after a failure.
	retry_period: Duration,
	progress: SyncProgress,
}

impl DBlockSynchronizer {
	pub fn new(
		ledger: Arc<dyn LedgerSource>,
		tracking: ChainTracking,
		grader: Arc<dyn Grader>,
		store: Arc<dyn PegnetStore>,
		cursor_repo: Arc<dyn CursorRepository>,
		retry_period: Duration,
	) -> Self {
		Self {
			ledger,
			tracking,
			grader,
			store,
			cursor_repo,
			retry_period,
			progress: SyncProgress::new(0),
		}
	}

	/// The persisted cursor, or a fresh one when nothing was synced yet.
	pub async fn load_cursor(&self) -> Result<SyncCursor, StoreError> {
		Ok(self.cursor_repo.load().await?.unwrap_or_default())
	}

	pub fn progress(&self) -> &SyncProgress {
		&self.progress
	}

	/// Sync until `shutdown` is cancelled and return the final cursor.
	///
	/// Heights are applied strictly in order, one at a time, starting at `cursor.next()`.
	pub async fn run(&mut self, mut cursor: SyncCursor, shutdown: &Shutdown) -> SyncCursor {
		info!(synced = cursor.synced, "Starting directory block sync");
		self.progress = SyncProgress::new(cursor.synced);

		loop {
			match self.sync_pass(&mut cursor, shutdown).await {
				PassOutcome::Cancelled => {
					info!(synced = cursor.synced, "Directory block sync stopped");
					self.progress.log_progress(true);
					return cursor;
				}
				PassOutcome::Unreachable(e) => {
					error!(error = %e, "failed to fetch heights");
					tokio::time::sleep(self.retry_period).await;
				}
				PassOutcome::CaughtUp { remote } => {
					if cursor.synced > remote {
						// Most likely factomd was rebooted and is still catching up itself.
						warn!(synced = cursor.synced, remote, "local sync is ahead of factomd");
					} else {
						debug!(synced = cursor.synced, "synced, nothing to do");
					}
					tokio::time::sleep(self.retry_period).await;
				}
				PassOutcome::Synced { to } => {
					debug!(synced = to, "caught up with factomd");
				}
				PassOutcome::HeightFailed { height, error } => {
					let cause = std::error::Error::source(&error)
						.map(ToString::to_string)
						.unwrap_or_default();
					error!(height, error = %error, cause = %cause, "failed to sync height");
					tokio::time::sleep(self.retry_period).await;
				}
			}
		}
	}

	/// One pass of the outer loop: query the remote height, then apply every height up to it.
	///
	/// The first failing height ends the pass. The remote height is queried once per pass.
	pub async fn sync_pass(&mut self, cursor: &mut SyncCursor, shutdown: &Shutdown) -> PassOutcome {
		if shutdown.is_cancelled() {
			return PassOutcome::Cancelled;
		}

		let remote = match self.ledger.heights().await {
			Ok(heights) => heights.directory_block,
			Err(e) => return PassOutcome::Unreachable(e),
		};

		if cursor.synced >= remote {
			return PassOutcome::CaughtUp { remote };
		}

		while cursor.synced < remote {
			match self.advance_height(cursor, shutdown).await {
				HeightOutcome::Advanced => self.progress.log_progress(false),
				HeightOutcome::Cancelled => return PassOutcome::Cancelled,
				HeightOutcome::RestartDiscovery(error) => {
					self.progress.record_failure();
					let height = error.height().unwrap_or_else(|| cursor.next());
					return PassOutcome::HeightFailed { height, error };
				}
			}
		}

		self.progress.log_progress(true);
		PassOutcome::Synced { to: remote }
	}

	/// Sync `cursor.next()` and move the cursor past it on success.
	pub async fn advance_height(&mut self, cursor: &mut SyncCursor, shutdown: &Shutdown) -> HeightOutcome {
		if shutdown.is_cancelled() {
			return HeightOutcome::Cancelled;
		}

		let height = cursor.next();
		let synced = match self.sync_block(height, shutdown).await {
			Ok(synced) => synced,
			Err(e) if e.is_cancelled() => return HeightOutcome::Cancelled,
			Err(e) => return HeightOutcome::RestartDiscovery(e),
		};

		// Persist first: the in-memory cursor must never run ahead of the saved one. If the
		// save fails the height is synced again, which the store tolerates.
		if let Err(source) = self.cursor_repo.save(&SyncCursor::new(height)).await {
			return HeightOutcome::RestartDiscovery(SyncError::Cursor { height, source });
		}

		cursor.advance();
		self.progress.record_applied(height, synced.graded);
		HeightOutcome::Advanced
	}

	/// Sync a single height.
	///
	/// On `Ok` the height's graded block (if any) is stored. On `Err` nothing was written.
	/// Cancellation is only honoured before the first fetch; once the store insert starts it runs
	/// to completion.
	pub async fn sync_block(&self, height: u32, shutdown: &Shutdown) -> Result<SyncedBlock, SyncError> {
		if shutdown.is_cancelled() {
			return Err(SyncError::Cancelled);
		}

		debug!(height, "syncing...");

		let dblock = self
			.ledger
			.dblock_by_height(height)
			.await
			.map_err(|source| SyncError::DirectoryBlock { height, source })?;

		debug!(height, key_mr = ?dblock.key_mr, entries = dblock.entries.len(), "fetched directory block");

		// Resolved eblocks only live for this call. A failure below drops them, nothing to undo.
		let eblocks = self.fetch_tracked_eblocks(height, &dblock).await?;

		let oprs = eblocks
			.get(OPR_CHAIN)
			.map(|resolved| resolved.entries.as_slice())
			.unwrap_or_default();
		let graded = self
			.grader
			.grade(height, oprs)
			.map_err(|source| SyncError::Grade { height, source })?;

		// TODO: apply the transaction chain once conversions and transfers are defined.

		if let Some(graded) = &graded {
			self.store
				.insert_graded_block(graded)
				.await
				.map_err(|source| SyncError::Apply { height, source })?;
		}

		debug!(height, eblocks = eblocks.len(), graded = graded.is_some(), "synced");
		Ok(SyncedBlock {
			height,
			tracked_eblocks: eblocks.len(),
			graded: graded.is_some(),
		})
	}

	/// Fetch every tracked entry block present in `dblock`, with all of its entries.
	async fn fetch_tracked_eblocks(
		&self,
		height: u32,
		dblock: &DBlock,
	) -> Result<BTreeMap<String, ResolvedEBlock>, SyncError> {
		let mut eblocks = BTreeMap::new();

		for (chain, chain_id) in self.tracking.iter() {
			let Some(reference) = dblock.eblock(chain_id) else {
				continue;
			};

			let eblock = self
				.ledger
				.entry_block(&reference.key_mr)
				.await
				.map_err(|source| SyncError::EntryBlock {
					height,
					chain: chain.to_string(),
					source,
				})?;

			if eblock.chain_id != *chain_id || eblock.height != height {
				return Err(SyncError::EntryBlock {
					height,
					chain: chain.to_string(),
					source: FactomError::MalformedEntry(format!(
						"entry block {} is for chain {} at height {}",
						reference.key_mr, eblock.chain_id, eblock.height
					)),
				});
			}

			let mut entries = Vec::with_capacity(eblock.entry_hashes.len());
			for hash in &eblock.entry_hashes {
				let entry = self
					.fetch_entry(chain_id, hash)
					.await
					.map_err(|source| SyncError::Entry {
						height,
						chain: chain.to_string(),
						hash: *hash,
						source,
					})?;
				entries.push(entry);
			}

			eblocks.insert(chain.to_string(), ResolvedEBlock { eblock, entries });
		}

		Ok(eblocks)
	}

	async fn fetch_entry(&self, chain_id: &Bytes32, hash: &Bytes32) -> Result<Entry, FactomError> {
		let entry = self.ledger.entry(hash).await?;
		if &entry.chain_id != chain_id {
			return Err(FactomError::MalformedEntry(format!(
				"entry {} belongs to chain {}, expected {}",
				hash, entry.chain_id, chain_id
			)));
		}
		Ok(entry)
	}
}
