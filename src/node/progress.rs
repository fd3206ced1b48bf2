//! Progress tracking for directory block synchronization.
//!
//! `SyncProgress` counts what a sync session has applied and logs a summary at regular intervals
//! and whenever the synchronizer catches up with the remote node.

use tracing::info;

/// Heights between periodic progress logs.
const LOG_INTERVAL: u32 = 1000;

#[derive(Debug, Clone)]
pub struct SyncProgress {
	/// Cursor value when the session started
	start_height: u32,
	/// Highest height applied this session
	highest_applied: u32,
	/// Heights applied this session
	heights_applied: u64,
	/// Heights that produced a graded block
	graded_blocks: u64,
	/// Heights that failed and restarted discovery
	failures: u64,
	last_logged_height: u32,
}

impl SyncProgress {
	pub fn new(start_height: u32) -> Self {
		Self {
			start_height,
			highest_applied: start_height,
			heights_applied: 0,
			graded_blocks: 0,
			failures: 0,
			last_logged_height: start_height,
		}
	}

	/// Record an applied height and whether it carried a graded block.
	pub fn record_applied(&mut self, height: u32, graded: bool) {
		self.highest_applied = self.highest_applied.max(height);
		self.heights_applied += 1;
		if graded {
			self.graded_blocks += 1;
		}
	}

	pub fn record_failure(&mut self) {
		self.failures += 1;
	}

	/// Log progress every [`LOG_INTERVAL`] heights, or now when `force` is set.
	pub fn log_progress(&mut self, force: bool) {
		let since_last_log = self.highest_applied.saturating_sub(self.last_logged_height);
		if (force && since_last_log > 0) || since_last_log >= LOG_INTERVAL {
			info!("Sync progress: {}", self.summary());
			self.last_logged_height = self.highest_applied;
		}
	}

	pub fn highest_applied(&self) -> u32 {
		self.highest_applied
	}

	pub fn heights_applied(&self) -> u64 {
		self.heights_applied
	}

	pub fn summary(&self) -> String {
		format!(
			"synced {} to {}: {} heights applied, {} graded blocks{}",
			self.start_height,
			self.highest_applied,
			self.heights_applied,
			self.graded_blocks,
			if self.failures == 0 {
				String::new()
			} else {
				format!(" ({} failed attempts)", self.failures)
			}
		)
	}
}
