//! Sync cursor and its persistence.
//!
//! The cursor records the highest height whose effects were fully applied. The synchronizer owns
//! it; repositories only load it at startup and save it after each applied height.

use crate::pegnet::StoreError;
use crate::utils::write_atomic;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Highest fully applied height. Height 0 (genesis) is never synced, so a fresh cursor starts
/// syncing at height 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCursor {
	pub synced: u32,
}

impl SyncCursor {
	pub fn new(synced: u32) -> Self {
		Self { synced }
	}

	/// The next height to sync.
	pub fn next(&self) -> u32 {
		self.synced + 1
	}

	/// Move past `height`, which must be [`SyncCursor::next`].
	pub(crate) fn advance(&mut self) {
		self.synced += 1;
	}
}

/// Repository for sync cursor persistence
#[async_trait::async_trait]
pub trait CursorRepository: Send + Sync {
	async fn load(&self) -> Result<Option<SyncCursor>, StoreError>;
	async fn save(&self, cursor: &SyncCursor) -> Result<(), StoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct SyncStateFile {
	synced_height: u32,
	timestamp: String,
}

/// File-based implementation of CursorRepository
pub struct FileCursorRepository {
	data_dir: PathBuf,
}

impl FileCursorRepository {
	pub fn new(data_dir: PathBuf) -> Self {
		Self { data_dir }
	}

	fn get_state_filename(&self) -> PathBuf {
		self.data_dir.join("sync_state.json")
	}
}

#[async_trait::async_trait]
impl CursorRepository for FileCursorRepository {
	async fn load(&self) -> Result<Option<SyncCursor>, StoreError> {
		let filename = self.get_state_filename();
		if !filename.exists() {
			return Ok(None);
		}

		let content = tokio::fs::read_to_string(&filename).await?;
		let state: SyncStateFile = serde_json::from_str(&content)?;

		info!(
			"Loaded sync state from {:?} at height {}",
			filename, state.synced_height
		);
		Ok(Some(SyncCursor::new(state.synced_height)))
	}

	async fn save(&self, cursor: &SyncCursor) -> Result<(), StoreError> {
		let state = SyncStateFile {
			synced_height: cursor.synced,
			timestamp: chrono::Utc::now().to_rfc3339(),
		};
		let content = serde_json::to_string_pretty(&state)?;
		write_atomic(&self.get_state_filename(), content.as_bytes()).await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fresh_cursor_skips_genesis() {
		let mut cursor = SyncCursor::default();
		assert_eq!(cursor.next(), 1);
		cursor.advance();
		assert_eq!(cursor, SyncCursor::new(1));
		assert_eq!(cursor.next(), 2);
	}

	#[tokio::test]
	async fn file_repository_roundtrip() {
		let dir = tempfile::tempdir().expect("tempdir");
		let repo = FileCursorRepository::new(dir.path().to_path_buf());

		assert_eq!(repo.load().await.expect("load"), None);

		repo.save(&SyncCursor::new(206_422)).await.expect("save");
		assert_eq!(repo.load().await.expect("load"), Some(SyncCursor::new(206_422)));

		let raw = std::fs::read_to_string(dir.path().join("sync_state.json")).expect("file");
		let json: serde_json::Value = serde_json::from_str(&raw).expect("json");
		assert_eq!(json["synced_height"], 206_422);
		assert!(json["timestamp"].is_string());
	}

	#[tokio::test]
	async fn corrupt_state_is_an_error() {
		let dir = tempfile::tempdir().expect("tempdir");
		std::fs::write(dir.path().join("sync_state.json"), "{").expect("write");
		let repo = FileCursorRepository::new(dir.path().to_path_buf());
		assert!(matches!(repo.load().await, Err(StoreError::JsonError(_))));
	}
}
