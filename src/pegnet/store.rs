use crate::pegnet::GradedBlock;
use crate::utils::write_atomic;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum StoreError {
	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	#[error("Encoding error: {0}")]
	EncodingError(#[from] bincode::Error),

	#[error("JSON error: {0}")]
	JsonError(#[from] serde_json::Error),
}

/// Durable pegnet state the synchronizer applies graded blocks to.
#[async_trait::async_trait]
pub trait PegnetStore: Send + Sync {
	/// Insert the graded block for its height. Either the whole block lands or nothing does;
	/// inserting the same height again replaces the earlier block.
	async fn insert_graded_block(&self, graded: &GradedBlock) -> Result<(), StoreError>;
}

/// File based implementation of PegnetStore
pub struct FileStore {
	data_dir: PathBuf,
}

impl FileStore {
	pub fn new(data_dir: PathBuf) -> Self {
		Self { data_dir }
	}

	fn get_graded_block_filename(&self, height: u32) -> PathBuf {
		self.data_dir.join(format!("graded_block_{}.bin", height))
	}

	/// Load the graded block stored for `height`, if any.
	pub async fn load_graded_block(&self, height: u32) -> Result<Option<GradedBlock>, StoreError> {
		let filename = self.get_graded_block_filename(height);
		if !filename.exists() {
			return Ok(None);
		}

		let bytes = tokio::fs::read(&filename).await?;
		Ok(Some(bincode::deserialize(&bytes)?))
	}
}

#[async_trait::async_trait]
impl PegnetStore for FileStore {
	async fn insert_graded_block(&self, graded: &GradedBlock) -> Result<(), StoreError> {
		let bytes = bincode::serialize(graded)?;
		let filename = self.get_graded_block_filename(graded.height);
		write_atomic(&filename, &bytes).await?;

		info!(
			height = graded.height,
			records = graded.records.len(),
			winners = graded.winners.len(),
			"Saved graded block to {:?}",
			filename
		);
		Ok(())
	}
}
