use super::types::{Bytes32, DBlock, EBlock, Entry, FactomError, Heights};

/// Read access to a remote Factom ledger.
///
/// Implemented by `FactomClient` for factomd, and by in-memory fakes in tests.
#[async_trait::async_trait]
pub trait LedgerSource: Send + Sync {
	/// The node's current heights.
	async fn heights(&self) -> Result<Heights, FactomError>;

	/// The directory block at `height`.
	async fn dblock_by_height(&self, height: u32) -> Result<DBlock, FactomError>;

	/// The entry block with the given key merkle root.
	async fn entry_block(&self, key_mr: &Bytes32) -> Result<EBlock, FactomError>;

	/// The entry with the given hash, content included and verified against the hash.
	async fn entry(&self, hash: &Bytes32) -> Result<Entry, FactomError>;
}
