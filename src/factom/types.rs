//! Types for the factomd JSON-RPC integration
//!
//! Domain types are what the rest of the daemon works with. The `Wire*` structs mirror the JSON
//! shapes returned by the factomd v2 API and are converted into domain types by the client.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::str::FromStr;

/// A 32 byte value: chain ids, key merkle roots and entry hashes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Bytes32(pub [u8; 32]);

impl Bytes32 {
	pub fn as_bytes(&self) -> &[u8; 32] {
		&self.0
	}

	pub fn to_hex(&self) -> String {
		hex::encode(self.0)
	}
}

impl fmt::Display for Bytes32 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_hex())
	}
}

impl fmt::Debug for Bytes32 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Bytes32({})", self.to_hex())
	}
}

impl FromStr for Bytes32 {
	type Err = FactomError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.len() != 64 {
			return Err(FactomError::InvalidHex(format!(
				"expected 64 hex characters, got {}",
				s.len()
			)));
		}
		let mut out = [0u8; 32];
		hex::decode_to_slice(s, &mut out)
			.map_err(|e| FactomError::InvalidHex(format!("{}: {}", s, e)))?;
		Ok(Bytes32(out))
	}
}

impl From<[u8; 32]> for Bytes32 {
	fn from(value: [u8; 32]) -> Self {
		Bytes32(value)
	}
}

impl Serialize for Bytes32 {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_hex())
	}
}

impl<'de> Deserialize<'de> for Bytes32 {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

/// Derive a chain id from the ext ids of the chain's first entry.
///
/// `sha256(sha256(ext_id[0]) || sha256(ext_id[1]) || ...)`
pub fn chain_id_from_ext_ids<T: AsRef<[u8]>>(ext_ids: &[T]) -> Bytes32 {
	let mut outer = Sha256::new();
	for ext_id in ext_ids {
		outer.update(Sha256::digest(ext_id.as_ref()));
	}
	Bytes32(outer.finalize().into())
}

/// Height report of a factomd node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heights {
	pub directory_block: u32,
	pub leader: u32,
	pub entry_block: u32,
	pub entry: u32,
}

/// Reference from a directory block to one chain's entry block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DBlockEntry {
	pub chain_id: Bytes32,
	pub key_mr: Bytes32,
}

/// Directory block: the per-height index of every entry block written at that height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DBlock {
	pub height: u32,
	pub key_mr: Option<Bytes32>,
	pub entries: Vec<DBlockEntry>,
}

impl DBlock {
	/// The entry block reference for `chain_id`, if the chain was written to at this height.
	pub fn eblock(&self, chain_id: &Bytes32) -> Option<&DBlockEntry> {
		self.entries.iter().find(|e| &e.chain_id == chain_id)
	}
}

/// Entry block: ordered entry references of one chain at one height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EBlock {
	pub chain_id: Bytes32,
	pub key_mr: Bytes32,
	pub height: u32,
	pub entry_hashes: Vec<Bytes32>,
}

/// A fully resolved entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
	pub hash: Bytes32,
	pub chain_id: Bytes32,
	pub ext_ids: Vec<Vec<u8>>,
	pub content: Vec<u8>,
}

impl Entry {
	/// Binary form the entry hash is computed over.
	fn marshal(&self) -> Result<Vec<u8>, FactomError> {
		let ext_ids_size: usize = self.ext_ids.iter().map(|e| 2 + e.len()).sum();
		let ext_ids_size = u16::try_from(ext_ids_size).map_err(|_| {
			FactomError::MalformedEntry(format!("ext ids section too large: {} bytes", ext_ids_size))
		})?;

		let mut data = Vec::with_capacity(35 + ext_ids_size as usize + self.content.len());
		data.push(0u8);
		data.extend_from_slice(self.chain_id.as_bytes());
		data.extend_from_slice(&ext_ids_size.to_be_bytes());
		for ext_id in &self.ext_ids {
			// Each ext id fits since the section total does.
			data.extend_from_slice(&(ext_id.len() as u16).to_be_bytes());
			data.extend_from_slice(ext_id);
		}
		data.extend_from_slice(&self.content);
		Ok(data)
	}

	/// Compute the entry hash: `sha256(sha512(data) || data)`.
	pub fn compute_hash(&self) -> Result<Bytes32, FactomError> {
		let data = self.marshal()?;
		let mut hasher = Sha256::new();
		hasher.update(Sha512::digest(&data));
		hasher.update(&data);
		Ok(Bytes32(hasher.finalize().into()))
	}

	/// Check the content against `self.hash`.
	pub fn verify(&self) -> Result<(), FactomError> {
		let computed = self.compute_hash()?;
		if computed != self.hash {
			return Err(FactomError::HashMismatch {
				expected: self.hash,
				computed,
			});
		}
		Ok(())
	}
}

/// Response of the `heights` method.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireHeights {
	#[serde(rename = "directoryblockheight")]
	pub directory_block_height: u32,
	#[serde(rename = "leaderheight", default)]
	pub leader_height: u32,
	#[serde(rename = "entryblockheight", default)]
	pub entry_block_height: u32,
	#[serde(rename = "entryheight", default)]
	pub entry_height: u32,
}

impl From<WireHeights> for Heights {
	fn from(w: WireHeights) -> Self {
		Heights {
			directory_block: w.directory_block_height,
			leader: w.leader_height,
			entry_block: w.entry_block_height,
			entry: w.entry_height,
		}
	}
}

/// Response of the `dblock-by-height` method.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireDBlockResponse {
	pub dblock: WireDBlock,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireDBlock {
	pub header: WireDBlockHeader,
	#[serde(rename = "dbentries", default)]
	pub db_entries: Vec<WireDBlockEntry>,
	#[serde(rename = "keymr", default)]
	pub key_mr: Option<Bytes32>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireDBlockHeader {
	#[serde(rename = "dbheight")]
	pub db_height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireDBlockEntry {
	#[serde(rename = "chainid")]
	pub chain_id: Bytes32,
	#[serde(rename = "keymr")]
	pub key_mr: Bytes32,
}

impl From<WireDBlock> for DBlock {
	fn from(w: WireDBlock) -> Self {
		DBlock {
			height: w.header.db_height,
			key_mr: w.key_mr,
			entries: w
				.db_entries
				.into_iter()
				.map(|e| DBlockEntry {
					chain_id: e.chain_id,
					key_mr: e.key_mr,
				})
				.collect(),
		}
	}
}

/// Response of the `entry-block` method.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireEBlock {
	pub header: WireEBlockHeader,
	#[serde(rename = "entrylist", default)]
	pub entry_list: Vec<WireEBlockEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireEBlockHeader {
	#[serde(rename = "chainid")]
	pub chain_id: Bytes32,
	#[serde(rename = "dbheight")]
	pub db_height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireEBlockEntry {
	#[serde(rename = "entryhash")]
	pub entry_hash: Bytes32,
}

impl WireEBlock {
	pub(crate) fn into_eblock(self, key_mr: Bytes32) -> EBlock {
		EBlock {
			chain_id: self.header.chain_id,
			key_mr,
			height: self.header.db_height,
			entry_hashes: self.entry_list.into_iter().map(|e| e.entry_hash).collect(),
		}
	}
}

/// Response of the `entry` method. Content and ext ids are hex encoded.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireEntry {
	#[serde(rename = "chainid")]
	pub chain_id: Bytes32,
	#[serde(default)]
	pub content: String,
	#[serde(rename = "extids", default)]
	pub ext_ids: Vec<String>,
}

impl WireEntry {
	pub(crate) fn into_entry(self, hash: Bytes32) -> Result<Entry, FactomError> {
		let content = hex::decode(&self.content)
			.map_err(|e| FactomError::InvalidHex(format!("entry content: {}", e)))?;
		let ext_ids = self
			.ext_ids
			.iter()
			.map(|x| hex::decode(x).map_err(|e| FactomError::InvalidHex(format!("entry ext id: {}", e))))
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Entry {
			hash,
			chain_id: self.chain_id,
			ext_ids,
			content,
		})
	}
}

/// Error object of a JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RpcErrorObject {
	pub code: i64,
	pub message: String,
}

/// Error types for factomd requests and payload validation
#[derive(Debug, thiserror::Error)]
pub enum FactomError {
	#[error("HTTP error: {0}")]
	HttpError(#[from] reqwest::Error),

	#[error("JSON parse error: {0}")]
	JsonError(#[from] serde_json::Error),

	#[error("RPC error {code}: {message}")]
	RpcError { code: i64, message: String },

	#[error("No data returned")]
	NoData,

	#[error("Invalid hex: {0}")]
	InvalidHex(String),

	#[error("Malformed entry: {0}")]
	MalformedEntry(String),

	#[error("Entry hash mismatch: expected {expected}, computed {computed}")]
	HashMismatch { expected: Bytes32, computed: Bytes32 },
}
