//! Transaction identifiers.
//!
//! A TxID names a transaction by its position inside an entry and the hash of the entry carrying
//! it: `[TxIndex]-[EntryHash]`, e.g.
//! `001-c99dedea0e4e0c40118fe7e4d515b23cc0489269c8cef187b4f15a4ccbd880be`.

use crate::factom::Bytes32;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Minimum number of digits the index is padded to by [`TxId::encode`].
pub const DEFAULT_PAD: usize = 3;

/// Largest index a TxID can carry. Indexes are signed 32 bit integers on the wire.
pub const MAX_INDEX: u32 = i32::MAX as u32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxIdError {
	#[error("txid does not match txid format, format: [TxIndex]-[EntryHash]")]
	Structure,
	#[error("index must be a valid integer")]
	Index,
	#[error("entryhash must be 32 bytes (64 hex characters)")]
	HashLength,
	#[error("entryhash must be a valid hex string")]
	HashHex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxId {
	pub index: u32,
	pub entry_hash: Bytes32,
}

impl TxId {
	pub fn new(index: u32, entry_hash: Bytes32) -> Self {
		Self { index, entry_hash }
	}

	/// Split a TxID string into its parts.
	pub fn decode(txid: &str) -> Result<Self, TxIdError> {
		let (index, hash) = match txid.split_once('-') {
			Some((index, hash)) if !hash.contains('-') => (index, hash),
			_ => return Err(TxIdError::Structure),
		};

		let index = index
			.parse::<u32>()
			.ok()
			.filter(|index| *index <= MAX_INDEX)
			.ok_or(TxIdError::Index)?;

		if hash.len() != 64 {
			return Err(TxIdError::HashLength);
		}

		let mut entry_hash = [0u8; 32];
		hex::decode_to_slice(hash, &mut entry_hash).map_err(|_| TxIdError::HashHex)?;

		Ok(Self {
			index,
			entry_hash: Bytes32(entry_hash),
		})
	}

	/// Canonical form with the index padded to [`DEFAULT_PAD`] digits.
	pub fn encode(&self) -> String {
		self.encode_with_pad(DEFAULT_PAD)
	}

	/// Canonical form with the index left padded with zeros to at least `pad` digits.
	///
	/// pad = 2 -> 01-entryhash
	/// pad = 3 -> 001-entryhash
	pub fn encode_with_pad(&self, pad: usize) -> String {
		format!("{:0pad$}-{}", self.index, self.entry_hash.to_hex(), pad = pad)
	}
}

impl fmt::Display for TxId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.encode())
	}
}

impl FromStr for TxId {
	type Err = TxIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::decode(s)
	}
}
