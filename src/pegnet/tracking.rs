use crate::factom::{Bytes32, chain_id_from_ext_ids};
use std::collections::BTreeMap;

/// Name of the oracle price record chain.
pub const OPR_CHAIN: &str = "opr";
/// Name of the pegnet transaction chain.
pub const TRANSACTION_CHAIN: &str = "transactions";

/// Ext ids of the first entry of each well known chain.
const OPR_CHAIN_EXT_IDS: [&str; 3] = ["PegNet", "MainNet", "OPRs"];
const TRANSACTION_CHAIN_EXT_IDS: [&str; 2] = ["pegnet", "transactions"];

/// The chains whose entry blocks are pulled out of every directory block.
///
/// Iteration order is by name so every pass walks the chains the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTracking {
	chains: BTreeMap<String, Bytes32>,
}

impl ChainTracking {
	pub fn new(chains: BTreeMap<String, Bytes32>) -> Self {
		Self { chains }
	}

	/// The chain id tracked under `name`.
	pub fn get(&self, name: &str) -> Option<&Bytes32> {
		self.chains.get(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Bytes32)> {
		self.chains.iter().map(|(name, id)| (name.as_str(), id))
	}

	/// Replace or add the chain tracked under `name`.
	pub fn with_chain(mut self, name: impl Into<String>, chain_id: Bytes32) -> Self {
		self.chains.insert(name.into(), chain_id);
		self
	}
}

impl Default for ChainTracking {
	fn default() -> Self {
		let mut chains = BTreeMap::new();
		chains.insert(OPR_CHAIN.to_string(), chain_id_from_ext_ids(&OPR_CHAIN_EXT_IDS));
		chains.insert(
			TRANSACTION_CHAIN.to_string(),
			chain_id_from_ext_ids(&TRANSACTION_CHAIN_EXT_IDS),
		);
		Self { chains }
	}
}
