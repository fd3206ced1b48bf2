//! In-memory fakes for synchronizer tests.

use crate::factom::{
	Bytes32, DBlock, DBlockEntry, EBlock, Entry, FactomError, Heights, LedgerSource,
	chain_id_from_ext_ids,
};
use crate::node::cursor::{CursorRepository, SyncCursor};
use crate::node::shutdown::ShutdownTrigger;
use crate::pegnet::{GradedBlock, PegnetStore, StoreError};
use std::collections::HashMap;
use std::sync::Mutex;

/// A ledger request, recorded in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
	Heights,
	DBlock(u32),
	EBlock(Bytes32),
	Entry(Bytes32),
}

/// An oracle price record entry the difficulty grader accepts.
pub fn opr_entry(chain_id: Bytes32, height: u32, seed: u8, difficulty: u64) -> Entry {
	let mut nonce = vec![seed];
	nonce.extend_from_slice(&height.to_be_bytes());
	let mut entry = Entry {
		hash: Bytes32::default(),
		chain_id,
		ext_ids: vec![nonce, difficulty.to_be_bytes().to_vec(), vec![2]],
		content: format!("{{\"height\":{},\"seed\":{}}}", height, seed).into_bytes(),
	};
	entry.hash = entry.compute_hash().expect("small entry");
	entry
}

#[derive(Default)]
struct LedgerState {
	remote_height: u32,
	dblocks: HashMap<u32, DBlock>,
	eblocks: HashMap<Bytes32, EBlock>,
	entries: HashMap<Bytes32, Entry>,
	/// Each listed call fails once.
	failures: Vec<Call>,
	calls: Vec<Call>,
	cancel_after_heights: Option<(usize, ShutdownTrigger)>,
}

#[derive(Default)]
pub struct FakeLedger {
	state: Mutex<LedgerState>,
}

impl FakeLedger {
	pub fn set_remote_height(&self, height: u32) {
		self.state.lock().unwrap().remote_height = height;
	}

	/// Add the directory block at `height` with one entry block per listed chain.
	pub fn add_height(&self, height: u32, chains: Vec<(Bytes32, Vec<Entry>)>) {
		let mut state = self.state.lock().unwrap();
		let mut dblock = DBlock {
			height,
			key_mr: None,
			entries: Vec::new(),
		};

		for (chain_id, entries) in chains {
			let height_bytes = height.to_be_bytes();
			let key_mr = chain_id_from_ext_ids(&[&height_bytes[..], &chain_id.as_bytes()[..]]);
			let eblock = EBlock {
				chain_id,
				key_mr,
				height,
				entry_hashes: entries.iter().map(|e| e.hash).collect(),
			};
			for entry in entries {
				state.entries.insert(entry.hash, entry);
			}
			state.eblocks.insert(key_mr, eblock);
			dblock.entries.push(DBlockEntry { chain_id, key_mr });
		}

		state.dblocks.insert(height, dblock);
	}

	/// Key of the entry block `chain_id` has in the directory block at `height`.
	pub fn eblock_key_mr(&self, height: u32, chain_id: Bytes32) -> Bytes32 {
		let state = self.state.lock().unwrap();
		state.dblocks[&height]
			.eblock(&chain_id)
			.expect("chain present")
			.key_mr
	}

	pub fn entry_hashes_at(&self, height: u32, chain_id: Bytes32) -> Vec<Bytes32> {
		let key_mr = self.eblock_key_mr(height, chain_id);
		self.state.lock().unwrap().eblocks[&key_mr].entry_hashes.clone()
	}

	/// Change the entry block served for `key_mr`.
	pub fn edit_eblock(&self, key_mr: Bytes32, edit: impl FnOnce(&mut EBlock)) {
		let mut state = self.state.lock().unwrap();
		edit(state.eblocks.get_mut(&key_mr).expect("eblock present"));
	}

	pub fn fail_once(&self, call: Call) {
		self.state.lock().unwrap().failures.push(call);
	}

	/// Cancel `trigger` when the `n`th height query is made.
	pub fn cancel_after_heights(&self, n: usize, trigger: ShutdownTrigger) {
		self.state.lock().unwrap().cancel_after_heights = Some((n, trigger));
	}

	pub fn calls(&self) -> Vec<Call> {
		self.state.lock().unwrap().calls.clone()
	}

	pub fn heights_requests(&self) -> usize {
		self.calls().iter().filter(|c| **c == Call::Heights).count()
	}

	pub fn dblock_requests(&self) -> Vec<u32> {
		self.calls()
			.into_iter()
			.filter_map(|c| match c {
				Call::DBlock(height) => Some(height),
				_ => None,
			})
			.collect()
	}

	pub fn eblock_requests(&self) -> Vec<Bytes32> {
		self.calls()
			.into_iter()
			.filter_map(|c| match c {
				Call::EBlock(key_mr) => Some(key_mr),
				_ => None,
			})
			.collect()
	}

	fn record(state: &mut LedgerState, call: Call) -> Result<(), FactomError> {
		state.calls.push(call);
		if let Some(pos) = state.failures.iter().position(|c| *c == call) {
			state.failures.remove(pos);
			return Err(FactomError::RpcError {
				code: -32603,
				message: "injected failure".to_string(),
			});
		}
		Ok(())
	}

	fn not_found() -> FactomError {
		FactomError::RpcError {
			code: -32008,
			message: "Block not found".to_string(),
		}
	}
}

#[async_trait::async_trait]
impl LedgerSource for FakeLedger {
	async fn heights(&self) -> Result<Heights, FactomError> {
		let mut state = self.state.lock().unwrap();
		let result = Self::record(&mut state, Call::Heights);

		let asked = state.calls.iter().filter(|c| **c == Call::Heights).count();
		if let Some((n, trigger)) = &state.cancel_after_heights {
			if asked >= *n {
				trigger.cancel();
			}
		}

		result?;
		let remote = state.remote_height;
		Ok(Heights {
			directory_block: remote,
			leader: remote,
			entry_block: remote,
			entry: remote,
		})
	}

	async fn dblock_by_height(&self, height: u32) -> Result<DBlock, FactomError> {
		let mut state = self.state.lock().unwrap();
		Self::record(&mut state, Call::DBlock(height))?;
		state.dblocks.get(&height).cloned().ok_or_else(Self::not_found)
	}

	async fn entry_block(&self, key_mr: &Bytes32) -> Result<EBlock, FactomError> {
		let mut state = self.state.lock().unwrap();
		Self::record(&mut state, Call::EBlock(*key_mr))?;
		state.eblocks.get(key_mr).cloned().ok_or_else(Self::not_found)
	}

	async fn entry(&self, hash: &Bytes32) -> Result<Entry, FactomError> {
		let mut state = self.state.lock().unwrap();
		Self::record(&mut state, Call::Entry(*hash))?;
		state.entries.get(hash).cloned().ok_or_else(Self::not_found)
	}
}

#[derive(Default)]
struct StoreState {
	inserted: Vec<GradedBlock>,
	fail_next: usize,
	cancel_on: Option<(u32, ShutdownTrigger)>,
}

/// Store that keeps every inserted block, duplicates included.
#[derive(Default)]
pub struct RecordingStore {
	state: Mutex<StoreState>,
}

impl RecordingStore {
	pub fn fail_next_insert(&self) {
		self.state.lock().unwrap().fail_next += 1;
	}

	/// Cancel `trigger` from inside the insert of `height`.
	pub fn cancel_on_insert(&self, height: u32, trigger: ShutdownTrigger) {
		self.state.lock().unwrap().cancel_on = Some((height, trigger));
	}

	/// Heights of successful inserts, in insert order.
	pub fn heights(&self) -> Vec<u32> {
		self.state
			.lock()
			.unwrap()
			.inserted
			.iter()
			.map(|b| b.height)
			.collect()
	}

	pub fn distinct_heights(&self) -> Vec<u32> {
		let mut heights = self.heights();
		heights.sort_unstable();
		heights.dedup();
		heights
	}
}

#[async_trait::async_trait]
impl PegnetStore for RecordingStore {
	async fn insert_graded_block(&self, graded: &GradedBlock) -> Result<(), StoreError> {
		let mut state = self.state.lock().unwrap();
		if state.fail_next > 0 {
			state.fail_next -= 1;
			return Err(StoreError::IoError(std::io::Error::other("injected failure")));
		}
		if let Some((height, trigger)) = &state.cancel_on {
			if *height == graded.height {
				trigger.cancel();
			}
		}
		state.inserted.push(graded.clone());
		Ok(())
	}
}

#[derive(Default)]
struct CursorState {
	current: Option<SyncCursor>,
	saved: Vec<u32>,
	fail_next: usize,
}

#[derive(Default)]
pub struct MemoryCursorRepository {
	state: Mutex<CursorState>,
}

impl MemoryCursorRepository {
	pub fn fail_next_save(&self) {
		self.state.lock().unwrap().fail_next += 1;
	}

	/// Every successfully saved height, in order.
	pub fn saved(&self) -> Vec<u32> {
		self.state.lock().unwrap().saved.clone()
	}
}

#[async_trait::async_trait]
impl CursorRepository for MemoryCursorRepository {
	async fn load(&self) -> Result<Option<SyncCursor>, StoreError> {
		Ok(self.state.lock().unwrap().current)
	}

	async fn save(&self, cursor: &SyncCursor) -> Result<(), StoreError> {
		let mut state = self.state.lock().unwrap();
		if state.fail_next > 0 {
			state.fail_next -= 1;
			return Err(StoreError::IoError(std::io::Error::other("injected failure")));
		}
		state.current = Some(*cursor);
		state.saved.push(cursor.synced);
		Ok(())
	}
}
