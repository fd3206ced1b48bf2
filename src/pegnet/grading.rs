//! Grading of oracle price records.
//!
//! The synchronizer hands one height's OPR entries to a [`Grader`] and stores whatever it returns.
//! Graders are pure: the same entries always produce the same block.

use crate::factom::{Bytes32, Entry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GradeError {
	#[error("duplicate entry {0} in oracle price record set")]
	DuplicateEntry(Bytes32),
}

/// One ranked oracle price record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradedRecord {
	pub entry_hash: Bytes32,
	pub nonce: Vec<u8>,
	pub self_reported_difficulty: u64,
	/// Zero based rank within the block.
	pub position: u32,
	pub content: Vec<u8>,
}

/// Result of grading one height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradedBlock {
	pub height: u32,
	/// All qualifying records, best first.
	pub records: Vec<GradedRecord>,
	/// Entry hashes of the winning records, best first.
	pub winners: Vec<Bytes32>,
}

/// Pure function from a height's OPR entries to an optional graded block.
pub trait Grader: Send + Sync {
	/// Grade `entries`. `Ok(None)` means nothing qualified at this height.
	fn grade(&self, height: u32, entries: &[Entry]) -> Result<Option<GradedBlock>, GradeError>;
}

/// Ranks records by self reported difficulty.
///
/// An entry qualifies when it carries exactly three ext ids: nonce, an 8 byte big endian
/// difficulty and a one byte version equal to `version`.
#[derive(Debug, Clone)]
pub struct DifficultyGrader {
	winners: usize,
	version: u8,
}

impl DifficultyGrader {
	pub fn new(winners: usize, version: u8) -> Self {
		Self { winners, version }
	}

	fn parse(&self, entry: &Entry) -> Option<(Vec<u8>, u64)> {
		let [nonce, difficulty, version] = entry.ext_ids.as_slice() else {
			return None;
		};
		if version.as_slice() != [self.version].as_slice() {
			return None;
		}
		let difficulty: [u8; 8] = difficulty.as_slice().try_into().ok()?;
		Some((nonce.clone(), u64::from_be_bytes(difficulty)))
	}
}

impl Grader for DifficultyGrader {
	fn grade(&self, height: u32, entries: &[Entry]) -> Result<Option<GradedBlock>, GradeError> {
		let mut seen = HashSet::with_capacity(entries.len());
		let mut records = Vec::new();

		for entry in entries {
			if !seen.insert(entry.hash) {
				return Err(GradeError::DuplicateEntry(entry.hash));
			}
			match self.parse(entry) {
				Some((nonce, difficulty)) => records.push(GradedRecord {
					entry_hash: entry.hash,
					nonce,
					self_reported_difficulty: difficulty,
					position: 0,
					content: entry.content.clone(),
				}),
				None => debug!(height, entry = %entry.hash, "skipping unqualified oracle price record"),
			}
		}

		if records.is_empty() {
			return Ok(None);
		}

		records.sort_by(|a, b| {
			b.self_reported_difficulty
				.cmp(&a.self_reported_difficulty)
				.then_with(|| a.entry_hash.cmp(&b.entry_hash))
		});
		for (position, record) in records.iter_mut().enumerate() {
			record.position = position as u32;
		}

		let winners = records
			.iter()
			.take(self.winners)
			.map(|r| r.entry_hash)
			.collect();

		Ok(Some(GradedBlock {
			height,
			records,
			winners,
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn opr(seed: u8, difficulty: u64, version: u8) -> Entry {
		Entry {
			hash: Bytes32([seed; 32]),
			chain_id: Bytes32([0xaa; 32]),
			ext_ids: vec![vec![seed], difficulty.to_be_bytes().to_vec(), vec![version]],
			content: vec![seed],
		}
	}

	#[test]
	fn empty_set_grades_to_nothing() {
		let grader = DifficultyGrader::new(2, 2);
		assert_eq!(grader.grade(10, &[]), Ok(None));
	}

	#[test]
	fn unqualified_entries_grade_to_nothing() {
		let grader = DifficultyGrader::new(2, 2);
		let mut short = opr(1, 5, 2);
		short.ext_ids.pop();
		let wrong_version = opr(2, 5, 1);
		assert_eq!(grader.grade(10, &[short, wrong_version]), Ok(None));
	}

	#[test]
	fn ranks_by_difficulty_then_hash() {
		let grader = DifficultyGrader::new(2, 2);
		let block = grader
			.grade(10, &[opr(3, 50, 2), opr(1, 90, 2), opr(2, 50, 2)])
			.expect("grades")
			.expect("has records");

		assert_eq!(block.height, 10);
		let order: Vec<_> = block.records.iter().map(|r| r.entry_hash.0[0]).collect();
		assert_eq!(order, vec![1, 2, 3]);
		assert_eq!(block.records[2].position, 2);
		assert_eq!(block.winners, vec![Bytes32([1; 32]), Bytes32([2; 32])]);
	}

	#[test]
	fn duplicate_entries_fail() {
		let grader = DifficultyGrader::new(2, 2);
		assert_eq!(
			grader.grade(10, &[opr(1, 5, 2), opr(1, 5, 2)]),
			Err(GradeError::DuplicateEntry(Bytes32([1; 32])))
		);
	}
}
