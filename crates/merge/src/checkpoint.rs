//! Merge checkpoint index.

use std::collections::BTreeMap;

use crate::MergeError;

/// Per-source cursor tuples saved every `page_size` merged positions.
///
/// The cursors stored at position `p` sum to `p`: they count how many
/// items each live source contributed to the first `p` merged items.
#[derive(Debug, Clone)]
pub struct CheckpointIndex {
	page_size: usize,
	marks: BTreeMap<usize, Vec<usize>>,
}

impl CheckpointIndex {
	pub fn new(page_size: usize) -> Result<Self, MergeError> {
		if page_size == 0 {
			return Err(MergeError::ZeroPageSize);
		}
		Ok(Self {
			page_size,
			marks: BTreeMap::new(),
		})
	}

	pub fn page_size(&self) -> usize {
		self.page_size
	}

	/// Greatest checkpoint at or before `pos`.
	pub fn floor(&self, pos: usize) -> Option<(usize, &[usize])> {
		self.marks.range(..=pos).next_back().map(|(&at, cursors)| (at, cursors.as_slice()))
	}

	/// Saves `cursors` if `pos` is a nonzero page milestone not yet recorded.
	pub fn record(&mut self, pos: usize, cursors: &[usize]) {
		if pos == 0 || pos % self.page_size != 0 {
			return;
		}
		self.marks.entry(pos).or_insert_with(|| cursors.to_vec());
	}

	pub fn get(&self, pos: usize) -> Option<&[usize]> {
		self.marks.get(&pos).map(Vec::as_slice)
	}

	/// Recorded milestones in increasing order.
	pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
		self.marks.keys().copied()
	}

	pub fn len(&self) -> usize {
		self.marks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.marks.is_empty()
	}

	pub fn clear(&mut self) {
		self.marks.clear();
	}
}
