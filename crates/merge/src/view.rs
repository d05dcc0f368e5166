//! Random-access view over an n-way merge of sorted sources.
//!
//! The merge is never materialized. Each live source keeps one cached page,
//! and the per-source cursor tuple is saved every `page_size` merged
//! positions, so reaching any offset replays at most one page of merge
//! steps from the nearest checkpoint.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::checkpoint::CheckpointIndex;
use crate::page::PageCache;
use crate::{MergeConfig, MergeError, SharedSource, SourceStamp};

struct Lane<T> {
	source: SharedSource<T>,
	stamp: SourceStamp,
	page: PageCache<T>,
}

/// Order-preserving merged sequence over several [`crate::MergeSource`]s.
///
/// `compare` must be a total order consistent with how every source is
/// sorted. Equal items are emitted in source order, so the merged sequence
/// is deterministic across calls.
pub struct MergeView<T, C> {
	sources: Vec<SharedSource<T>>,
	lanes: Vec<Lane<T>>,
	compare: C,
	config: MergeConfig,
	checkpoints: CheckpointIndex,
	resume: Option<(usize, Vec<usize>)>,
	count: usize,
	data_version: u64,
}

impl<T, C> MergeView<T, C>
where
	T: Clone,
	C: Fn(&T, &T) -> Ordering,
{
	/// Builds a view over `sources` and takes the first data snapshot.
	pub fn new(sources: Vec<SharedSource<T>>, compare: C, config: MergeConfig) -> Result<Self, MergeError> {
		let mut view = Self {
			sources,
			lanes: Vec::new(),
			compare,
			checkpoints: CheckpointIndex::new(config.page_size)?,
			config,
			resume: None,
			count: 0,
			data_version: 0,
		};
		view.update_data();
		Ok(view)
	}

	/// Total items across live sources, as of the last [`Self::update_data`].
	pub fn count(&self) -> usize {
		self.count
	}

	pub fn config(&self) -> &MergeConfig {
		&self.config
	}

	/// Bumped every time [`Self::update_data`] observes a change.
	pub fn data_version(&self) -> u64 {
		self.data_version
	}

	/// Stamps of the live sources, in merge order.
	pub fn live_sources(&self) -> Vec<SourceStamp> {
		self.lanes.iter().map(|lane| lane.stamp).collect()
	}

	pub fn checkpoints(&self) -> &CheckpointIndex {
		&self.checkpoints
	}

	/// Cursor tuple saved at merged position `pos`, if any.
	pub fn checkpoint(&self, pos: usize) -> Option<&[usize]> {
		self.checkpoints.get(pos)
	}

	pub fn clear_checkpoints(&mut self) {
		self.checkpoints.clear();
		self.resume = None;
	}

	/// Page fetches issued to all live sources so far.
	pub fn page_fetches(&self) -> usize {
		self.lanes.iter().map(|lane| lane.page.fetches()).sum()
	}

	/// Replaces the candidate sources and refreshes the live set.
	pub fn set_sources(&mut self, sources: Vec<SharedSource<T>>) -> bool {
		self.sources = sources;
		self.update_data()
	}

	/// Recomputes the live sources from the candidates.
	///
	/// Empty sources are left out. Any change in membership, order, count or
	/// version discards every checkpoint. Sources are matched by identity as
	/// well as stamp. Pages of unchanged sources are kept.
	/// Returns whether anything changed.
	pub fn update_data(&mut self) -> bool {
		let live: Vec<_> = self
			.sources
			.iter()
			.map(|source| (Arc::clone(source), SourceStamp::of(&**source)))
			.filter(|(_, stamp)| stamp.count > 0)
			.collect();
		let unchanged = live.len() == self.lanes.len()
			&& live
				.iter()
				.zip(&self.lanes)
				.all(|((source, stamp), lane)| Arc::ptr_eq(source, &lane.source) && *stamp == lane.stamp);
		if unchanged {
			return false;
		}

		let page_size = self.config.page_size;
		let mut old = std::mem::take(&mut self.lanes);
		self.lanes = live
			.into_iter()
			.map(|(source, stamp)| {
				let page = match old.iter().position(|lane| Arc::ptr_eq(&lane.source, &source) && lane.stamp == stamp) {
					Some(i) => old.swap_remove(i).page,
					None => PageCache::new(page_size),
				};
				Lane { source, stamp, page }
			})
			.collect();

		self.count = self.lanes.iter().map(|lane| lane.stamp.count).sum();
		self.clear_checkpoints();
		self.data_version += 1;
		tracing::debug!(sources = self.lanes.len(), count = self.count, version = self.data_version, "merge.update_data");
		true
	}

	/// Up to `count` merged items starting at merged position `start`.
	pub fn get_range(&mut self, start: usize, count: usize) -> Vec<T> {
		let end = start.saturating_add(count).min(self.count);
		let mut out = Vec::with_capacity(end.saturating_sub(start));
		if start < end {
			self.walk(start, end, Some(&mut out));
		}
		out
	}

	pub fn item_at(&mut self, index: usize) -> Option<T> {
		self.get_range(index, 1).pop()
	}

	/// Per-source cursors after the first `pos` merged items.
	pub fn cursors_at(&mut self, pos: usize) -> Vec<usize> {
		self.walk(pos, pos.min(self.count), None)
	}

	fn seek(&self, start: usize) -> (usize, Vec<usize>) {
		let mut from = match self.checkpoints.floor(start) {
			Some((pos, cursors)) => (pos, cursors.to_vec()),
			None => (0, vec![0; self.lanes.len()]),
		};
		if let Some((pos, cursors)) = &self.resume
			&& *pos <= start
			&& *pos > from.0
		{
			from = (*pos, cursors.clone());
		}
		from
	}

	fn walk(&mut self, start: usize, end: usize, mut out: Option<&mut Vec<T>>) -> Vec<usize> {
		let (mut pos, mut cursors) = self.seek(start);
		while pos < end {
			let Some(lane) = self.pick(&cursors) else {
				tracing::debug!(pos, end, "merge.sources_exhausted");
				break;
			};
			if pos >= start
				&& let Some(out) = out.as_deref_mut()
				&& let Some(item) = self.lanes[lane].page.peek(cursors[lane])
			{
				out.push(item.clone());
			}
			cursors[lane] += 1;
			pos += 1;
			self.checkpoints.record(pos, &cursors);
		}
		self.resume = Some((pos, cursors.clone()));
		cursors
	}

	/// Lane holding the smallest head item. Ties go to the lower lane.
	fn pick(&mut self, cursors: &[usize]) -> Option<usize> {
		for (lane, &cursor) in self.lanes.iter_mut().zip(cursors) {
			lane.page.ensure(&*lane.source, cursor, lane.stamp.count);
		}
		let mut best: Option<(usize, &T)> = None;
		for (i, lane) in self.lanes.iter().enumerate() {
			let Some(item) = lane.page.peek(cursors[i]) else {
				continue;
			};
			match best {
				Some((_, current)) if (self.compare)(item, current) != Ordering::Less => {}
				_ => best = Some((i, item)),
			}
		}
		best.map(|(i, _)| i)
	}
}

#[cfg(test)]
mod tests;
