//! Range arithmetic for the sliding window.
//!
//! All ranges are half-open positions over the logical sequence, with
//! `active ⊆ cached ⊆ [0, size)` whenever the window is consistent.

use std::ops::Range;

/// The three ranges a window tracks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WindowRanges {
	/// Positions visible right now.
	pub active: Range<usize>,
	/// Positions backed by a wrapper; sized to the ring capacity.
	pub cached: Range<usize>,
	/// Logical size of the sequence.
	pub size: usize,
}

impl WindowRanges {
	/// Cached range of `capacity` positions centred on `active`, clamped to `[0, size)`.
	pub fn centered(active: &Range<usize>, capacity: usize, size: usize) -> Range<usize> {
		let len = capacity.min(size);
		let mid = active.start + (active.end - active.start) / 2;
		let start = mid.saturating_sub(capacity / 2).min(size - len);
		start..start + len
	}

	/// Whether `cached` must move to `target` for the current active range.
	///
	/// Recentering is skipped while `cached` still covers `active`, has the
	/// right length and has drifted less than `threshold` from `target`.
	pub fn should_recenter(&self, target: &Range<usize>, threshold: usize) -> bool {
		if self.cached == *target {
			return false;
		}
		if !covers(&self.cached, &self.active) || self.cached.len() != target.len() {
			return true;
		}
		self.cached.start.abs_diff(target.start) >= threshold
	}

	/// Clamps the active range after the sequence shrank to `size`.
	pub fn clamp_to(&mut self, size: usize) {
		self.size = size;
		let end = self.active.end.min(size);
		let start = self.active.start.min(end);
		self.active = start..end;
	}
}

/// Whether `outer` contains every position of `inner`.
pub fn covers(outer: &Range<usize>, inner: &Range<usize>) -> bool {
	outer.start <= inner.start && inner.end <= outer.end
}

/// Positions of `old` not in `new`, as up to two disjoint ranges.
pub fn leaving(old: &Range<usize>, new: &Range<usize>) -> [Range<usize>; 2] {
	if disjoint(old, new) {
		return [old.clone(), 0..0];
	}
	[old.start..new.start.min(old.end), new.end.max(old.start)..old.end]
}

/// Positions of `new` not in `old`, as up to two disjoint ranges.
pub fn entering(old: &Range<usize>, new: &Range<usize>) -> [Range<usize>; 2] {
	leaving(new, old)
}

/// Whether two ranges share no position.
pub fn disjoint(a: &Range<usize>, b: &Range<usize>) -> bool {
	a.is_empty() || b.is_empty() || a.start >= b.end || b.start >= a.end
}

/// Non-active cached positions in prefetch order.
///
/// Walks outward from both edges of `active`, alternating sides: the first
/// position after the active range, then the last one before it, then the
/// second after, and so on until both sides reach the edges of `cached`.
pub fn fill_order(active: &Range<usize>, cached: &Range<usize>) -> Vec<usize> {
	let after = cached.end.saturating_sub(active.end);
	let before = active.start.saturating_sub(cached.start);
	let mut order = Vec::with_capacity(after + before);
	for step in 0..after.max(before) {
		if step < after {
			order.push(active.end + step);
		}
		if step < before {
			order.push(active.start - 1 - step);
		}
	}
	order
}
