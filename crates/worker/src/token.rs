use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic id source shared by everything that hands out request or wrapper ids.
///
/// Ids start at 1 and are never reused for the lifetime of the clock, so a
/// stale completion notice can always be told apart from a fresh one.
#[derive(Debug, Default, Clone)]
pub struct IdClock {
	next: Arc<AtomicU64>,
}

impl IdClock {
	/// Creates a new clock whose first id is 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the next id.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}

	/// Returns the most recently issued id, or 0 if none was issued.
	pub fn last(&self) -> u64 {
		self.next.load(Ordering::Acquire)
	}
}
