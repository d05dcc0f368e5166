//! Backing collections merged by a [`crate::MergeView`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// One sorted, paged collection contributing to a merge.
///
/// Items must already be sorted by the ordering the view merges with.
pub trait MergeSource {
	type Item;

	/// Stable identity, used to tell sources apart across membership changes.
	fn id(&self) -> u64;

	/// Current number of items.
	fn count(&self) -> usize;

	/// Up to `count` items starting at `start`.
	fn items(&self, start: usize, count: usize) -> Vec<Self::Item>;

	/// Bumped whenever the items change. Sources that never change keep 0.
	fn version(&self) -> u64 {
		0
	}
}

/// Shared handle to a type-erased merge source.
pub type SharedSource<T> = Arc<dyn MergeSource<Item = T> + Send + Sync>;

/// Snapshot of the source facts a merge depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceStamp {
	pub id: u64,
	pub count: usize,
	pub version: u64,
}

impl SourceStamp {
	pub fn of<S: MergeSource + ?Sized>(source: &S) -> Self {
		Self {
			id: source.id(),
			count: source.count(),
			version: source.version(),
		}
	}
}

/// In-memory sorted source whose contents can be replaced in place.
#[derive(Debug)]
pub struct VecSource<T> {
	id: u64,
	items: RwLock<Vec<T>>,
	version: AtomicU64,
}

impl<T> VecSource<T> {
	pub fn new(id: u64, items: Vec<T>) -> Self {
		Self {
			id,
			items: RwLock::new(items),
			version: AtomicU64::new(0),
		}
	}

	/// Replaces the items and bumps the version.
	pub fn replace(&self, items: Vec<T>) {
		*self.items.write() = items;
		self.version.fetch_add(1, Ordering::AcqRel);
	}

	pub fn shared(self) -> Arc<Self> {
		Arc::new(self)
	}
}

impl<T: Clone> MergeSource for VecSource<T> {
	type Item = T;

	fn id(&self) -> u64 {
		self.id
	}

	fn count(&self) -> usize {
		self.items.read().len()
	}

	fn items(&self, start: usize, count: usize) -> Vec<T> {
		let items = self.items.read();
		let start = start.min(items.len());
		let end = start.saturating_add(count).min(items.len());
		items[start..end].to_vec()
	}

	fn version(&self) -> u64 {
		self.version.load(Ordering::Acquire)
	}
}
