//! Single-page cache per merge source.

use crate::MergeSource;

/// Most recently fetched contiguous page of one source.
///
/// A miss replaces the whole page with the aligned page holding the
/// requested index.
#[derive(Debug, Clone)]
pub(crate) struct PageCache<T> {
	page_size: usize,
	start: usize,
	items: Vec<T>,
	fetches: usize,
}

impl<T> PageCache<T> {
	pub fn new(page_size: usize) -> Self {
		Self {
			page_size,
			start: 0,
			items: Vec::new(),
			fetches: 0,
		}
	}

	/// Makes `index` resident unless it lies past `count`.
	pub fn ensure<S>(&mut self, source: &S, index: usize, count: usize)
	where
		S: MergeSource<Item = T> + ?Sized,
	{
		if index >= count || self.peek(index).is_some() {
			return;
		}
		let start = index - index % self.page_size;
		let len = self.page_size.min(count - start);
		self.items = source.items(start, len);
		self.start = start;
		self.fetches += 1;
		tracing::trace!(source = source.id(), start, len, got = self.items.len(), "merge.page_fetch");
	}

	pub fn peek(&self, index: usize) -> Option<&T> {
		self.items.get(index.checked_sub(self.start)?)
	}

	pub fn fetches(&self) -> usize {
		self.fetches
	}
}
