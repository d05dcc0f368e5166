//! Merge view exposed as a window backing collection.

use std::cmp::Ordering;

use mosaic_window::{ChangeNotifier, ItemSource};

use crate::{MergeView, SharedSource};

/// Feeds a [`MergeView`] to a [`mosaic_window::SlidingWindow`].
///
/// Upstream changes are picked up by [`Self::refresh`], which reports them
/// to the window as a size change or an in-place content change.
pub struct WindowSource<T, C> {
	view: MergeView<T, C>,
	listener: Option<ChangeNotifier>,
}

impl<T, C> WindowSource<T, C>
where
	T: Clone,
	C: Fn(&T, &T) -> Ordering,
{
	pub fn new(view: MergeView<T, C>) -> Self {
		Self { view, listener: None }
	}

	pub fn view(&self) -> &MergeView<T, C> {
		&self.view
	}

	pub fn into_view(self) -> MergeView<T, C> {
		self.view
	}

	/// Re-reads the sources and notifies the window if anything changed.
	pub fn refresh(&mut self) -> bool {
		let before = self.view.count();
		let changed = self.view.update_data();
		if changed {
			self.notify(before);
		}
		changed
	}

	/// Swaps the merged sources and notifies the window if anything changed.
	pub fn set_sources(&mut self, sources: Vec<SharedSource<T>>) -> bool {
		let before = self.view.count();
		let changed = self.view.set_sources(sources);
		if changed {
			self.notify(before);
		}
		changed
	}

	fn notify(&self, before: usize) {
		let Some(listener) = &self.listener else {
			return;
		};
		let count = self.view.count();
		if count == before {
			listener.content_changed();
		} else {
			listener.size_changed(count);
		}
	}
}

impl<T, C> ItemSource for WindowSource<T, C>
where
	T: Clone,
	C: Fn(&T, &T) -> Ordering,
{
	type Descriptor = T;

	fn count(&self) -> usize {
		self.view.count()
	}

	fn item_at(&mut self, index: usize) -> Option<T> {
		self.view.item_at(index)
	}

	fn set_change_listener(&mut self, listener: ChangeNotifier) {
		self.listener = Some(listener);
	}
}
