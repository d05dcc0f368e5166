//! Backing collections a window scrolls over.

use tokio::sync::mpsc;

/// Change notice emitted by a backing collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceChange {
	/// The number of items changed.
	SizeChanged(usize),
	/// Items changed in place; descriptors must be re-read.
	ContentChanged,
	/// Nothing structural changed but cached pixels are stale.
	Dirty,
}

/// Sending half handed to a backing collection so it can report changes.
///
/// Notices are queued and applied by the window's owner in
/// [`crate::SlidingWindow::pump`], so collections may notify from any thread.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
	tx: mpsc::UnboundedSender<SourceChange>,
}

impl ChangeNotifier {
	pub(crate) fn new(tx: mpsc::UnboundedSender<SourceChange>) -> Self {
		Self { tx }
	}

	/// Creates a detached notifier and the receiver its notices arrive on.
	pub fn channel() -> (Self, mpsc::UnboundedReceiver<SourceChange>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, rx)
	}

	pub fn size_changed(&self, size: usize) {
		self.notify(SourceChange::SizeChanged(size));
	}

	pub fn content_changed(&self) {
		self.notify(SourceChange::ContentChanged);
	}

	pub fn dirty(&self) {
		self.notify(SourceChange::Dirty);
	}

	fn notify(&self, change: SourceChange) {
		if self.tx.send(change).is_err() {
			tracing::trace!(?change, "source.notify_dropped");
		}
	}
}

/// Ordered, possibly changing collection of items addressed by position.
pub trait ItemSource {
	/// Identifies what the producer should decode for one position.
	type Descriptor;

	/// Current number of items.
	fn count(&self) -> usize;

	/// Descriptor at `index`, or `None` if the position is empty.
	fn item_at(&mut self, index: usize) -> Option<Self::Descriptor>;

	/// Cover descriptors for a set-of-sets collection. Defaults to the item itself.
	fn cover_items_at(&mut self, index: usize) -> Vec<Self::Descriptor> {
		self.item_at(index).into_iter().collect()
	}

	/// Installs the notifier the collection reports changes through.
	///
	/// Collections that never change can ignore it.
	fn set_change_listener(&mut self, listener: ChangeNotifier) {
		let _ = listener;
	}
}

/// In-memory collection, mostly useful for tests and static galleries.
#[derive(Debug, Clone, Default)]
pub struct ListSource<D> {
	items: Vec<D>,
	covers: Vec<Vec<D>>,
	listener: Option<ChangeNotifier>,
}

impl<D: Clone> ListSource<D> {
	pub fn new(items: Vec<D>) -> Self {
		Self {
			items,
			covers: Vec::new(),
			listener: None,
		}
	}

	/// Sets per-position cover descriptors for set-of-sets views.
	pub fn with_covers(mut self, covers: Vec<Vec<D>>) -> Self {
		self.covers = covers;
		self
	}

	pub fn items(&self) -> &[D] {
		&self.items
	}

	/// Replaces all items and notifies the listener.
	pub fn set_items(&mut self, items: Vec<D>) {
		let resized = items.len() != self.items.len();
		self.items = items;
		if let Some(listener) = &self.listener {
			if resized {
				listener.size_changed(self.items.len());
			} else {
				listener.content_changed();
			}
		}
	}

	/// Marks cached pixels stale without changing items.
	pub fn touch(&self) {
		if let Some(listener) = &self.listener {
			listener.dirty();
		}
	}
}

impl<D: Clone> ItemSource for ListSource<D> {
	type Descriptor = D;

	fn count(&self) -> usize {
		self.items.len()
	}

	fn item_at(&mut self, index: usize) -> Option<D> {
		self.items.get(index).cloned()
	}

	fn cover_items_at(&mut self, index: usize) -> Vec<D> {
		match self.covers.get(index) {
			Some(covers) => covers.clone(),
			None => self.item_at(index).into_iter().collect(),
		}
	}

	fn set_change_listener(&mut self, listener: ChangeNotifier) {
		self.listener = Some(listener);
	}
}
