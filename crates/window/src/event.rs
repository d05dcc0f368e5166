use crate::LoadState;

/// Notification from the window to the render layer.
///
/// Delivered over a broadcast channel; renderers subscribe with
/// [`crate::SlidingWindow::subscribe`] and read content through
/// [`crate::SlidingWindow::get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
	/// The logical size changed.
	SizeChanged(usize),
	/// The content of one slot changed state.
	ContentChanged { slot: usize, old: LoadState, new: LoadState },
	/// Nothing changed in the data; repaint only.
	ContentInvalidated,
}

/// Work applied by one [`crate::SlidingWindow::pump`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
	/// Completion notices processed.
	pub completions: usize,
	/// Upstream change notices processed.
	pub changes: usize,
}

impl PumpReport {
	pub fn is_empty(&self) -> bool {
		self.completions == 0 && self.changes == 0
	}
}
