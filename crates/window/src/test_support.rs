//! Instrumented producer for deterministic tests.

use std::collections::HashMap;
use std::sync::Arc;

use mosaic_worker::{AsyncResult, LoadError};
use parking_lot::Mutex;

use crate::{ContentKind, ContentProducer};

/// Decoded content stand-in: remembers which descriptor it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Pixels(pub u32);

#[derive(Default)]
struct FakeState {
	submitted: Vec<(u32, ContentKind)>,
	pending: Vec<(u32, AsyncResult<Pixels>)>,
	released: Vec<Pixels>,
	peak_in_flight: HashMap<u32, usize>,
}

/// Producer whose requests stay pending until the test settles them.
#[derive(Clone, Default)]
pub(crate) struct FakeProducer {
	state: Arc<Mutex<FakeState>>,
}

impl FakeProducer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Every `(descriptor, kind)` submitted, in order.
	pub fn submitted(&self) -> Vec<(u32, ContentKind)> {
		self.state.lock().submitted.clone()
	}

	pub fn submitted_descriptors(&self) -> Vec<u32> {
		self.state.lock().submitted.iter().map(|(d, _)| *d).collect()
	}

	pub fn submit_count(&self) -> usize {
		self.state.lock().submitted.len()
	}

	pub fn released(&self) -> Vec<Pixels> {
		self.state.lock().released.clone()
	}

	/// Requests for `descriptor` that have not reached a terminal state.
	pub fn in_flight(&self, descriptor: u32) -> usize {
		self.state.lock().pending.iter().filter(|(d, r)| *d == descriptor && !r.is_done()).count()
	}

	/// Highest number of simultaneously pending requests seen for `descriptor`.
	pub fn peak_in_flight(&self, descriptor: u32) -> usize {
		self.state.lock().peak_in_flight.get(&descriptor).copied().unwrap_or(0)
	}

	/// Whether the pending request for `descriptor` was asked to cancel.
	pub fn cancel_requested(&self, descriptor: u32) -> bool {
		self.pending_handle(descriptor).is_some_and(|r| r.is_cancelled())
	}

	/// Resolves the pending request for `descriptor` with its pixels.
	pub fn resolve(&self, descriptor: u32) -> bool {
		self.pending_handle(descriptor).is_some_and(|r| r.resolve(Pixels(descriptor)))
	}

	pub fn fail(&self, descriptor: u32, reason: &str) -> bool {
		self.pending_handle(descriptor).is_some_and(|r| r.fail(LoadError::failed(reason)))
	}

	pub fn mark_cancelled(&self, descriptor: u32) -> bool {
		self.pending_handle(descriptor).is_some_and(|r| r.mark_cancelled())
	}

	/// Marks every request whose consumer asked for cancellation as cancelled.
	pub fn honor_cancels(&self) -> usize {
		let handles: Vec<_> = self.state.lock().pending.iter().filter(|(_, r)| r.is_cancelled() && !r.is_done()).map(|(_, r)| r.clone()).collect();
		handles.iter().filter(|r| r.mark_cancelled()).count()
	}

	/// Resolves every pending request.
	pub fn resolve_all(&self) -> usize {
		let handles: Vec<_> = self.state.lock().pending.iter().filter(|(_, r)| !r.is_done()).cloned().collect();
		handles.iter().filter(|(d, r)| r.resolve(Pixels(*d))).count()
	}

	fn pending_handle(&self, descriptor: u32) -> Option<AsyncResult<Pixels>> {
		self.state.lock().pending.iter().find(|(d, r)| *d == descriptor && !r.is_done()).map(|(_, r)| r.clone())
	}
}

impl ContentProducer<u32> for FakeProducer {
	type Content = Pixels;

	fn submit(&self, descriptor: &u32, kind: ContentKind) -> AsyncResult<Pixels> {
		let result = AsyncResult::new();
		let mut state = self.state.lock();
		state.submitted.push((*descriptor, kind));
		state.pending.push((*descriptor, result.clone()));
		let live = state.pending.iter().filter(|(d, r)| d == descriptor && !r.is_done()).count();
		let peak = state.peak_in_flight.entry(*descriptor).or_default();
		*peak = (*peak).max(live);
		result
	}

	fn release(&self, content: Pixels) {
		self.state.lock().released.push(content);
	}
}
