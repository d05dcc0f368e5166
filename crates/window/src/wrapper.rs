//! Per-slot load state machine.
//!
//! An [`ItemWrapper`] owns at most one outstanding request for one position
//! of the logical sequence. Completion listeners run on producer threads and
//! only post a [`Completion`] notice; the owner applies it later through
//! [`ItemWrapper::on_complete`], so all state changes happen on the owner
//! thread.

use mosaic_worker::{AsyncResult, LoadError, Outcome};
use tokio::sync::mpsc;

use crate::{ContentKind, ContentProducer};

/// Lifecycle of one wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadState {
	/// No content and no request.
	Invalid,
	/// One request in flight.
	Updating,
	/// Cancellation requested for the request in flight.
	Cancelling,
	/// Decoded content installed.
	Valid,
	/// The last request failed; shown as a placeholder.
	Error,
	/// Disposed; the wrapper is dead.
	Recycled,
}

impl LoadState {
	/// Whether a request is outstanding.
	pub const fn is_in_flight(self) -> bool {
		matches!(self, Self::Updating | Self::Cancelling)
	}

	/// Whether no further load will happen without outside action.
	pub const fn is_settled(self) -> bool {
		matches!(self, Self::Valid | Self::Error)
	}
}

/// Notice posted when a wrapper's outstanding request reaches a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
	/// Logical position of the wrapper.
	pub index: usize,
	/// Wrapper id, unique for the lifetime of its window.
	pub id: u64,
}

/// What [`ItemWrapper::on_complete`] did with a finished request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled {
	/// Content was installed; the wrapper is valid.
	Installed,
	/// The producer failed; the wrapper shows no content.
	Failed(LoadError),
	/// Cancelled while still wanted: a fresh request was issued.
	Reissued,
	/// Cancelled and no longer wanted: the wrapper is invalid and idle.
	Idle,
	/// The wrapper was being recycled and is now disposed.
	Disposed,
	/// No finished request was outstanding.
	Stale,
}

/// Load state machine wrapping one slot of the logical sequence.
pub struct ItemWrapper<D, C> {
	id: u64,
	index: usize,
	kind: ContentKind,
	descriptor: Option<D>,
	state: LoadState,
	content: Option<C>,
	pending: Option<AsyncResult<C>>,
	wanted: bool,
	recycling: bool,
	error: Option<LoadError>,
	notify: mpsc::UnboundedSender<Completion>,
}

impl<D, C> std::fmt::Debug for ItemWrapper<D, C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ItemWrapper")
			.field("id", &self.id)
			.field("index", &self.index)
			.field("state", &self.state)
			.field("wanted", &self.wanted)
			.field("recycling", &self.recycling)
			.finish()
	}
}

impl<D, C> ItemWrapper<D, C>
where
	C: Send + 'static,
{
	/// Creates a wrapper for position `index`.
	///
	/// A missing descriptor puts the wrapper straight into [`LoadState::Error`].
	pub fn new(id: u64, index: usize, descriptor: Option<D>, kind: ContentKind, notify: mpsc::UnboundedSender<Completion>) -> Self {
		let (state, error) = match descriptor {
			Some(_) => (LoadState::Invalid, None),
			None => (LoadState::Error, Some(LoadError::MissingItem)),
		};
		Self {
			id,
			index,
			kind,
			descriptor,
			state,
			content: None,
			pending: None,
			wanted: false,
			recycling: false,
			error,
			notify,
		}
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn index(&self) -> usize {
		self.index
	}

	pub fn kind(&self) -> ContentKind {
		self.kind
	}

	pub fn descriptor(&self) -> Option<&D> {
		self.descriptor.as_ref()
	}

	pub fn state(&self) -> LoadState {
		self.state
	}

	/// Decoded content; present only in [`LoadState::Valid`].
	pub fn content(&self) -> Option<&C> {
		self.content.as_ref()
	}

	pub fn error(&self) -> Option<&LoadError> {
		self.error.as_ref()
	}

	pub fn is_recycling(&self) -> bool {
		self.recycling
	}

	/// Whether a request is outstanding that will eventually install content.
	pub fn is_request_in_progress(&self) -> bool {
		match self.state {
			LoadState::Updating => true,
			LoadState::Cancelling => self.wanted && !self.recycling,
			_ => false,
		}
	}

	/// Asks for content. Issues a request only from [`LoadState::Invalid`].
	///
	/// While cancelling, the wrapper remembers it is wanted again and
	/// reissues once the cancelled request drains. Returns whether a request
	/// is in progress afterwards.
	pub fn request_load<P>(&mut self, producer: &P) -> bool
	where
		P: ContentProducer<D, Content = C>,
	{
		if self.recycling || self.state == LoadState::Recycled {
			return false;
		}
		self.wanted = true;
		if self.state == LoadState::Invalid {
			self.issue(producer);
		}
		self.is_request_in_progress()
	}

	/// Withdraws interest in the outstanding request, if any.
	///
	/// Returns `true` if a cancellation was forwarded to the producer.
	pub fn cancel_load(&mut self) -> bool {
		self.wanted = false;
		if self.state != LoadState::Updating {
			return false;
		}
		self.state = LoadState::Cancelling;
		if let Some(pending) = &self.pending {
			pending.request_cancel();
		}
		tracing::trace!(slot = self.index, id = self.id, "wrapper.cancel");
		true
	}

	/// Disposes the wrapper, deferring while a request is in flight.
	///
	/// Returns `true` if disposal finished now. Otherwise cancellation was
	/// forwarded and disposal completes in [`Self::on_complete`].
	pub fn recycle<P>(&mut self, producer: &P) -> bool
	where
		P: ContentProducer<D, Content = C>,
	{
		match self.state {
			LoadState::Recycled => true,
			LoadState::Updating | LoadState::Cancelling => {
				self.cancel_load();
				self.recycling = true;
				tracing::trace!(slot = self.index, id = self.id, "wrapper.recycle_deferred");
				false
			}
			LoadState::Invalid | LoadState::Valid | LoadState::Error => {
				self.dispose(producer);
				true
			}
		}
	}

	/// Applies the terminal outcome of the outstanding request.
	pub fn on_complete<P>(&mut self, producer: &P) -> Settled
	where
		P: ContentProducer<D, Content = C>,
	{
		let Some(pending) = self.pending.take() else {
			return Settled::Stale;
		};
		let Some(outcome) = pending.try_take() else {
			self.pending = Some(pending);
			return Settled::Stale;
		};

		if self.recycling {
			if let Outcome::Value(content) = outcome {
				producer.release(content);
			}
			self.dispose(producer);
			return Settled::Disposed;
		}

		match outcome {
			Outcome::Value(content) => {
				if let Some(old) = self.content.replace(content) {
					producer.release(old);
				}
				self.state = LoadState::Valid;
				self.error = None;
				tracing::trace!(slot = self.index, id = self.id, "wrapper.installed");
				Settled::Installed
			}
			Outcome::Failed(err) => {
				if let Some(old) = self.content.take() {
					producer.release(old);
				}
				self.state = LoadState::Error;
				self.error = Some(err.clone());
				Settled::Failed(err)
			}
			Outcome::Cancelled => {
				self.state = LoadState::Invalid;
				if self.wanted {
					tracing::trace!(slot = self.index, id = self.id, "wrapper.reissue");
					self.issue(producer);
					Settled::Reissued
				} else {
					Settled::Idle
				}
			}
		}
	}

	fn issue<P>(&mut self, producer: &P)
	where
		P: ContentProducer<D, Content = C>,
	{
		let Some(descriptor) = self.descriptor.as_ref() else {
			self.state = LoadState::Error;
			self.error = Some(LoadError::MissingItem);
			return;
		};
		debug_assert!(self.pending.is_none(), "at most one request per wrapper");

		let handle = producer.submit(descriptor, self.kind);
		self.pending = Some(handle.clone());
		self.state = LoadState::Updating;
		tracing::trace!(slot = self.index, id = self.id, kind = self.kind.as_str(), "wrapper.request");

		let notify = self.notify.clone();
		let done = Completion { index: self.index, id: self.id };
		handle.register(move |_| {
			let _ = notify.send(done);
		});
	}

	fn dispose<P>(&mut self, producer: &P)
	where
		P: ContentProducer<D, Content = C>,
	{
		if let Some(content) = self.content.take() {
			producer.release(content);
		}
		self.pending = None;
		self.wanted = false;
		self.recycling = false;
		self.state = LoadState::Recycled;
		tracing::trace!(slot = self.index, id = self.id, "wrapper.recycled");
	}
}

impl<D, C> Drop for ItemWrapper<D, C> {
	fn drop(&mut self) {
		if let Some(pending) = &self.pending {
			pending.request_cancel();
		}
	}
}
