//! Single-assignment, listener-driven result handle.
//!
//! An [`AsyncResult`] is created by whoever issues a request and shared with
//! the producer that fulfils it. Exactly one terminal transition ever happens
//! (value, failure or cancellation); the first caller wins and every later
//! attempt is a no-op. Resolution may happen on any thread, and the registered
//! listener runs on the thread that performs the transition.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio_util::sync::CancellationToken;

use crate::LoadError;

type Listener<T> = Box<dyn FnOnce(&AsyncResult<T>) + Send>;
type CancelHook = Box<dyn FnOnce() + Send>;

/// Terminal outcome observed by the consumer of a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
	/// The producer delivered a value.
	Value(T),
	/// The producer failed.
	Failed(LoadError),
	/// The request ended without a value after cancellation. Not an error.
	Cancelled,
}

impl<T> Outcome<T> {
	/// Returns the value, discarding failure and cancellation.
	pub fn value(self) -> Option<T> {
		match self {
			Self::Value(value) => Some(value),
			Self::Failed(_) | Self::Cancelled => None,
		}
	}

	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}

	pub fn is_value(&self) -> bool {
		matches!(self, Self::Value(_))
	}
}

/// Snapshot of a result's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultState {
	Pending,
	Ready,
	Failed,
	Cancelled,
	/// Resolved with a value that has since been taken.
	Consumed,
}

enum Slot<T> {
	Pending,
	Ready(T),
	Failed(LoadError),
	Cancelled,
	Consumed,
}

impl<T> Slot<T> {
	fn state(&self) -> ResultState {
		match self {
			Self::Pending => ResultState::Pending,
			Self::Ready(_) => ResultState::Ready,
			Self::Failed(_) => ResultState::Failed,
			Self::Cancelled => ResultState::Cancelled,
			Self::Consumed => ResultState::Consumed,
		}
	}

	fn take(&mut self) -> Option<Outcome<T>> {
		match std::mem::replace(self, Self::Consumed) {
			Self::Pending => {
				*self = Self::Pending;
				None
			}
			Self::Ready(value) => Some(Outcome::Value(value)),
			Self::Failed(err) => {
				*self = Self::Failed(err.clone());
				Some(Outcome::Failed(err))
			}
			Self::Cancelled => {
				*self = Self::Cancelled;
				Some(Outcome::Cancelled)
			}
			Self::Consumed => Some(Outcome::Failed(LoadError::Consumed)),
		}
	}
}

struct Shared<T> {
	slot: Slot<T>,
	listener: Option<Listener<T>>,
	cancel_hook: Option<CancelHook>,
}

struct Inner<T> {
	shared: Mutex<Shared<T>>,
	done: Condvar,
	cancel: CancellationToken,
}

/// Cancellable, single-assignment handle for a value produced elsewhere.
///
/// Cloning yields another handle to the same result.
pub struct AsyncResult<T> {
	inner: Arc<Inner<T>>,
}

impl<T> Clone for AsyncResult<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T> fmt::Debug for AsyncResult<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AsyncResult")
			.field("state", &self.state())
			.field("cancel_requested", &self.is_cancelled())
			.finish()
	}
}

impl<T> Default for AsyncResult<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> AsyncResult<T> {
	/// Creates a pending result with a fresh cancellation token.
	pub fn new() -> Self {
		Self::with_token(CancellationToken::new())
	}

	/// Creates a pending result observing an existing cancellation token.
	///
	/// Passing a child token lets a parent scope cancel many requests at once.
	pub fn with_token(cancel: CancellationToken) -> Self {
		Self {
			inner: Arc::new(Inner {
				shared: Mutex::new(Shared {
					slot: Slot::Pending,
					listener: None,
					cancel_hook: None,
				}),
				done: Condvar::new(),
				cancel,
			}),
		}
	}

	/// Creates a result already resolved with `value`.
	pub fn ready(value: T) -> Self {
		let result = Self::new();
		result.resolve(value);
		result
	}

	/// Creates a result already failed with `err`.
	pub fn failed(err: LoadError) -> Self {
		let result = Self::new();
		result.fail(err);
		result
	}

	/// Registers the completion listener.
	///
	/// Fires immediately on the calling thread if the result is already
	/// terminal; otherwise replaces any previously registered listener and
	/// fires once, on the thread performing the terminal transition.
	pub fn register(&self, listener: impl FnOnce(&AsyncResult<T>) + Send + 'static) {
		let mut shared = self.inner.shared.lock();
		if matches!(shared.slot, Slot::Pending) {
			shared.listener = Some(Box::new(listener));
			return;
		}
		drop(shared);
		listener(self);
	}

	/// Resolves with a value. Returns `false` if the result was already terminal.
	pub fn resolve(&self, value: T) -> bool {
		self.complete(Slot::Ready(value))
	}

	/// Fails with `err`. Returns `false` if the result was already terminal.
	pub fn fail(&self, err: LoadError) -> bool {
		self.complete(Slot::Failed(err))
	}

	/// Ends the request as cancelled. Called by producers that observed
	/// [`Self::is_cancelled`] before producing a value.
	pub fn mark_cancelled(&self) -> bool {
		self.complete(Slot::Cancelled)
	}

	/// Signals that the consumer no longer needs the value.
	///
	/// Only intent is recorded: the producer decides whether work in progress
	/// can be aborted, and may still resolve with a value afterwards.
	pub fn request_cancel(&self) {
		if self.inner.cancel.is_cancelled() {
			return;
		}
		self.inner.cancel.cancel();
		let hook = self.inner.shared.lock().cancel_hook.take();
		if let Some(hook) = hook {
			hook();
		}
	}

	/// Installs a hook fired once when cancellation is requested.
	///
	/// Fires immediately if cancellation was already requested. The hook is
	/// dropped unfired when the result becomes terminal first.
	pub fn on_cancel_requested(&self, hook: impl FnOnce() + Send + 'static) {
		let mut shared = self.inner.shared.lock();
		if !self.inner.cancel.is_cancelled() {
			if matches!(shared.slot, Slot::Pending) {
				shared.cancel_hook = Some(Box::new(hook));
			}
			return;
		}
		drop(shared);
		hook();
	}

	/// Returns `true` once cancellation has been requested.
	pub fn is_cancelled(&self) -> bool {
		self.inner.cancel.is_cancelled()
	}

	/// Returns `true` once the result reached a terminal state.
	pub fn is_done(&self) -> bool {
		!matches!(self.inner.shared.lock().slot, Slot::Pending)
	}

	pub fn state(&self) -> ResultState {
		self.inner.shared.lock().slot.state()
	}

	/// Clone of the cancellation token, for async producers.
	pub fn token(&self) -> CancellationToken {
		self.inner.cancel.clone()
	}

	/// Takes the terminal outcome without blocking.
	///
	/// The value moves out exactly once; later takes observe
	/// [`LoadError::Consumed`].
	pub fn try_take(&self) -> Option<Outcome<T>> {
		self.inner.shared.lock().slot.take()
	}

	/// Blocks until the result is terminal, then takes its outcome.
	///
	/// Never call this on a thread the producer itself needs.
	pub fn wait(&self) -> Outcome<T> {
		let mut shared = self.inner.shared.lock();
		loop {
			if let Some(outcome) = shared.slot.take() {
				return outcome;
			}
			self.inner.done.wait(&mut shared);
		}
	}

	/// Blocks for at most `timeout`. Returns `None` if still pending.
	///
	/// A timeout too large to express as a deadline waits without bound.
	pub fn wait_timeout(&self, timeout: Duration) -> Option<Outcome<T>> {
		let Some(deadline) = Instant::now().checked_add(timeout) else {
			return Some(self.wait());
		};
		let mut shared = self.inner.shared.lock();
		loop {
			if let Some(outcome) = shared.slot.take() {
				return Some(outcome);
			}
			if self.inner.done.wait_until(&mut shared, deadline).timed_out() {
				return shared.slot.take();
			}
		}
	}

	/// Returns `true` if both handles refer to the same result.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}

	fn complete(&self, slot: Slot<T>) -> bool {
		let mut shared = self.inner.shared.lock();
		if !matches!(shared.slot, Slot::Pending) {
			return false;
		}
		shared.slot = slot;
		let listener = shared.listener.take();
		let hook = shared.cancel_hook.take();
		drop(shared);
		drop(hook);
		self.inner.done.notify_all();
		if let Some(listener) = listener {
			listener(self);
		}
		true
	}
}
