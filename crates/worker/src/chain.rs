//! Multi-step requests driven as one cancellable unit.
//!
//! A chain asks its [`ChainSteps`] for step 0, waits for that step's result,
//! then asks for step 1 with the previous value, and so on until the steps
//! report there is nothing left to do. The chain's own [`AsyncResult`]
//! resolves with the last step's value.
//!
//! Cancelling the chain forwards the request to the step currently in
//! flight and guarantees no further step is issued. Side effects of a step
//! that was already issued are best-effort: the step's producer decides
//! whether it can still abort.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::{AsyncResult, LoadError, Outcome};

/// Producer of the successive steps of a chain.
pub trait ChainSteps<T>: Send + 'static {
	/// Issues step `step` given the value of the previous step (`None` for
	/// step 0). Returning `None` ends the chain.
	fn advance(&mut self, step: usize, prior: Option<&T>) -> Option<AsyncResult<T>>;
}

impl<T, F> ChainSteps<T> for F
where
	F: FnMut(usize, Option<&T>) -> Option<AsyncResult<T>> + Send + 'static,
{
	fn advance(&mut self, step: usize, prior: Option<&T>) -> Option<AsyncResult<T>> {
		self(step, prior)
	}
}

struct Driver<T, S> {
	steps: Mutex<S>,
	current: Mutex<Option<AsyncResult<T>>>,
	step: Arc<AtomicUsize>,
	result: AsyncResult<T>,
}

/// Handle for a running chain.
#[derive(Debug)]
pub struct ChainedTask<T> {
	result: AsyncResult<T>,
	step: Arc<AtomicUsize>,
}

impl<T> Clone for ChainedTask<T> {
	fn clone(&self) -> Self {
		Self {
			result: self.result.clone(),
			step: Arc::clone(&self.step),
		}
	}
}

impl<T: Send + 'static> ChainedTask<T> {
	/// Starts the chain by issuing step 0 on the calling thread.
	pub fn start<S>(steps: S) -> Self
	where
		S: ChainSteps<T>,
	{
		let result = AsyncResult::new();
		let step = Arc::new(AtomicUsize::new(0));
		let driver = Arc::new(Driver {
			steps: Mutex::new(steps),
			current: Mutex::new(None),
			step: Arc::clone(&step),
			result: result.clone(),
		});

		let forward = Arc::clone(&driver);
		result.on_cancel_requested(move || {
			let in_flight = forward.current.lock().clone();
			if let Some(in_flight) = in_flight {
				tracing::trace!(step = forward.step.load(Ordering::Acquire), "chain.cancel_forwarded");
				in_flight.request_cancel();
			}
		});

		driver.advance(0, None);
		Self { result, step }
	}

	/// The chain's own result.
	pub fn result(&self) -> &AsyncResult<T> {
		&self.result
	}

	pub fn into_result(self) -> AsyncResult<T> {
		self.result
	}

	/// Index of the step most recently issued.
	pub fn current_step(&self) -> usize {
		self.step.load(Ordering::Acquire)
	}

	/// Cancels the step in flight; no later step will be issued.
	pub fn request_cancel(&self) {
		self.result.request_cancel();
	}
}

impl<T, S> Driver<T, S>
where
	T: Send + 'static,
	S: ChainSteps<T>,
{
	/// Issues steps until one is still pending or the chain is terminal.
	///
	/// Steps that are already resolved when issued are consumed inline, so
	/// a long run of ready steps never nests listener calls.
	fn advance(self: &Arc<Self>, mut step: usize, mut prior: Option<T>) {
		loop {
			if self.result.is_cancelled() {
				tracing::trace!(step, "chain.stopped");
				self.result.mark_cancelled();
				return;
			}

			let next = self.steps.lock().advance(step, prior.as_ref());
			let Some(handle) = next else {
				match prior {
					Some(value) => {
						self.result.resolve(value);
					}
					None => {
						self.result.fail(LoadError::EmptyChain);
					}
				}
				return;
			};

			self.step.store(step, Ordering::Release);
			*self.current.lock() = Some(handle.clone());
			if self.result.is_cancelled() {
				handle.request_cancel();
			}

			if !handle.is_done() {
				let driver = Arc::clone(self);
				handle.register(move |done| driver.on_step_done(step, done));
				return;
			}

			match self.settle(step, &handle) {
				Some(value) => {
					step += 1;
					prior = Some(value);
				}
				None => return,
			}
		}
	}

	fn on_step_done(self: &Arc<Self>, step: usize, done: &AsyncResult<T>) {
		if let Some(value) = self.settle(step, done) {
			self.advance(step + 1, Some(value));
		}
	}

	/// Clears the in-flight step and returns its value if the chain goes on.
	fn settle(&self, step: usize, done: &AsyncResult<T>) -> Option<T> {
		self.current.lock().take();
		match done.try_take() {
			Some(Outcome::Value(value)) => Some(value),
			Some(Outcome::Failed(err)) => {
				tracing::trace!(step, error = %err, "chain.step_failed");
				self.result.fail(err);
				None
			}
			Some(Outcome::Cancelled) => {
				self.result.mark_cancelled();
				None
			}
			None => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::AtomicUsize;

	use super::*;

	#[test]
	fn steps_run_in_order_and_last_value_wins() {
		let task = ChainedTask::start(|step: usize, prior: Option<&String>| match step {
			0 => Some(AsyncResult::ready("bytes".to_string())),
			1 => prior.map(|bytes| AsyncResult::ready(format!("decoded({bytes})"))),
			_ => None,
		});
		assert_eq!(task.result().wait(), Outcome::Value("decoded(bytes)".to_string()));
		assert_eq!(task.current_step(), 1);
	}

	#[test]
	fn empty_chain_is_an_error() {
		let task = ChainedTask::<u32>::start(|_: usize, _: Option<&u32>| None);
		assert_eq!(task.result().wait(), Outcome::Failed(LoadError::EmptyChain));
	}

	#[test]
	fn step_failure_fails_the_chain() {
		let issued = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&issued);
		let task = ChainedTask::start(move |step: usize, _: Option<&u32>| {
			counter.fetch_add(1, Ordering::SeqCst);
			match step {
				0 => Some(AsyncResult::failed(LoadError::failed("404"))),
				_ => Some(AsyncResult::ready(1)),
			}
		});
		assert_eq!(task.result().wait(), Outcome::Failed(LoadError::Failed("404".into())));
		assert_eq!(issued.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn cancel_reaches_only_the_in_flight_step() {
		let fetch = AsyncResult::<u32>::new();
		let issued = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&issued);
		let step_zero = fetch.clone();
		let task = ChainedTask::start(move |step: usize, _: Option<&u32>| {
			counter.fetch_add(1, Ordering::SeqCst);
			match step {
				0 => Some(step_zero.clone()),
				_ => Some(AsyncResult::ready(2)),
			}
		});

		task.request_cancel();
		assert!(fetch.is_cancelled());

		// The producer ignores the cancel and commits a value anyway.
		fetch.resolve(1);
		assert_eq!(task.result().wait(), Outcome::Cancelled);
		assert_eq!(issued.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn cancelled_step_cancels_the_chain() {
		let fetch = AsyncResult::<u32>::new();
		let step_zero = fetch.clone();
		let task = ChainedTask::start(move |step: usize, _: Option<&u32>| (step == 0).then(|| step_zero.clone()));
		fetch.mark_cancelled();
		assert!(task.result().wait().is_cancelled());
	}

	#[test]
	fn long_run_of_ready_steps_stays_flat() {
		let task = ChainedTask::start(|step: usize, prior: Option<&usize>| {
			(step < 20_000).then(|| AsyncResult::ready(prior.copied().unwrap_or(0) + step))
		});
		assert_eq!(task.result().wait(), Outcome::Value((0..20_000usize).sum::<usize>()));
		assert_eq!(task.current_step(), 19_999);
	}

	#[test]
	fn ready_steps_after_a_pending_one_continue_on_the_resolving_thread() {
		let fetch = AsyncResult::<u32>::new();
		let step_three = fetch.clone();
		let task = ChainedTask::start(move |step: usize, prior: Option<&u32>| match step {
			0..=2 => Some(AsyncResult::ready(prior.copied().unwrap_or(0) + 1)),
			3 => Some(step_three.clone()),
			4..=999 => prior.map(|v| AsyncResult::ready(v + 1)),
			_ => None,
		});
		assert_eq!(task.current_step(), 3);
		assert!(!task.result().is_done());

		fetch.resolve(100);
		assert_eq!(task.result().wait(), Outcome::Value(100 + 996));
	}

	#[test]
	fn completion_on_another_thread_advances_the_chain() {
		let fetch = AsyncResult::<u32>::new();
		let step_zero = fetch.clone();
		let task = ChainedTask::start(move |step: usize, prior: Option<&u32>| match step {
			0 => Some(step_zero.clone()),
			1 => prior.map(|v| AsyncResult::ready(v * 10)),
			_ => None,
		});

		let producer = fetch.clone();
		std::thread::spawn(move || producer.resolve(4)).join().expect("producer thread");
		assert_eq!(task.result().wait(), Outcome::Value(40));
	}
}
