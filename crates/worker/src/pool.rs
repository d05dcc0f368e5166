//! Bounded pool running producer jobs on the runtime's blocking threads.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::{AsyncResult, JobClass, LoadError, spawn};

/// Sizing for a [`JobPool`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JobPoolConfig {
	/// Jobs allowed to run at the same time. Queued jobs wait for a slot.
	pub max_concurrent: usize,
}

impl Default for JobPoolConfig {
	fn default() -> Self {
		Self { max_concurrent: 4 }
	}
}

/// View of the job's own result handed to running jobs.
#[derive(Debug, Clone)]
pub struct JobContext {
	cancel: CancellationToken,
}

impl JobContext {
	/// Returns `true` once the consumer asked for cancellation.
	///
	/// Long jobs should poll this between stages and return early; the pool
	/// then reports the job as cancelled rather than failed.
	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	pub fn token(&self) -> &CancellationToken {
		&self.cancel
	}
}

/// Runs blocking jobs with bounded concurrency and hands back [`AsyncResult`]s.
///
/// A job cancelled while still queued never runs. A running job that
/// returns an error after cancellation was requested resolves as cancelled.
/// A running job that returns a value resolves with it even if cancellation
/// arrived meanwhile.
#[derive(Debug, Clone)]
pub struct JobPool {
	class: JobClass,
	permits: Arc<Semaphore>,
}

impl JobPool {
	pub fn new(class: JobClass, config: &JobPoolConfig) -> Self {
		Self {
			class,
			permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
		}
	}

	pub const fn class(&self) -> JobClass {
		self.class
	}

	/// Jobs that could start right now without waiting.
	pub fn available_slots(&self) -> usize {
		self.permits.available_permits()
	}

	/// Stops accepting jobs. Queued jobs fail with [`LoadError::PoolClosed`].
	pub fn close(&self) {
		tracing::debug!(job_class = self.class.as_str(), "worker.pool.close");
		self.permits.close();
	}

	pub fn is_closed(&self) -> bool {
		self.permits.is_closed()
	}

	/// Queues `job` and returns the handle its outcome is delivered through.
	pub fn submit<T, F>(&self, job: F) -> AsyncResult<T>
	where
		T: Send + 'static,
		F: FnOnce(&JobContext) -> Result<T, LoadError> + Send + 'static,
	{
		let result = AsyncResult::new();
		if self.permits.is_closed() {
			result.fail(LoadError::PoolClosed);
			return result;
		}

		let class = self.class;
		let permits = Arc::clone(&self.permits);
		let task_result = result.clone();
		spawn::spawn(class, async move {
			let cancel = task_result.token();
			let permit = tokio::select! {
				permit = permits.acquire_owned() => permit,
				_ = cancel.cancelled() => {
					tracing::trace!(job_class = class.as_str(), "worker.pool.cancelled_queued");
					task_result.mark_cancelled();
					return;
				}
			};
			let Ok(permit) = permit else {
				task_result.fail(LoadError::PoolClosed);
				return;
			};
			if cancel.is_cancelled() {
				task_result.mark_cancelled();
				return;
			}

			let ctx = JobContext { cancel: cancel.clone() };
			let joined = spawn::spawn_blocking(class, move || job(&ctx)).await;
			drop(permit);

			match joined {
				Ok(Ok(value)) => {
					task_result.resolve(value);
				}
				Ok(Err(_)) if cancel.is_cancelled() => {
					task_result.mark_cancelled();
				}
				Ok(Err(err)) => {
					task_result.fail(err);
				}
				Err(err) => {
					tracing::warn!(job_class = class.as_str(), error = %err, "worker.pool.job_panicked");
					task_result.fail(LoadError::failed(format!("job aborted: {err}")));
				}
			}
		});
		result
	}
}
