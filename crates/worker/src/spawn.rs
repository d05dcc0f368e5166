use std::future::Future;
use std::sync::OnceLock;

use tokio::task::JoinHandle;

use crate::JobClass;

/// Returns the ambient runtime handle, falling back to a small shared runtime
/// when called from a thread that is not inside one (the owner/UI thread).
pub(crate) fn runtime_handle() -> tokio::runtime::Handle {
	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		return handle;
	}

	static GLOBAL_RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
	let runtime = GLOBAL_RT.get_or_init(|| {
		tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.worker_threads(2)
			.thread_name("mosaic-worker-global")
			.build()
			.expect("failed to build mosaic-worker global tokio runtime")
	});
	runtime.handle().clone()
}

/// Spawns an async task tagged with a job class.
pub fn spawn<F>(class: JobClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(job_class = class.as_str(), "worker.spawn");
	runtime_handle().spawn(fut)
}

/// Spawns blocking work tagged with a job class.
pub fn spawn_blocking<F, R>(class: JobClass, f: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	tracing::trace!(job_class = class.as_str(), "worker.spawn_blocking");
	runtime_handle().spawn_blocking(f)
}
