//! Content-producing services consumed by the window.

use std::marker::PhantomData;
use std::sync::Arc;

use mosaic_worker::{AsyncResult, JobContext, JobPool, LoadError};

use crate::ContentKind;

/// Turns a descriptor into decoded content, asynchronously.
pub trait ContentProducer<D> {
	/// Decoded content owned by exactly one wrapper at a time.
	type Content;

	/// Issues one request. The returned handle is resolved by the producer.
	fn submit(&self, descriptor: &D, kind: ContentKind) -> AsyncResult<Self::Content>;

	/// Takes back content a wrapper no longer needs, e.g. into a buffer pool.
	fn release(&self, content: Self::Content) {
		drop(content);
	}
}

impl<D, P> ContentProducer<D> for Arc<P>
where
	P: ContentProducer<D> + ?Sized,
{
	type Content = P::Content;

	fn submit(&self, descriptor: &D, kind: ContentKind) -> AsyncResult<Self::Content> {
		(**self).submit(descriptor, kind)
	}

	fn release(&self, content: Self::Content) {
		(**self).release(content);
	}
}

/// Producer running a decode function on a [`JobPool`].
pub struct PoolProducer<D, C, F> {
	pool: JobPool,
	decode: Arc<F>,
	_marker: PhantomData<fn(&D) -> C>,
}

impl<D, C, F> PoolProducer<D, C, F>
where
	F: Fn(&D, ContentKind, &JobContext) -> Result<C, LoadError> + Send + Sync + 'static,
{
	pub fn new(pool: JobPool, decode: F) -> Self {
		Self {
			pool,
			decode: Arc::new(decode),
			_marker: PhantomData,
		}
	}

	pub fn pool(&self) -> &JobPool {
		&self.pool
	}
}

impl<D, C, F> ContentProducer<D> for PoolProducer<D, C, F>
where
	D: Clone + Send + 'static,
	C: Send + 'static,
	F: Fn(&D, ContentKind, &JobContext) -> Result<C, LoadError> + Send + Sync + 'static,
{
	type Content = C;

	fn submit(&self, descriptor: &D, kind: ContentKind) -> AsyncResult<C> {
		let descriptor = descriptor.clone();
		let decode = Arc::clone(&self.decode);
		self.pool.submit(move |ctx| decode(&descriptor, kind, ctx))
	}
}
