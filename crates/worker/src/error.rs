//! Error types carried by async results.

use thiserror::Error;

/// Failure outcome of one content request.
///
/// Cancellation is deliberately absent: a cancelled request resolves to
/// [`crate::Outcome::Cancelled`], never to an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
	/// The producer could not fetch or decode the item.
	#[error("content producer failed: {0}")]
	Failed(String),
	/// The backing collection has no item at the requested position.
	#[error("no item at requested position")]
	MissingItem,
	/// A chained task produced no step at all.
	#[error("chained task produced no steps")]
	EmptyChain,
	/// The value of a resolved result was already taken by another consumer.
	#[error("result value already consumed")]
	Consumed,
	/// The job pool stopped accepting work.
	#[error("job pool is closed")]
	PoolClosed,
}

impl LoadError {
	/// Builds a producer failure from any displayable error.
	pub fn failed(err: impl std::fmt::Display) -> Self {
		Self::Failed(err.to_string())
	}
}
