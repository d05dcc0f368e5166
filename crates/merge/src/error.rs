use thiserror::Error;

/// Errors building a [`crate::MergeView`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
	/// Paging needs at least one item per page.
	#[error("page size must be > 0")]
	ZeroPageSize,
}
