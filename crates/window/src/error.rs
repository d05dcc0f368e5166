//! Error types for the window cache.

use std::ops::Range;

use thiserror::Error;

/// Contract violations reported by [`crate::SlidingWindow`].
///
/// These are caller bugs. The window logs them and leaves its state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
	/// `start` lies after `end`.
	#[error("malformed window [{start}, {end})")]
	InvalidWindow { start: usize, end: usize },
	/// The requested active range is wider than the wrapper ring.
	#[error("active window of {len} slots exceeds capacity {capacity}")]
	WindowTooLarge { len: usize, capacity: usize },
	/// The requested active range runs past the logical size.
	#[error("window end {end} exceeds logical size {size}")]
	OutOfBounds { end: usize, size: usize },
	/// A slot outside the active range was accessed.
	#[error("slot {slot} is outside active range {active:?}")]
	SlotNotActive { slot: usize, active: Range<usize> },
	/// Wrappers are released while the window is paused.
	#[error("window is paused")]
	Paused,
}

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The TOML text could not be parsed.
	#[error("config parse error: {0}")]
	Parse(#[from] toml::de::Error),
	/// A value parsed but is unusable.
	#[error("invalid config: {0}")]
	Invalid(String),
}
