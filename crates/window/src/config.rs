//! Window configuration.

use serde::Deserialize;

use crate::{ConfigError, ContentKind};

/// Tunables of one [`crate::SlidingWindow`].
///
/// ```toml
/// kind = "cover"
/// capacity = 48
/// recenter_threshold = 4
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
	/// What each slot decodes to.
	pub kind: ContentKind,
	/// Size of the wrapper ring, which bounds the cached range.
	pub capacity: usize,
	/// Minimum drift, in positions, before the cached range is recentered
	/// while it still covers the active range. Zero recenters on every move.
	pub recenter_threshold: usize,
	/// Buffered events per renderer subscription before lagging.
	pub event_buffer: usize,
}

impl Default for WindowConfig {
	fn default() -> Self {
		Self::for_kind(ContentKind::default())
	}
}

impl WindowConfig {
	/// Preset for a content kind.
	pub const fn for_kind(kind: ContentKind) -> Self {
		Self {
			kind,
			capacity: kind.default_capacity(),
			recenter_threshold: 4,
			event_buffer: 256,
		}
	}

	/// Parses a config from TOML text and validates it.
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.capacity == 0 {
			return Err(ConfigError::Invalid("capacity must be > 0".into()));
		}
		if self.event_buffer == 0 {
			return Err(ConfigError::Invalid("event_buffer must be > 0".into()));
		}
		Ok(())
	}

	pub const fn capacity(mut self, capacity: usize) -> Self {
		self.capacity = capacity;
		self
	}

	pub const fn recenter_threshold(mut self, threshold: usize) -> Self {
		self.recenter_threshold = threshold;
		self
	}
}
