//! Merge view configuration.

use mosaic_window::ConfigError;
use serde::Deserialize;

/// Tunables of one [`crate::MergeView`].
///
/// ```toml
/// page_size = 64
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
	/// Items fetched per source page, and the spacing of merge checkpoints.
	pub page_size: usize,
}

impl Default for MergeConfig {
	fn default() -> Self {
		Self { page_size: 64 }
	}
}

impl MergeConfig {
	pub const fn with_page_size(page_size: usize) -> Self {
		Self { page_size }
	}

	/// Parses a config from TOML text and validates it.
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.page_size == 0 {
			return Err(ConfigError::Invalid("page_size must be > 0".into()));
		}
		Ok(())
	}
}
