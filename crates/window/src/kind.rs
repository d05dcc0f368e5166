use serde::Deserialize;

/// What a window decodes for each slot, which drives sizing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
	/// Small square crops for dense grids.
	MicroThumbnail,
	/// Regular grid thumbnails.
	#[default]
	Thumbnail,
	/// Representative item of a set, drawn from `cover_items_at`.
	Cover,
	/// Screen-sized previews for a filmstrip.
	Screennail,
}

impl ContentKind {
	/// Target long-edge size in pixels requested from the producer.
	pub const fn target_size(self) -> u32 {
		match self {
			Self::MicroThumbnail => 200,
			Self::Thumbnail | Self::Cover => 640,
			Self::Screennail => 1024,
		}
	}

	/// Ring capacity used when a config does not override it.
	pub const fn default_capacity(self) -> usize {
		match self {
			Self::MicroThumbnail | Self::Thumbnail => 96,
			Self::Cover => 48,
			Self::Screennail => 32,
		}
	}

	/// Whether descriptors come from the set's covers instead of its items.
	pub const fn uses_cover(self) -> bool {
		matches!(self, Self::Cover)
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::MicroThumbnail => "micro_thumbnail",
			Self::Thumbnail => "thumbnail",
			Self::Cover => "cover",
			Self::Screennail => "screennail",
		}
	}
}
