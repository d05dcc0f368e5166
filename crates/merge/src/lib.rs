//! Merged, paged views over several sorted collections.
//!
//! [`MergeView`] presents the order-preserving union of any number of
//! [`MergeSource`]s as one random-access sequence without materializing it.
//! [`WindowSource`] plugs such a view into a [`mosaic_window::SlidingWindow`].

mod checkpoint;
mod config;
mod error;
mod page;
mod source;
mod view;
mod window_source;

pub use checkpoint::CheckpointIndex;
pub use config::MergeConfig;
pub use error::MergeError;
pub use source::{MergeSource, SharedSource, SourceStamp, VecSource};
pub use view::MergeView;
pub use window_source::WindowSource;
