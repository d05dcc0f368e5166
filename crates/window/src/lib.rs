//! Windowed content cache over a scrollable collection.
//!
//! A [`SlidingWindow`] tracks which positions are on screen (active) and
//! which are merely nearby (cached), keeps one [`ItemWrapper`] per cached
//! position, and requests, prioritizes and cancels loads from a
//! [`ContentProducer`] as the window moves. The render layer subscribes to
//! [`WindowEvent`]s and reads content through [`SlidingWindow::get`].

mod cache;
mod config;
mod error;
mod event;
mod kind;
mod producer;
pub mod ranges;
mod source;
#[cfg(test)]
mod test_support;
mod wrapper;

pub use cache::{SlidingWindow, WindowItem};
pub use config::WindowConfig;
pub use error::{ConfigError, WindowError};
pub use event::{PumpReport, WindowEvent};
pub use kind::ContentKind;
pub use producer::{ContentProducer, PoolProducer};
pub use ranges::WindowRanges;
pub use source::{ChangeNotifier, ItemSource, ListSource, SourceChange};
pub use wrapper::{Completion, ItemWrapper, LoadState, Settled};
