//! Worker-side primitives for asynchronous content loading.
//!
//! * [`AsyncResult`]: single-assignment result with cooperative cancellation.
//! * [`ChainedTask`]: several results driven in sequence as one cancellable unit.
//! * [`JobPool`]: bounded blocking pool producing [`AsyncResult`]s.

mod chain;
mod class;
mod error;
mod pool;
mod result;
mod spawn;
mod token;

pub use chain::{ChainSteps, ChainedTask};
pub use class::JobClass;
pub use error::LoadError;
pub use pool::{JobContext, JobPool, JobPoolConfig};
pub use result::{AsyncResult, Outcome, ResultState};
pub use spawn::{spawn, spawn_blocking};
pub use token::IdClock;
pub use tokio_util::sync::CancellationToken;
