//! Injectable delay dependency.
//!
//! The canary soak pause is the only wall-clock wait the engine owns
//! directly. It goes through [`Sleeper`] so tests can observe requested
//! delays instead of blocking for real, and so cancellation could be
//! threaded through later without touching the strategy logic.

use std::time::Duration;

use cutover_core::BoxFuture;

/// Sleep abstraction for soak pauses.
pub trait Sleeper: Send + Sync {
    /// Suspend the calling task for `duration`.
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}
