//! Request pacing for the Price Service.
//!
//! Every remote call is followed by a fixed pause. The pause goes through a
//! [`Sleeper`] so tests can observe it without waiting on the wall clock.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Something that can wait
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Gate called once after each remote request
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Wait until the next request may be issued
    async fn pause(&self);

    /// Number of pauses taken so far
    fn pauses(&self) -> u64;
}

/// Fixed delay after every request, regardless of its outcome.
pub struct FixedDelayThrottle {
    delay: Duration,
    sleeper: Arc<dyn Sleeper>,
    pauses: AtomicU64,
}

impl FixedDelayThrottle {
    pub fn new(delay: Duration) -> Self {
        Self::with_sleeper(delay, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(delay: Duration, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            delay,
            sleeper,
            pauses: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl Throttle for FixedDelayThrottle {
    async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        if self.delay.is_zero() {
            return;
        }
        trace!("Throttling for {}ms", self.delay.as_millis());
        self.sleeper.sleep(self.delay).await;
    }

    fn pauses(&self) -> u64 {
        self.pauses.load(Ordering::SeqCst)
    }
}
