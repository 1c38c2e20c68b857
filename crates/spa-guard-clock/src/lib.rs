// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! Time abstraction used by the retry orchestrator and the lazy-import wrapper.
//!
//! Working with time is notoriously difficult to test: a `triggerRetry` that
//! waits on `tokio::time::sleep` directly cannot be driven deterministically in
//! a unit test without actually waiting out the delay. [`Clock`] abstracts the
//! two operations the rest of the runtime needs - reading "now" and waiting for
//! a duration - so production code uses [`RealClock`] and tests use
//! [`FakeClock`], which advances only when told to.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use spa_guard_clock::{Clock, RealClock};
//!
//! # async fn example() {
//! let clock = RealClock::new();
//! let start = clock.now();
//! clock.delay(Duration::from_millis(5)).await;
//! assert!(clock.now().since(start) >= Duration::from_millis(5));
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A monotonic point in time, relative to when the owning [`Clock`] was created.
///
/// This is deliberately not [`std::time::Instant`] directly: [`FakeClock`] needs
/// to manufacture arbitrary instants when advancing virtual time, which the
/// standard type does not allow.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tick(Duration);

impl Tick {
    /// The duration elapsed between `earlier` and `self`. Saturates at zero if
    /// `earlier` is actually later (callers should not rely on this happening).
    #[must_use]
    pub fn since(&self, earlier: Tick) -> Duration {
        self.0.saturating_sub(earlier.0)
    }

    /// Offsets this tick forward by `duration`.
    #[must_use]
    pub fn checked_add(self, duration: Duration) -> Option<Tick> {
        self.0.checked_add(duration).map(Tick)
    }
}

/// A boxed, type-erased delay future returned by [`Clock::delay`].
pub type DelayFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Abstracts time for components that need to wait or measure elapsed time.
///
/// Implementations must be cheap to clone (an `Arc` internally) so the same
/// logical clock can be shared across the orchestrator, the lazy-import
/// wrapper, and tests that want to observe or control it.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current point in time for this clock.
    fn now(&self) -> Tick;

    /// Returns a future that completes after `duration` has elapsed on this
    /// clock. A zero duration completes on the next poll.
    fn delay(&self, duration: Duration) -> DelayFuture;
}

/// Production [`Clock`] backed by the system monotonic clock and the Tokio
/// timer wheel.
#[derive(Debug, Clone)]
pub struct RealClock {
    epoch: Instant,
}

impl Default for RealClock {
    fn default() -> Self {
        Self::new()
    }
}

impl RealClock {
    /// Creates a new clock, anchored to the instant of construction.
    #[must_use]
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl Clock for RealClock {
    fn now(&self) -> Tick {
        Tick(self.epoch.elapsed())
    }

    fn delay(&self, duration: Duration) -> DelayFuture {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// A cooperative cancellation flag shared between a delay's owner and whoever
/// wants to interrupt it early.
///
/// This mirrors the browser `AbortSignal` used by the lazy-import wrapper:
/// cancelling only interrupts the *wait*, never in-flight work that has
/// already started.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    notify: Arc<tokio::sync::Notify>,
    cancelled: Arc<std::sync::atomic::AtomicBool>,
}

impl CancelToken {
    /// Creates a fresh, not-yet-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the token cancelled and wakes anyone waiting on it.
    pub fn cancel(&self) {
        self.cancelled.store(true, std::sync::atomic::Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Returns whether [`Self::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Resolves once [`Self::cancel`] is called, or immediately if it already
    /// has been.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }
}

#[cfg(feature = "test-util")]
mod fake;
#[cfg(feature = "test-util")]
pub use fake::FakeClock;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn real_clock_delay_elapses_at_least_requested_duration() {
        let clock = RealClock::new();
        let start = clock.now();
        clock.delay(Duration::from_millis(5)).await;
        assert!(clock.now().since(start) >= Duration::from_millis(5));
    }

    #[tokio::test]
    async fn cancel_token_wakes_pending_wait() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });
        assert!(!token.is_cancelled());
        token.cancel();
        handle.await.expect("task did not panic");
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_token_already_cancelled_resolves_immediately() {
        let token = CancelToken::new();
        token.cancel();
        token.cancelled().await;
    }
}
