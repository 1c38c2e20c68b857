// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{Clock, Tick};

struct State {
    now: Tick,
}

/// A [`Clock`] whose time only moves when [`FakeClock::advance`] is called.
///
/// Enabled by the `test-util` feature. Multiple clones share the same
/// underlying time, mirroring how [`RealClock`][super::RealClock] clones all
/// observe the same wall clock.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use spa_guard_clock::{Clock, FakeClock};
///
/// # #[tokio::main]
/// # async fn main() {
/// let clock = FakeClock::new();
/// let mut delay = Box::pin(clock.delay(Duration::from_millis(100)));
///
/// // The delay does not resolve until time is advanced past its target.
/// clock.advance(Duration::from_millis(100));
/// delay.await;
/// # }
/// ```
#[derive(Clone)]
pub struct FakeClock {
    state: Arc<Mutex<State>>,
    notify: Arc<tokio::sync::Notify>,
}

impl std::fmt::Debug for FakeClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeClock").field("now", &self.state.lock().now).finish()
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeClock {
    /// Creates a new fake clock frozen at tick zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State { now: Tick::default() })),
            notify: Arc::new(tokio::sync::Notify::new()),
        }
    }

    /// Moves virtual time forward by `duration`, waking any pending delays
    /// whose target has now been reached.
    pub fn advance(&self, duration: Duration) {
        {
            let mut state = self.state.lock();
            state.now = state.now.checked_add(duration).unwrap_or(state.now);
        }
        self.notify.notify_waiters();
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Tick {
        self.state.lock().now
    }

    fn delay(&self, duration: Duration) -> super::DelayFuture {
        let clock = self.clone();
        let target = clock.now().checked_add(duration);
        Box::pin(async move {
            let Some(target) = target else {
                // A duration so large it overflows our tick never completes,
                // matching `Duration::MAX` semantics in other clock implementations.
                std::future::pending::<()>().await;
                return;
            };
            loop {
                if clock.now() >= target {
                    return;
                }
                clock.notify.notified().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delay_does_not_resolve_before_advance() {
        let clock = FakeClock::new();
        let delay = clock.delay(Duration::from_millis(50));
        tokio::select! {
            () = delay => panic!("delay resolved before time advanced"),
            () = tokio::time::sleep(Duration::from_millis(10)) => {}
        }
    }

    #[tokio::test]
    async fn delay_resolves_once_advanced_past_target() {
        let clock = FakeClock::new();
        let delay = clock.delay(Duration::from_millis(50));
        clock.advance(Duration::from_millis(60));
        delay.await;
    }

    #[tokio::test]
    async fn zero_duration_delay_resolves_without_advance() {
        let clock = FakeClock::new();
        clock.delay(Duration::ZERO).await;
    }
}
