// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use spa_guard_clock::{CancelToken, Clock};
use spa_guard_retry::{RetryOrchestrator, TriggerRequest};

/// Folds a burst of static-asset 404 observations into a single
/// `triggerRetry` call once no new observation has arrived for
/// `quiet_window` (§4.E "static-asset 404 coalescing").
///
/// Each [`Self::observe`] restarts the window, debounce-style, by cancelling
/// whichever wait is currently pending. This is deliberately simpler than a
/// single-flight merge (no in-flight result is shared): the orchestrator's
/// own dedupe already makes at most one reload happen even if two windows
/// race and both fire, which the source specification explicitly tolerates.
#[derive(Debug)]
pub struct StaticAssetCoalescer {
    clock: Arc<dyn Clock>,
    quiet_window: Duration,
    pending: Arc<Mutex<Option<CancelToken>>>,
}

impl StaticAssetCoalescer {
    /// Creates a coalescer that waits `quiet_window` after the last
    /// observation before firing.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, quiet_window: Duration) -> Self {
        Self {
            clock,
            quiet_window,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Records one static-asset 404. Schedules (or reschedules) the
    /// coalesced `triggerRetry` call against `orchestrator`.
    pub fn observe(&self, orchestrator: Arc<RetryOrchestrator>) {
        let cancel = CancelToken::new();
        let previous = {
            let mut guard = self.pending.lock();
            let previous = guard.take();
            *guard = Some(cancel.clone());
            previous
        };
        if let Some(previous) = previous {
            previous.cancel();
        }

        let clock = Arc::clone(&self.clock);
        let quiet_window = self.quiet_window;
        let pending = Arc::clone(&self.pending);

        tokio::spawn(async move {
            tokio::select! {
                () = clock.delay(quiet_window) => {
                    *pending.lock() = None;
                    orchestrator.trigger_retry(TriggerRequest::new("static-asset-error").with_cache_bust());
                }
                () = cancel.cancelled() => {}
            }
        });
    }
}
