// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use spa_guard_clock::{CancelToken, Clock, RealClock, Tick};
use spa_guard_error::{DiagnosticEvent, Diagnostics, TracingDiagnostics};
use spa_guard_events::{Event, EventBus};
use spa_guard_options::Options;
use uuid::Uuid;

use crate::page::PageEnvironment;
use crate::result::{DedupeReason, TriggerRequest, TriggerResult};
use crate::snapshot::{Phase, RetrySnapshot};
use crate::state::State;

/// The single-owner phase machine that schedules bounded, deduplicated page
/// reloads in response to chunk-load failures.
///
/// An orchestrator owns exactly one [`State`] behind a [`parking_lot::Mutex`];
/// every public method takes the lock briefly, computes what changed, drops
/// the lock, and only then publishes events or spawns the reload timer - a
/// subscriber that calls back into `trigger_retry` from inside an event
/// handler must never deadlock against the very call that published the
/// event it is handling.
#[derive(Debug)]
pub struct RetryOrchestrator {
    state: Arc<Mutex<State>>,
    clock: Arc<dyn Clock>,
    page: Arc<dyn PageEnvironment>,
    events: EventBus,
    diagnostics: Arc<dyn Diagnostics>,
    options: Arc<Options>,
    created_at: Tick,
}

/// What a locked, computed step of [`RetryOrchestrator::trigger_retry`] needs
/// to do once the lock has been released.
enum Outcome {
    Fallback,
    Deduped,
    Scheduled {
        delay: Duration,
        next_attempt: u32,
        retry_id: String,
        cache_bust: bool,
        cancel: CancelToken,
    },
}

impl RetryOrchestrator {
    /// Builds an orchestrator from explicit collaborators. Prefer
    /// [`Self::new`] in production code; this constructor exists so tests can
    /// supply [`spa_guard_clock::FakeClock`] and
    /// [`crate::page::FakePage`] directly.
    #[must_use]
    pub fn with_collaborators(
        clock: Arc<dyn Clock>,
        page: Arc<dyn PageEnvironment>,
        events: EventBus,
        diagnostics: Arc<dyn Diagnostics>,
        options: Arc<Options>,
    ) -> Self {
        let created_at = clock.now();
        Self {
            state: Arc::new(Mutex::new(State::fresh())),
            clock,
            page,
            events,
            diagnostics,
            options,
            created_at,
        }
    }

    /// Builds a production orchestrator backed by [`RealClock`], the
    /// process-wide [`spa_guard_options::get`] options, and
    /// [`TracingDiagnostics`].
    #[must_use]
    pub fn new(page: Arc<dyn PageEnvironment>, events: EventBus) -> Self {
        Self::with_collaborators(
            Arc::new(RealClock::new()),
            page,
            events,
            Arc::new(TracingDiagnostics),
            spa_guard_options::get(),
        )
    }

    /// Requests a retry. See the crate docs for the full phase diagram.
    ///
    /// This never panics and never blocks on I/O: a panic anywhere in the
    /// locked section is caught, reported to [`Diagnostics`], and turned into
    /// [`TriggerResult::Deduped`] with [`DedupeReason::InternalError`] (§7 -
    /// internal failures never propagate to callers).
    pub fn trigger_retry(&self, request: TriggerRequest) -> TriggerResult {
        match catch_unwind(AssertUnwindSafe(|| self.trigger_retry_inner(&request))) {
            Ok(result) => result,
            Err(panic) => {
                self.diagnostics.report(DiagnosticEvent::new(
                    "retry-orchestrator",
                    format!("panic during trigger_retry: {}", panic_message(&panic)),
                ));
                TriggerResult::Deduped(DedupeReason::InternalError)
            }
        }
    }

    fn trigger_retry_inner(&self, request: &TriggerRequest) -> TriggerResult {
        let mut guard = self.state.lock();
        if !guard.enabled {
            return TriggerResult::RetryDisabled;
        }

        let mut pending = Vec::with_capacity(2);
        if !guard.booted {
            if let Some(reset_event) = self.boot_from_url(&mut guard) {
                pending.push(reset_event);
            }
            guard.booted = true;
        }

        guard.last_source = Some(request.source.clone());
        guard.last_trigger_time = Some(self.clock.now());

        let outcome = match guard.phase {
            Phase::Fallback => Outcome::Fallback,
            Phase::Scheduled => Outcome::Deduped,
            Phase::Idle => {
                let budget = self.options.reload_delays.len() as u32;
                if guard.attempt >= budget {
                    guard.phase = Phase::Fallback;
                    pending.push(Event::RetryExhausted {
                        final_attempt: guard.attempt,
                        retry_id: guard.retry_id.clone().unwrap_or_default(),
                    });
                    pending.push(Event::FallbackUiShown);
                    Outcome::Fallback
                } else {
                    let next_attempt = guard.attempt + 1;
                    let delay = self.options.reload_delays[guard.attempt as usize];
                    let retry_id = guard.retry_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
                    let cancel = CancelToken::new();

                    guard.retry_id = Some(retry_id.clone());
                    guard.phase = Phase::Scheduled;
                    guard.attempt = next_attempt;
                    guard.cancel = Some(cancel.clone());

                    pending.push(Event::RetryAttempt {
                        attempt: next_attempt,
                        delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        retry_id: retry_id.clone(),
                    });

                    Outcome::Scheduled {
                        delay,
                        next_attempt,
                        retry_id,
                        cache_bust: request.cache_bust,
                        cancel,
                    }
                }
            }
        };

        drop(guard);
        for event in pending {
            self.events.publish(event);
        }

        match outcome {
            Outcome::Fallback => TriggerResult::Fallback,
            Outcome::Deduped => TriggerResult::Deduped(DedupeReason::AlreadyScheduled),
            Outcome::Scheduled {
                delay,
                next_attempt,
                retry_id,
                cache_bust,
                cancel,
            } => {
                self.spawn_reload_timer(delay, next_attempt, retry_id, cache_bust, cancel);
                TriggerResult::Accepted
            }
        }
    }

    /// Decodes retry state carried in the page's URL on the first call after
    /// construction, distinguishing a continuation of this orchestrator's own
    /// reload from a stale session left over from a previous deployment (S2).
    ///
    /// Returns the [`Event::RetryReset`] to publish, if the recorded session
    /// was judged stale, so the caller can publish it after releasing the lock.
    fn boot_from_url(&self, guard: &mut State) -> Option<Event> {
        let url_state = spa_guard_url::decode(&self.page.current_url());
        if url_state.attempt.is_none() && url_state.retry_id.is_none() {
            return None;
        }

        let age = self.page.time_since_navigation_start();
        if age > self.options.min_time_between_resets {
            let previous_attempt = url_state.attempt.unwrap_or(0);
            let previous_retry_id = url_state.retry_id.unwrap_or_default();
            Some(Event::RetryReset {
                previous_attempt,
                previous_retry_id,
                time_since_reload_ms: u64::try_from(age.as_millis()).unwrap_or(u64::MAX),
            })
        } else {
            guard.attempt = url_state.attempt.unwrap_or(0);
            guard.retry_id = url_state.retry_id;
            None
        }
    }

    fn spawn_reload_timer(&self, delay: Duration, next_attempt: u32, retry_id: String, cache_bust: bool, cancel: CancelToken) {
        let clock = Arc::clone(&self.clock);
        let page = Arc::clone(&self.page);
        let use_retry_id = self.options.use_retry_id;

        tokio::spawn(async move {
            tokio::select! {
                () = clock.delay(delay) => {
                    let current = page.current_url();
                    let cache_bust_value = cache_bust.then(unix_millis);
                    let retry_id_param = use_retry_id.then_some(retry_id.as_str());
                    let target = spa_guard_url::encode(&current, next_attempt, retry_id_param, cache_bust_value);
                    page.navigate(&target);
                }
                () = cancel.cancelled() => {}
            }
        });
    }

    /// Records that the current boot is healthy: cancels any pending timer,
    /// returns the phase machine to idle with a clean attempt counter, and
    /// scrubs the retry query parameters from the address bar without
    /// reloading (S1 - a successful load must not carry stale retry state
    /// forward into the next failure).
    pub fn mark_retry_healthy_boot(&self) {
        let mut guard = self.state.lock();
        if let Some(cancel) = guard.cancel.take() {
            cancel.cancel();
        }
        guard.phase = Phase::Idle;
        guard.attempt = 0;
        guard.retry_id = None;
        drop(guard);

        let cleared = spa_guard_url::clear(&self.page.current_url());
        self.page.replace_url(&cleared);
    }

    /// Returns a point-in-time copy of the orchestrator's state.
    #[must_use]
    pub fn get_retry_snapshot(&self) -> RetrySnapshot {
        let guard = self.state.lock();
        RetrySnapshot {
            phase: guard.phase,
            attempt: guard.attempt,
            retry_id: guard.retry_id.clone(),
            last_source: guard.last_source.clone(),
            last_trigger_time: guard.last_trigger_time.map(|tick| tick.since(self.created_at)),
        }
    }

    /// Disables automatic retries; every subsequent [`Self::trigger_retry`]
    /// call returns [`TriggerResult::RetryDisabled`] until [`Self::enable`] is
    /// called. A manual kill switch for operators who need to stop reload
    /// storms without a redeploy.
    pub fn disable(&self) {
        self.state.lock().enabled = false;
    }

    /// Re-enables automatic retries after [`Self::disable`].
    pub fn enable(&self) {
        self.state.lock().enabled = true;
    }

    /// Resets this orchestrator to a freshly-constructed state. Production
    /// code must never call this; it exists for test isolation between cases
    /// that share one orchestrator instance.
    pub fn reset_retry_orchestrator_for_tests(&self) {
        let mut guard = self.state.lock();
        if let Some(cancel) = guard.cancel.take() {
            cancel.cancel();
        }
        *guard = State::fresh();
    }
}

#[cfg(test)]
impl RetryOrchestrator {
    /// Forces the phase back to idle without touching the attempt counter,
    /// simulating a reload having landed and failed again immediately.
    pub(crate) fn force_phase_idle_for_tests(&self) {
        self.state.lock().phase = Phase::Idle;
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
