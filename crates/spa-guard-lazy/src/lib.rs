// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! Retries a failed dynamic import (or any other one-shot fallible async
//! operation standing in for it) with a fixed delay sequence, then hands off
//! to the retry orchestrator once that budget is exhausted.
//!
//! This is a thin wrapper, not a generic retry combinator: it exists to
//! bridge component-level import failures (where the caller wants the
//! *component* to appear, not the whole page to reload) into the same
//! orchestrator that handles boot-time chunk failures. A generic retry
//! combinator lives one layer down, in [`spa_guard_clock::Clock::delay`] plus
//! [`spa_guard_clock::CancelToken`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use spa_guard_clock::{CancelToken, Clock};
use spa_guard_events::{Event, EventBus};
use spa_guard_options::LazyRetryOptions;
use spa_guard_retry::{RetryOrchestrator, TriggerRequest};

/// Why [`retry_import`] did not ultimately resolve with a module.
#[derive(Debug)]
pub enum LazyRetryError<E> {
    /// `signal` was aborted while waiting between attempts. The in-flight
    /// import itself is never cancelled, only the wait before the next one.
    Aborted,
    /// Every attempt failed and `call_reload_on_failure` is `false`; the
    /// final attempt's error is attached so an error boundary can react.
    Exhausted(E),
    /// Every attempt failed and `call_reload_on_failure` is `true`; the retry
    /// orchestrator has been asked to reload the page. In a browser this
    /// future's caller never observes the resolution because navigation ends
    /// the script; in this runtime the future still completes, with this
    /// variant, rather than diverge.
    ReloadTriggered,
}

impl<E: fmt::Display> fmt::Display for LazyRetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted => write!(f, "lazy import aborted"),
            Self::Exhausted(err) => write!(f, "lazy import exhausted retries: {err}"),
            Self::ReloadTriggered => write!(f, "lazy import exhausted retries, reload triggered"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for LazyRetryError<E> {}

/// Retries `import_fn` according to `options.retry_delays`, escalating to
/// `orchestrator` on exhaustion if `options.call_reload_on_failure`.
///
/// `import_fn` is called again on each attempt; a successful call at attempt
/// `k > 0` publishes [`Event::LazyRetrySuccess`]. `signal`, if given,
/// interrupts only the inter-attempt delay - never a call already in flight.
pub async fn retry_import<F, Fut, T, E>(
    mut import_fn: F,
    clock: &Arc<dyn Clock>,
    options: &LazyRetryOptions,
    signal: Option<&CancelToken>,
    events: &EventBus,
    orchestrator: Option<&RetryOrchestrator>,
) -> Result<T, LazyRetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let total_attempts = u32::try_from(options.retry_delays.len()).unwrap_or(u32::MAX);
    let mut attempt: u32 = 0;

    loop {
        match import_fn().await {
            Ok(module) => {
                if attempt > 0 {
                    events.publish(Event::LazyRetrySuccess { attempt });
                }
                return Ok(module);
            }
            Err(err) => {
                if attempt >= total_attempts {
                    let will_reload = options.call_reload_on_failure;
                    events.publish(Event::LazyRetryExhausted { total_attempts, will_reload });

                    if will_reload {
                        if let Some(orchestrator) = orchestrator {
                            orchestrator.trigger_retry(TriggerRequest::new("lazy-import").with_error(err.to_string()));
                        }
                        return Err(LazyRetryError::ReloadTriggered);
                    }
                    return Err(LazyRetryError::Exhausted(err));
                }

                let delay = options.retry_delays[attempt as usize];
                attempt += 1;
                events.publish(Event::LazyRetryAttempt {
                    attempt,
                    delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    total_attempts,
                });

                match signal {
                    Some(signal) => {
                        tokio::select! {
                            () = clock.delay(delay) => {}
                            () = signal.cancelled() => return Err(LazyRetryError::Aborted),
                        }
                    }
                    None => clock.delay(delay).await,
                }
            }
        }
    }
}
