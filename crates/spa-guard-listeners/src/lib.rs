// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! Wires error, rejection, preload-error, and static-asset 404 signals into
//! the retry orchestrator.
//!
//! This crate is a thin adapter, not a second place that decides retry
//! policy: every `handle_*` method here either calls
//! [`spa_guard_retry::RetryOrchestrator::trigger_retry`] or publishes an
//! event - it never touches orchestrator state directly ("the retry
//! ownership rule", §4.G).

mod beacon;
mod coalesce;

use std::sync::Arc;
use std::time::Duration;

use spa_guard_classifier::Pattern;
use spa_guard_clock::Clock;
use spa_guard_events::{Event, EventBus};
use spa_guard_options::Options;
use spa_guard_retry::{RetryOrchestrator, TriggerRequest};

pub use beacon::{BeaconPayload, BeaconSink, NullBeaconSink, RecordingBeaconSink};
pub use coalesce::StaticAssetCoalescer;

const STATIC_ASSET_QUIET_WINDOW: Duration = Duration::from_millis(500);

/// Which global signal produced an [`ErrorReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSource {
    /// `window.onerror`.
    WindowError,
    /// An unhandled promise rejection.
    UnhandledRejection,
    /// A framework-specific `preloadError`-style event.
    PreloadError,
}

impl ErrorSource {
    fn as_str(self) -> &'static str {
        match self {
            Self::WindowError => "window-error",
            Self::UnhandledRejection => "unhandled-rejection",
            Self::PreloadError => "preload-error",
        }
    }
}

/// A serialized view of an observed error, handed to the user's `onError`
/// callback. Flat by construction - unlike the source specification's
/// depth-bounded walk of an arbitrary JS value, a Rust `&dyn Error` only ever
/// yields a message and a `source()` chain, so there is no nested structure
/// left to bound.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    /// Which listener observed this error.
    pub source: ErrorSource,
    /// The effective message, after walking the `source()` chain (§4.A).
    pub message: String,
}

/// User-supplied callback invoked for every observed error, regardless of
/// whether it was ignored, classified as recoverable, or routed to fallback.
pub type OnErrorCallback = Arc<dyn Fn(&ErrorReport) + Send + Sync>;

/// Wires the global error/rejection/preload/resource signals to the
/// orchestrator, following the processing pipeline in §4.G.
pub struct GlobalListeners {
    options: Arc<Options>,
    events: EventBus,
    orchestrator: Arc<RetryOrchestrator>,
    beacon: Arc<dyn BeaconSink>,
    coalescer: StaticAssetCoalescer,
    on_error: Option<OnErrorCallback>,
}

impl std::fmt::Debug for GlobalListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalListeners")
            .field("options", &self.options)
            .field("has_on_error", &self.on_error.is_some())
            .finish()
    }
}

impl GlobalListeners {
    /// Builds the listener adapter. `clock` backs the static-asset 404
    /// coalescing window; in production this is the same clock the
    /// orchestrator uses.
    #[must_use]
    pub fn new(
        options: Arc<Options>,
        events: EventBus,
        orchestrator: Arc<RetryOrchestrator>,
        beacon: Arc<dyn BeaconSink>,
        clock: Arc<dyn Clock>,
        on_error: Option<OnErrorCallback>,
    ) -> Self {
        Self {
            options,
            events,
            orchestrator,
            beacon,
            coalescer: StaticAssetCoalescer::new(clock, STATIC_ASSET_QUIET_WINDOW),
            on_error,
        }
    }

    /// Handles one observation from the unhandled-error, unhandled-rejection,
    /// or preload-error hook.
    pub fn handle_error(&self, source: ErrorSource, err: &(dyn std::error::Error + 'static)) {
        let message = spa_guard_classifier::effective_message(err);
        let report = ErrorReport { source, message: message.clone() };

        if spa_guard_classifier::should_ignore_message(&message, &self.options.errors.ignore) {
            self.notify_on_error(&report);
            return;
        }
        self.notify_on_error(&report);

        let is_chunk = spa_guard_classifier::is_chunk_error_message(&message);
        let is_force_retry = spa_guard_classifier::should_force_retry(&message, &self.options.errors.force_retry);

        if (is_chunk || is_force_retry) && self.options.auto_retry_chunk_errors {
            self.orchestrator
                .trigger_retry(TriggerRequest::new(source.as_str()).with_error(message));
        } else {
            self.events.publish(Event::ChunkError {
                error: message.clone(),
                is_retrying: false,
            });
            self.beacon.send(&BeaconPayload {
                error_message: Some(message),
                event_name: Some(source.as_str().to_string()),
                ..BeaconPayload::default()
            });
        }
    }

    /// Handles one static-asset HTTP 404 observation from the
    /// `ResourceTiming`-based observer.
    pub fn handle_static_asset_404(&self) {
        self.coalescer.observe(Arc::clone(&self.orchestrator));
    }

    fn notify_on_error(&self, report: &ErrorReport) {
        if let Some(on_error) = &self.on_error {
            (on_error)(report);
        }
    }
}

/// Returns `true` if `message` matches any of the configured `errors.ignore`
/// patterns. Re-exported at crate root for callers that only need the
/// predicate (e.g. the framework-specific error-boundary wrapper).
#[must_use]
pub fn should_ignore(message: &str, ignore: &[Pattern]) -> bool {
    spa_guard_classifier::should_ignore_message(message, ignore)
}
