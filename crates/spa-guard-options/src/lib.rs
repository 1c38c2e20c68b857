// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! Process-wide configuration surface, written once at boot.
//!
//! [`Options`] is analogous to [`seatbelt::SeatbeltOptions`] in spirit - a
//! single record threaded through every resilience component - except it is a
//! genuine process-wide singleton rather than something passed explicitly to
//! each layer, because the runtime this crate supports is wired up by a
//! trusted bundler-injected boot script with no natural place to thread
//! function arguments through. [`init`] is called exactly once by that boot
//! script; every other component only ever calls [`get`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use spa_guard_classifier::Pattern;

/// Options controlling the lazy-import retry wrapper.
#[derive(Debug, Clone)]
pub struct LazyRetryOptions {
    /// Ordered delays, in order, before each successive retry of a dynamic import.
    pub retry_delays: Vec<Duration>,
    /// Whether exhausting `retry_delays` should hand off to the retry orchestrator.
    pub call_reload_on_failure: bool,
}

impl Default for LazyRetryOptions {
    fn default() -> Self {
        Self {
            retry_delays: vec![Duration::from_millis(1000), Duration::from_millis(2000)],
            call_reload_on_failure: true,
        }
    }
}

/// Options controlling the fallback renderer's HTML content.
#[derive(Debug, Clone, Default)]
pub struct HtmlOptions {
    /// Custom error-template HTML; falls back to the built-in template if unset.
    pub fallback_content: Option<String>,
    /// Custom loading-template HTML; falls back to the built-in template if unset.
    pub loading_content: Option<String>,
    /// Spinner markup injected into `[data-spa-guard-spinner]`.
    pub spinner_content: Option<String>,
    /// Spinner background color/style.
    pub spinner_background: Option<String>,
    /// Disables spinner injection entirely when `true`.
    pub spinner_disabled: bool,
}

/// Options controlling error classification overrides.
#[derive(Debug, Clone, Default)]
pub struct ErrorsOptions {
    /// Messages matching any of these patterns are suppressed from telemetry
    /// (the user's `onError` callback still runs).
    pub ignore: Vec<Pattern>,
    /// Messages matching any of these patterns are treated as retryable even
    /// though [`spa_guard_classifier::is_chunk_error`] would say otherwise.
    pub force_retry: Vec<Pattern>,
}

/// The full process-wide options record. See module docs for lifecycle.
#[derive(Debug, Clone)]
pub struct Options {
    /// Opaque build/deploy version, compared for exact equality when polling
    /// for a new deployment. Unset means version polling is disabled.
    pub version: Option<String>,
    /// Ordered reload delays; `reload_delays.len()` is the attempt budget.
    pub reload_delays: Vec<Duration>,
    /// Minimum time since navigation start before a URL-carried attempt count
    /// is considered stale rather than a continuation.
    pub min_time_between_resets: Duration,
    /// Lazy-import retry configuration.
    pub lazy_retry: LazyRetryOptions,
    /// Whether to mint and persist a retry id across reloads.
    pub use_retry_id: bool,
    /// Fallback-renderer HTML overrides.
    pub html: HtmlOptions,
    /// Error classification overrides.
    pub errors: ErrorsOptions,
    /// Automatically call `triggerRetry` for recognized chunk/force-retry
    /// errors observed by the global listeners, rather than only publishing
    /// `chunk-error` for UI reactivity.
    pub auto_retry_chunk_errors: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            version: None,
            reload_delays: vec![Duration::ZERO, Duration::from_millis(1000), Duration::from_millis(3000)],
            min_time_between_resets: Duration::from_millis(5000),
            lazy_retry: LazyRetryOptions::default(),
            use_retry_id: true,
            html: HtmlOptions::default(),
            errors: ErrorsOptions::default(),
            auto_retry_chunk_errors: true,
        }
    }
}

static REGISTRY: RwLock<Option<Arc<Options>>> = RwLock::new(None);

/// Writes the process-wide options. Intended to be called exactly once, by
/// the trusted boot-time injector, before any other component reads options.
///
/// Calling this again replaces the previous value; nothing in this crate
/// prevents a second call, but no component other than the injector (and
/// tests) should ever make one.
pub fn init(options: Options) {
    *REGISTRY.write() = Some(Arc::new(options));
}

/// Reads the process-wide options, lazily initializing them to
/// [`Options::default`] if [`init`] was never called.
#[must_use]
pub fn get() -> Arc<Options> {
    if let Some(options) = REGISTRY.read().clone() {
        return options;
    }
    let mut registry = REGISTRY.write();
    registry.get_or_insert_with(|| Arc::new(Options::default())).clone()
}

/// Clears the process-wide options so the next [`get`] call re-initializes
/// lazily (or the test can call [`init`] again). Production code must never
/// call this.
pub fn reset_for_tests() {
    *REGISTRY.write() = None;
}
