// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! A client-side resilience runtime for single-page applications whose
//! compiled asset bundles change across deployments (§1).
//!
//! This crate wires together the leaf components (error classification,
//! the event bus, the options registry, URL-state codec), the retry
//! orchestrator and its lazy-import/global-listener consumers, and the
//! server-side HTML cache, into one process-wide [`Runtime`] - the "gated
//! singleton" strategy described in §9's design notes ("each exposes exactly
//! one public accessor module with init/reset operations").
//!
//! Individual sub-crates (`spa_guard_retry`, `spa_guard_cache`, ...) remain
//! independently usable and independently testable; this crate only adds the
//! one piece none of them can own alone - the production wiring between
//! them, gated behind [`init`]/[`runtime`].

use std::sync::Arc;

use parking_lot::RwLock;
use spa_guard_clock::RealClock;
use spa_guard_error::TracingDiagnostics;
use spa_guard_events::EventBus;
use spa_guard_listeners::{BeaconSink, GlobalListeners, NullBeaconSink, OnErrorCallback};
use spa_guard_options::Options;
use spa_guard_retry::{PageEnvironment, RetryOrchestrator};

pub use spa_guard_cache::{CacheBuildRequest, CacheRequest, CacheResponse, Encodings, HtmlCache, HtmlCacheEntry};
pub use spa_guard_classifier::{ForceRetryError, Pattern, effective_message, is_chunk_error, should_force_retry, should_ignore_message};
pub use spa_guard_error::{Diagnostics, DiagnosticEvent, SpaGuardError};
pub use spa_guard_events::Event;
pub use spa_guard_html::{FallbackRequest, TranslationRecord, TranslationTable, match_lang, patch_html_i18n, render_fallback};
pub use spa_guard_lazy::{LazyRetryError, retry_import};
pub use spa_guard_listeners::ErrorSource;
pub use spa_guard_options::{ErrorsOptions, HtmlOptions, LazyRetryOptions};
pub use spa_guard_retry::{DedupeReason, FakePage, Phase, RetrySnapshot, TriggerRequest, TriggerResult};

/// Every process-wide collaborator, wired together once at boot.
///
/// Unlike [`spa_guard_options::Options`] (a plain data record), the
/// orchestrator and listeners genuinely need a live [`PageEnvironment`]
/// supplied by the host (the bundler-injected boot script is out of scope
/// here per §1's Non-goals), so this registry cannot lazily default the way
/// the options registry does - call [`init`] once before [`runtime`].
#[derive(Debug)]
pub struct Runtime {
    pub options: Arc<Options>,
    pub events: EventBus,
    pub orchestrator: Arc<RetryOrchestrator>,
    pub listeners: Arc<GlobalListeners>,
}

static REGISTRY: RwLock<Option<Arc<Runtime>>> = RwLock::new(None);

/// Boots the process-wide runtime: writes `options` to the
/// [`spa_guard_options`] registry, then constructs the event bus, the
/// production (`RealClock`-backed) retry orchestrator, and the global
/// listener adapter around `page`.
///
/// Intended to be called exactly once, by the trusted boot-time injector
/// (§6 "Runtime options injection"). Calling it again replaces the previous
/// runtime.
pub fn init(page: Arc<dyn PageEnvironment>, options: Options, beacon: Arc<dyn BeaconSink>, on_error: Option<OnErrorCallback>) -> Arc<Runtime> {
    spa_guard_options::init(options);
    let options = spa_guard_options::get();
    let events = EventBus::new(Arc::new(TracingDiagnostics));
    let orchestrator = Arc::new(RetryOrchestrator::new(page, events.clone()));
    let listeners = Arc::new(GlobalListeners::new(
        Arc::clone(&options),
        events.clone(),
        Arc::clone(&orchestrator),
        beacon,
        Arc::new(RealClock::new()),
        on_error,
    ));
    let runtime = Arc::new(Runtime { options, events, orchestrator, listeners });
    *REGISTRY.write() = Some(Arc::clone(&runtime));
    runtime
}

/// Boots the runtime with a [`NullBeaconSink`] and no `onError` callback -
/// the common case for embedders that only care about the retry/fallback
/// behavior and wire telemetry separately.
pub fn init_with_defaults(page: Arc<dyn PageEnvironment>, options: Options) -> Arc<Runtime> {
    init(page, options, Arc::new(NullBeaconSink), None)
}

/// Reads the process-wide runtime.
///
/// # Panics
///
/// Panics if [`init`]/[`init_with_defaults`] has never been called. Unlike
/// [`spa_guard_options::get`], there is no sensible default to lazily
/// construct here - a [`PageEnvironment`] can only come from the host.
#[must_use]
pub fn runtime() -> Arc<Runtime> {
    REGISTRY
        .read()
        .clone()
        .expect("spa_guard::init must be called once before spa_guard::runtime")
}

/// Clears the process-wide runtime so the next [`init`] call starts clean.
/// Production code must never call this.
pub fn reset_for_tests() {
    spa_guard_options::reset_for_tests();
    *REGISTRY.write() = None;
}
