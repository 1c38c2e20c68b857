// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

/// Input to [`crate::RetryOrchestrator::trigger_retry`].
#[derive(Debug, Clone)]
pub struct TriggerRequest {
    /// Where the trigger originated, e.g. `"chunk-error"`, `"static-asset-error"`,
    /// `"lazy-import"`. Carried into the snapshot for UI/diagnostics.
    pub source: String,
    /// The rendered error message that caused this trigger, if any.
    pub error: Option<String>,
    /// Whether the reload URL should carry a cache-busting timestamp.
    pub cache_bust: bool,
}

impl TriggerRequest {
    /// Builds a request from just a source string, with no error and no
    /// cache-busting - the common case for most callers.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            error: None,
            cache_bust: false,
        }
    }

    /// Attaches an error message.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Requests a cache-busting query parameter on the reload URL.
    #[must_use]
    pub fn with_cache_bust(mut self) -> Self {
        self.cache_bust = true;
        self
    }
}

/// Why a trigger was deduplicated (ignored) instead of scheduling a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupeReason {
    /// A reload is already scheduled; at most one timer exists at a time (P1).
    AlreadyScheduled,
    /// An internal error occurred while processing the trigger. Never
    /// propagated to the caller; reported to diagnostics instead (§7).
    InternalError,
}

/// The outcome of a [`crate::RetryOrchestrator::trigger_retry`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerResult {
    /// A reload has been scheduled.
    Accepted,
    /// The trigger was ignored; see [`DedupeReason`] for why.
    Deduped(DedupeReason),
    /// The orchestrator is already in (or has just entered) fallback mode.
    Fallback,
    /// The user has disabled automatic retry; no reload will be scheduled.
    RetryDisabled,
}
