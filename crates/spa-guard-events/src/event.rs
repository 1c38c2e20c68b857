// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

/// A single SPA Guard lifecycle event.
///
/// This is a closed set matching the source specification's tagged sum: UI
/// code and telemetry subscribers can match on it exhaustively rather than
/// guard against unknown variants.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Event {
    /// A chunk/preload error was observed but the orchestrator did not (or
    /// could not) schedule a retry for it.
    ChunkError {
        /// The rendered error message.
        error: String,
        /// Whether a retry was scheduled as a result of this error.
        is_retrying: bool,
    },

    /// A reload has been scheduled.
    RetryAttempt {
        /// 1-based attempt number about to run.
        attempt: u32,
        /// Delay, in milliseconds, before the reload navigates.
        delay_ms: u64,
        /// The retry session identifier.
        retry_id: String,
    },

    /// The attempt budget has been exhausted; fallback mode is entered.
    RetryExhausted {
        /// The attempt number at which the budget ran out.
        final_attempt: u32,
        /// The retry session identifier.
        retry_id: String,
    },

    /// A stale retry session (from a previous deployment) was discarded.
    RetryReset {
        /// The attempt value recorded in the stale session.
        previous_attempt: u32,
        /// The retry id recorded in the stale session.
        previous_retry_id: String,
        /// Milliseconds since the document's navigation start.
        time_since_reload_ms: u64,
    },

    /// The lazy-import wrapper is about to retry a dynamic import.
    LazyRetryAttempt {
        /// 1-based attempt number about to run.
        attempt: u32,
        /// Delay, in milliseconds, before this attempt.
        delay_ms: u64,
        /// Total number of retries configured.
        total_attempts: u32,
    },

    /// The lazy-import wrapper exhausted its retry budget.
    LazyRetryExhausted {
        /// Total number of retries configured.
        total_attempts: u32,
        /// Whether the orchestrator will now be triggered.
        will_reload: bool,
    },

    /// A lazy import eventually succeeded after one or more retries.
    LazyRetrySuccess {
        /// The attempt number (1-based) that succeeded; never published for
        /// an import that succeeded on the first try.
        attempt: u32,
    },

    /// The fallback UI has been inserted into the page.
    FallbackUiShown,
}
