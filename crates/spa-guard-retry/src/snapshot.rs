// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

use std::time::Duration;

/// The orchestrator's phase. See the crate docs for the transition diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No retry in flight; the page is showing normally.
    Idle,
    /// A reload has been scheduled and is waiting for its delay to elapse.
    Scheduled,
    /// The attempt budget is exhausted; the fallback UI is shown.
    Fallback,
}

/// A read-only copy of the orchestrator's state at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrySnapshot {
    /// The current phase.
    pub phase: Phase,
    /// Attempts consumed so far. Always `0` while `phase == Phase::Idle` (I1)
    /// and never exceeds the configured attempt budget (I3).
    pub attempt: u32,
    /// The current retry session id, once one has been minted.
    pub retry_id: Option<String>,
    /// The `source` string passed to the most recent `triggerRetry` call.
    pub last_source: Option<String>,
    /// How long, in milliseconds, this orchestrator has existed since the
    /// most recent trigger, for UI that wants to show elapsed time.
    pub last_trigger_time: Option<Duration>,
}
