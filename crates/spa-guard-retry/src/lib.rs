// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! The retry orchestrator: a single-owner phase machine that schedules
//! bounded, deduplicated page reloads in response to chunk-load failures.
//!
//! ```text
//!                 trigger_retry (budget remaining)
//!        ┌──────────────────────────────────────┐
//!        │                                      ▼
//!   ┌────┴────┐   trigger_retry (budget exhausted)   ┌──────────┐
//!   │  Idle   │ ───────────────────────────────────▶ │ Fallback │
//!   └────┬────┘                                       └──────────┘
//!        │ ▲
//!        │ │ timer fires -> navigate (process ends here)
//!        ▼ │
//!  ┌────────────┐
//!  │ Scheduled  │ ── trigger_retry (deduped) ──▶ Scheduled
//!  └────────────┘
//! ```
//!
//! [`RetryOrchestrator`] is deliberately not a generic state-machine library:
//! it hardcodes the four states and five operations this one use case needs,
//! the same way [`spa_guard_clock`] hardcodes a clock seam rather than
//! generalizing to arbitrary time sources. Internal failures (a poisoned
//! lock, a panicking event subscriber) are caught and reported through
//! [`spa_guard_error::Diagnostics`] rather than propagated - see the crate's
//! error-handling notes in `spa-guard-error`.
//!
//! # Invariants
//!
//! - **P1** - at most one reload timer is ever in flight per orchestrator.
//! - **P2** - `attempt` is non-decreasing while not idle, and is only ever
//!   reset to zero by [`RetryOrchestrator::mark_retry_healthy_boot`] or
//!   [`RetryOrchestrator::reset_retry_orchestrator_for_tests`].
//! - **P3** - `attempt` never exceeds the configured attempt budget
//!   (`reload_delays.len()`).
//! - **P4** - once `Phase::Fallback` is entered, it is terminal for the life
//!   of the orchestrator; only a fresh page load (hence a fresh instance)
//!   leaves it.
//! - **P5** - a disabled orchestrator ([`RetryOrchestrator::disable`]) never
//!   schedules a timer, regardless of phase or attempt budget.

mod orchestrator;
mod page;
mod result;
mod snapshot;
mod state;

pub use orchestrator::RetryOrchestrator;
pub use page::{FakePage, PageEnvironment};
pub use result::{DedupeReason, TriggerRequest, TriggerResult};
pub use snapshot::{Phase, RetrySnapshot};
