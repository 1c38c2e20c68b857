// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

use spa_guard_clock::{CancelToken, Tick};

use crate::snapshot::Phase;

/// The orchestrator's mutable state, guarded by a single lock (P1: at most
/// one phase machine per orchestrator instance, no two timers in flight).
#[derive(Debug)]
pub(crate) struct State {
    pub(crate) phase: Phase,
    pub(crate) attempt: u32,
    pub(crate) retry_id: Option<String>,
    pub(crate) last_source: Option<String>,
    pub(crate) last_trigger_time: Option<Tick>,
    pub(crate) booted: bool,
    pub(crate) enabled: bool,
    pub(crate) cancel: Option<CancelToken>,
}

impl State {
    pub(crate) fn fresh() -> Self {
        Self {
            phase: Phase::Idle,
            attempt: 0,
            retry_id: None,
            last_source: None,
            last_trigger_time: None,
            booted: false,
            enabled: true,
            cancel: None,
        }
    }
}
