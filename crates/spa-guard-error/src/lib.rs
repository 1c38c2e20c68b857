// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! Shared error types and diagnostics plumbing for the SPA Guard runtime.
//!
//! Nothing in this crate is ever allowed to cross a public API boundary of the
//! retry orchestrator, the listener layer, or the fallback renderer: internal
//! failures are reported through [`Diagnostics`] instead of propagated to callers.
//! See the module docs on [`spa_guard_retry`](../spa_guard_retry/index.html) for
//! the rationale.

use std::fmt;

/// Errors surfaced by the HTML cache builder and language negotiation.
///
/// These *are* allowed to propagate, since cache construction happens at build
/// time (not on the hot request path) and a misconfiguration should fail loudly.
#[derive(Debug, thiserror::Error)]
pub enum SpaGuardError {
    /// No languages were resolved for a cache build.
    #[error("requires at least one language")]
    NoLanguages,

    /// A language code supplied to the cache builder is not recognized by the
    /// merged translation table and has no user-supplied override.
    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    /// The source HTML could not be parsed well enough to locate `<html>`/`<head>`.
    #[error("malformed HTML: {0}")]
    MalformedHtml(String),

    /// A translation override failed to serialize to JSON for the i18n meta tag.
    #[error("failed to serialize translations: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A single internal event reported to [`Diagnostics`].
///
/// This is intentionally a flat string payload, not a structured error type:
/// diagnostics are a side channel for operators, not part of any contract.
#[derive(Debug, Clone)]
pub struct DiagnosticEvent {
    /// Which component raised the event, e.g. `"retry-orchestrator"`.
    pub component: &'static str,
    /// Human-readable description of what went wrong.
    pub message: String,
}

impl DiagnosticEvent {
    /// Builds a new event from a component name and message.
    pub fn new(component: &'static str, message: impl Into<String>) -> Self {
        Self {
            component,
            message: message.into(),
        }
    }
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.component, self.message)
    }
}

/// A sink for internal failures that must never be allowed to panic or
/// propagate out of the orchestrator, listeners, or renderer.
///
/// Implementations must not unwind; the default [`TracingDiagnostics`]
/// implementation logs through `tracing` and always returns.
pub trait Diagnostics: Send + Sync + fmt::Debug {
    /// Reports an internal event. Must not panic.
    fn report(&self, event: DiagnosticEvent);
}

/// Reports diagnostics through the `tracing` ecosystem at `error` level.
///
/// This is the production default: operators wire their usual `tracing`
/// subscriber and these events show up alongside the rest of the app's logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, event: DiagnosticEvent) {
        tracing::error!(component = event.component, message = %event.message, "spa-guard internal error");
    }
}

/// Discards every event. Useful in tests that want to assert on the absence
/// of other side effects without a `tracing` subscriber installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn report(&self, _event: DiagnosticEvent) {}
}
