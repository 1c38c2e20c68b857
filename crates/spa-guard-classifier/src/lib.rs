// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! String/shape-based recognition of chunk, preload, and dynamic-import failures.
//!
//! Unlike [`recoverable::Recover`], which asks a typed error to self-report its
//! recoverability, the runtime here receives errors from arbitrary sources -
//! `window.onerror`, unhandled rejections, a router's error boundary - where the
//! only reliable signal is the error's rendered message. [`is_chunk_error`]
//! walks the `std::error::Error::source` chain the same way the source
//! specification walks a JavaScript `error.reason` chain, and matches against a
//! closed set of known bundler/browser failure strings.

use std::error::Error as StdError;
use std::fmt;

use regex::RegexBuilder;

/// Patterns recognized as chunk-load failures, matched case-insensitively.
///
/// Kept private and closed: these are not configurable because they encode
/// known failure strings from specific bundlers and browsers, not application
/// policy. Application policy lives in [`Pattern`] / [`shouldForceRetry`] /
/// `errors.ignore` instead.
const CHUNK_ERROR_PATTERNS: &[&str] = &[
    "failed to fetch dynamically imported module",
    "importing a module script failed",
    "error loading dynamically imported module",
    "unable to preload css",
    r"loading chunk \d+ failed",
    r"loading css chunk \d+ failed",
    "chunkloaderror",
];

/// Sentinel prefix that lets application code deliberately request a retry by
/// throwing (or, in Rust, constructing and returning/logging) a
/// [`ForceRetryError`], bypassing the heuristic classifier entirely.
pub const FORCE_RETRY_SENTINEL: &str = "__SPA_GUARD_FORCE_RETRY__";

/// An error application code can raise to force the orchestrator to treat it
/// as retryable, regardless of its actual message.
#[derive(Debug, Clone)]
pub struct ForceRetryError {
    reason: String,
}

impl ForceRetryError {
    /// Creates a force-retry sentinel carrying `reason` for diagnostics.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl fmt::Display for ForceRetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{FORCE_RETRY_SENTINEL}: {}", self.reason)
    }
}

impl StdError for ForceRetryError {}

/// Extracts the effective message for a value, walking its `source()` chain
/// the way the browser-side classifier walks `error.reason` chains, and
/// falling back to `to_string()` for the outermost error if no deeper source
/// carries a message.
///
/// Exposed so callers that need to run [`should_force_retry`] or
/// [`should_ignore_message`] against the same message [`is_chunk_error`] used
/// don't have to re-walk the chain themselves.
#[must_use]
pub fn effective_message(err: &(dyn StdError + 'static)) -> String {
    let mut current: &(dyn StdError + 'static) = err;
    loop {
        match current.source() {
            Some(source) => current = source,
            None => return current.to_string(),
        }
    }
}

/// Returns `true` if `message` matches one of the closed set of known
/// chunk/preload/import failure strings, case-insensitively.
///
/// Returns `false` for an empty message and for messages that describe a
/// generic network failure (e.g. `"TypeError: Failed to fetch"`) rather than
/// a chunk-specific one - that distinction matters because generic network
/// errors are not necessarily caused by a stale deployment.
#[must_use]
pub fn is_chunk_error_message(message: &str) -> bool {
    if message.trim().is_empty() {
        return false;
    }
    CHUNK_ERROR_PATTERNS.iter().any(|pattern| {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .is_ok_and(|re| re.is_match(message))
    })
}

/// Returns `true` if `err` (or anything in its `source()` chain) looks like a
/// chunk/preload/dynamic-import failure.
///
/// # Examples
///
/// ```
/// use spa_guard_classifier::is_chunk_error;
///
/// #[derive(Debug)]
/// struct Generic(&'static str);
/// impl std::fmt::Display for Generic {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "{}", self.0)
///     }
/// }
/// impl std::error::Error for Generic {}
///
/// assert!(!is_chunk_error(&Generic("TypeError: Failed to fetch")));
/// assert!(is_chunk_error(&Generic("ChunkLoadError")));
/// ```
#[must_use]
pub fn is_chunk_error(err: &(dyn StdError + 'static)) -> bool {
    is_chunk_error_message(&effective_message(err))
}

/// A single configured override pattern: either a plain substring or a
/// regular expression, matched case-insensitively against an error message.
///
/// Corresponds to entries in `errors.ignore` / `errors.forceRetry`.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Matches if the message contains this substring, case-insensitively.
    Substring(String),
    /// Matches if the message matches this regular expression.
    Regex(regex::Regex),
}

impl Pattern {
    /// Builds a substring pattern.
    #[must_use]
    pub fn substring(value: impl Into<String>) -> Self {
        Self::Substring(value.into())
    }

    /// Builds a regex pattern. Returns an error if `pattern` does not compile.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::Regex(RegexBuilder::new(pattern).case_insensitive(true).build()?))
    }

    fn matches(&self, message: &str) -> bool {
        match self {
            Self::Substring(needle) => message.to_lowercase().contains(&needle.to_lowercase()),
            Self::Regex(re) => re.is_match(message),
        }
    }
}

/// Returns `true` if `message` matches any of `patterns`.
#[must_use]
pub fn matches_any(message: &str, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|pattern| pattern.matches(message))
}

/// Implements `shouldForceRetry`: `true` if `message` carries the
/// [`FORCE_RETRY_SENTINEL`] prefix, or matches one of the configured
/// `errors.forceRetry` patterns.
#[must_use]
pub fn should_force_retry(message: &str, force_retry_patterns: &[Pattern]) -> bool {
    message.starts_with(FORCE_RETRY_SENTINEL) || matches_any(message, force_retry_patterns)
}

/// Implements `shouldIgnoreMessages`: `true` if `message` matches one of the
/// configured `errors.ignore` patterns.
#[must_use]
pub fn should_ignore_message(message: &str, ignore_patterns: &[Pattern]) -> bool {
    matches_any(message, ignore_patterns)
}
