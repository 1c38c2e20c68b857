// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! Server-side HTML cache (§4.J, §4.K): precomputes language-specific
//! variants of the SPA shell HTML, compresses each variant in three
//! encodings, and serves them with content-negotiation and conditional-
//! request handling.
//!
//! This crate depends on [`spa_guard_html`] for language negotiation and the
//! shared i18n patcher, per the component dependency order (§2: "J depends
//! on I and on the DOM patcher used by H").

mod builder;
mod serve;

pub use builder::{CacheBuildRequest, Encodings, HtmlCache, HtmlCacheEntry};
pub use serve::{CacheRequest, CacheResponse};
