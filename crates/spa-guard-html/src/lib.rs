// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! Language negotiation (§4.I) and marker-attribute HTML patching (§4.H,
//! §4.J) shared by the fallback renderer and the server-side HTML cache.
//!
//! This crate has no knowledge of the retry orchestrator or the cache
//! itself - it is a leaf in the component dependency order (§2) consumed by
//! [`spa_guard_cache`] and by whatever thin, framework-specific wrapper
//! calls [`render_fallback`].

mod dom;
mod fallback;
mod i18n;
mod lang;
mod patch;

pub use dom::{escape_attr, escape_text};
pub use fallback::{FallbackRequest, render_fallback};
pub use i18n::{TranslationRecord, TranslationTable};
pub use lang::match_lang;
pub use patch::patch_html_i18n;
