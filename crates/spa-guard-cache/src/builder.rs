// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! The HTML cache builder (§4.J): precomputes a patched, compressed variant
//! of the SPA shell for every requested language.

use std::collections::BTreeMap;
use std::io::Write;

use regex::Regex;
use sha2::{Digest, Sha256};
use spa_guard_error::SpaGuardError;
use spa_guard_html::{TranslationRecord, TranslationTable, patch_html_i18n};

/// Input to [`HtmlCache::build`].
#[derive(Debug, Clone)]
pub struct CacheBuildRequest {
    /// The unpatched SPA shell HTML (as shipped by the bundler).
    pub html: String,
    /// Languages to precompute. Defaults to every key of the merged
    /// translation table if `None`.
    pub languages: Option<Vec<String>>,
    /// User-supplied per-language translation overrides.
    pub translations: BTreeMap<String, TranslationRecord>,
}

impl CacheBuildRequest {
    /// Builds a request with no language restriction and no overrides.
    #[must_use]
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            languages: None,
            translations: BTreeMap::new(),
        }
    }

    /// Restricts the cache to exactly these languages (unknown codes are
    /// dropped, not an error, unless the resulting set is empty).
    #[must_use]
    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = Some(languages);
        self
    }

    /// Supplies per-language translation overrides.
    #[must_use]
    pub fn with_translations(mut self, translations: BTreeMap<String, TranslationRecord>) -> Self {
        self.translations = translations;
        self
    }
}

/// The four ready-to-serve byte buffers for one cache entry (§3
/// `HTMLCacheEntry.encodings`).
#[derive(Debug, Clone, Default)]
pub struct Encodings {
    pub identity: Vec<u8>,
    pub gzip: Vec<u8>,
    pub br: Vec<u8>,
    pub zstd: Vec<u8>,
}

/// One precomputed `(language)` cache entry.
#[derive(Debug, Clone)]
pub struct HtmlCacheEntry {
    /// The patched HTML, as text (useful for tests/diagnostics).
    pub html: String,
    /// Quoted ETag value, e.g. `"a1b2c3d4e5f6a1b2-ko"`.
    pub etag: String,
    /// The four precomputed encodings.
    pub encodings: Encodings,
}

/// The full precomputed, per-language HTML cache (§4.J/§4.K).
#[derive(Debug, Clone)]
pub struct HtmlCache {
    entries: BTreeMap<String, HtmlCacheEntry>,
}

impl HtmlCache {
    /// Builds the cache. Fails fast if the resolved language list (after
    /// dropping codes the translation table has no entry for) is empty.
    pub fn build(request: CacheBuildRequest) -> Result<Self, SpaGuardError> {
        let table = TranslationTable::merged(&request.translations);
        let candidates = request.languages.unwrap_or_else(|| table.languages());

        let resolved: Vec<String> = candidates
            .into_iter()
            .filter(|lang| table.get(lang).is_some())
            .collect();
        if resolved.is_empty() {
            return Err(SpaGuardError::NoLanguages);
        }

        let mut entries = BTreeMap::new();
        for lang in resolved {
            let patched = patch_html_i18n(&request.html, &lang, &table)?;
            let etag = compute_etag(&patched, &lang);
            let identity = patched.clone().into_bytes();
            let encodings = Encodings {
                gzip: gzip_encode(&identity),
                br: brotli_encode(&identity),
                zstd: zstd_encode(&identity),
                identity,
            };
            entries.insert(lang.to_ascii_lowercase(), HtmlCacheEntry { html: patched, etag, encodings });
        }

        Ok(Self { entries })
    }

    /// Every language this cache has a precomputed entry for.
    #[must_use]
    pub fn languages(&self) -> Vec<String> {
        entries_sorted_by_insertion(&self.entries)
    }

    /// Looks up the entry for `lang` (case-insensitive).
    #[must_use]
    pub fn entry(&self, lang: &str) -> Option<&HtmlCacheEntry> {
        self.entries.get(&lang.to_ascii_lowercase())
    }
}

fn entries_sorted_by_insertion(entries: &BTreeMap<String, HtmlCacheEntry>) -> Vec<String> {
    entries.keys().cloned().collect()
}

fn compute_etag(html: &str, lang: &str) -> String {
    match extract_version_marker(html) {
        Some(version) => format!(r#""{version}-{lang}""#),
        None => {
            let digest = Sha256::digest(html.as_bytes());
            let hex = to_hex(&digest);
            format!(r#""{}-{lang}""#, &hex[..16])
        }
    }
}

fn extract_version_marker(html: &str) -> Option<String> {
    let re = Regex::new(r#"__SPA_GUARD_VERSION__="([^"]*)""#).unwrap();
    re.captures(html).map(|caps| caps[1].to_string())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn gzip_encode(data: &[u8]) -> Vec<u8> {
    use flate2::Compression;
    use flate2::write::GzEncoder;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("writing to an in-memory gzip encoder cannot fail");
    encoder.finish().expect("finishing an in-memory gzip encoder cannot fail")
}

fn brotli_encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let params = brotli::enc::BrotliEncoderParams::default();
    brotli::BrotliCompress(&mut std::io::Cursor::new(data), &mut out, &params)
        .expect("compressing an in-memory buffer with brotli cannot fail");
    out
}

fn zstd_encode(data: &[u8]) -> Vec<u8> {
    zstd::encode_all(std::io::Cursor::new(data), 0).expect("encoding an in-memory buffer with zstd cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "<!doctype html><html><head><title>t</title></head><body>hi</body></html>";

    #[test]
    fn builds_one_entry_per_requested_language() {
        let cache = HtmlCache::build(CacheBuildRequest::new(SAMPLE).with_languages(vec!["en".into(), "ko".into()])).unwrap();
        let mut langs = cache.languages();
        langs.sort();
        assert_eq!(langs, vec!["en", "ko"]);
    }

    #[test]
    fn defaults_to_every_built_in_language_when_unspecified() {
        let cache = HtmlCache::build(CacheBuildRequest::new(SAMPLE)).unwrap();
        assert_eq!(cache.languages().len(), 10);
    }

    #[test]
    fn unknown_language_codes_are_dropped_not_fatal() {
        let cache = HtmlCache::build(CacheBuildRequest::new(SAMPLE).with_languages(vec!["en".into(), "xx".into()])).unwrap();
        assert_eq!(cache.languages(), vec!["en"]);
    }

    #[test]
    fn empty_resolved_language_list_fails_fast() {
        let result = HtmlCache::build(CacheBuildRequest::new(SAMPLE).with_languages(vec!["xx".into(), "yy".into()]));
        assert!(matches!(result, Err(SpaGuardError::NoLanguages)));
    }

    #[test]
    fn etag_uses_version_marker_when_present() {
        let html = format!("{SAMPLE}<!-- __SPA_GUARD_VERSION__=\"1.2.3\" -->");
        let cache = HtmlCache::build(CacheBuildRequest::new(html).with_languages(vec!["en".into()])).unwrap();
        assert_eq!(cache.entry("en").unwrap().etag, r#""1.2.3-en""#);
    }

    #[test]
    fn etag_falls_back_to_sha256_prefix_without_version_marker() {
        let cache = HtmlCache::build(CacheBuildRequest::new(SAMPLE).with_languages(vec!["en".into()])).unwrap();
        let etag = &cache.entry("en").unwrap().etag;
        assert!(etag.ends_with(r#"-en""#));
        // `"` + 16 hex chars + `-en` + `"`
        assert_eq!(etag.len(), 1 + 16 + 3 + 1);
    }

    #[test]
    fn encodings_all_decode_back_to_the_identity_bytes() {
        let cache = HtmlCache::build(CacheBuildRequest::new(SAMPLE).with_languages(vec!["en".into()])).unwrap();
        let entry = cache.entry("en").unwrap();

        let mut gunzip = flate2::read::GzDecoder::new(entry.encodings.gzip.as_slice());
        let mut out = Vec::new();
        std::io::Read::read_to_end(&mut gunzip, &mut out).unwrap();
        assert_eq!(out, entry.encodings.identity);

        let mut br_out = Vec::new();
        brotli::BrotliDecompress(&mut std::io::Cursor::new(&entry.encodings.br), &mut br_out).unwrap();
        assert_eq!(br_out, entry.encodings.identity);

        let zstd_out = zstd::decode_all(std::io::Cursor::new(&entry.encodings.zstd)).unwrap();
        assert_eq!(zstd_out, entry.encodings.identity);
    }
}
