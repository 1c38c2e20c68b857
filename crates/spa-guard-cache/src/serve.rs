// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! Cache serving (§4.K): resolves a request to one precomputed variant with
//! conditional-request and content-negotiation headers.

use spa_guard_html::match_lang;

use crate::builder::{HtmlCache, HtmlCacheEntry};

const CONTENT_TYPE: &str = "text/html; charset=utf-8";
const VARY: &str = "Accept-Language, Accept-Encoding";

/// One cache lookup's inputs, mirroring the fields an HTTP framework adapter
/// would pull off an incoming request.
#[derive(Debug, Clone, Default)]
pub struct CacheRequest {
    /// An explicit language override (e.g. `?lang=ko`), tried before
    /// `accept_language`.
    pub lang: Option<String>,
    /// The raw `Accept-Language` header value.
    pub accept_language: Option<String>,
    /// The raw `Accept-Encoding` header value.
    pub accept_encoding: Option<String>,
    /// The raw `If-None-Match` header value.
    pub if_none_match: Option<String>,
}

/// The response to serve: status, headers (in a stable, declared order),
/// and body bytes.
#[derive(Debug, Clone)]
pub struct CacheResponse {
    pub status_code: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl CacheResponse {
    /// Looks up a header by name (case-sensitive, matching the fixed names
    /// this module emits).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(key, _)| *key == name).map(|(_, value)| value.as_str())
    }
}

impl HtmlCache {
    /// Resolves `request` to a precomputed variant (§4.K).
    #[must_use]
    pub fn get(&self, request: &CacheRequest) -> CacheResponse {
        let available = self.languages();
        let input = request.lang.as_deref().or(request.accept_language.as_deref());
        let lang = match_lang(input, &available);

        let entry = self
            .entry(&lang)
            .expect("match_lang always resolves to a language the cache actually has an entry for");

        if request.if_none_match.as_deref() == Some(entry.etag.as_str()) {
            return CacheResponse {
                status_code: 304,
                headers: vec![
                    ("ETag", entry.etag.clone()),
                    ("Content-Language", lang),
                    ("Content-Type", CONTENT_TYPE.to_string()),
                    ("Vary", VARY.to_string()),
                ],
                body: Vec::new(),
            };
        }

        let (encoding, body) = pick_encoding(entry, request.accept_encoding.as_deref());
        let mut headers = vec![
            ("ETag", entry.etag.clone()),
            ("Content-Type", CONTENT_TYPE.to_string()),
            ("Content-Language", lang),
            ("Vary", VARY.to_string()),
        ];
        if let Some(encoding) = encoding {
            headers.push(("Content-Encoding", encoding.to_string()));
        }

        CacheResponse { status_code: 200, headers, body }
    }
}

/// Scans `accept_encoding` left to right for the first token that is one of
/// `zstd`, `br`, `gzip`; falls back to identity if none appears or the
/// header is absent. Q-values are ignored (§4.K, "for simplicity").
fn pick_encoding<'e>(entry: &'e HtmlCacheEntry, accept_encoding: Option<&str>) -> (Option<&'static str>, Vec<u8>) {
    let Some(accept_encoding) = accept_encoding else {
        return (None, entry.encodings.identity.clone());
    };

    for token in accept_encoding.split(',') {
        let token = token.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match token.as_str() {
            "zstd" => return (Some("zstd"), entry.encodings.zstd.clone()),
            "br" => return (Some("br"), entry.encodings.br.clone()),
            "gzip" => return (Some("gzip"), entry.encodings.gzip.clone()),
            _ => {}
        }
    }

    (None, entry.encodings.identity.clone())
}

#[cfg(test)]
mod tests {
    use crate::builder::CacheBuildRequest;

    use super::*;

    const SAMPLE: &str = "<!doctype html><html><head><title>t</title></head><body>hi</body></html>";

    fn cache() -> HtmlCache {
        HtmlCache::build(CacheBuildRequest::new(SAMPLE).with_languages(vec!["en".into(), "ko".into()])).unwrap()
    }

    #[test]
    fn defaults_to_identity_without_accept_encoding() {
        let response = cache().get(&CacheRequest { lang: Some("en".into()), ..Default::default() });
        assert_eq!(response.status_code, 200);
        assert_eq!(response.header("Content-Encoding"), None);
    }

    #[test]
    fn picks_first_supported_token_in_header_order() {
        let response = cache().get(&CacheRequest {
            lang: Some("en".into()),
            accept_encoding: Some("deflate, br, gzip".into()),
            ..Default::default()
        });
        assert_eq!(response.header("Content-Encoding"), Some("br"));
    }

    #[test]
    fn conditional_request_with_matching_etag_returns_304_with_empty_body() {
        let cache = cache();
        let first = cache.get(&CacheRequest { lang: Some("en".into()), ..Default::default() });
        let etag = first.header("ETag").unwrap().to_string();

        let second = cache.get(&CacheRequest {
            lang: Some("en".into()),
            if_none_match: Some(etag.clone()),
            ..Default::default()
        });
        assert_eq!(second.status_code, 304);
        assert!(second.body.is_empty());
        assert_eq!(second.header("ETag"), Some(etag.as_str()));
    }

    #[test]
    fn headers_always_include_vary_and_content_type() {
        let response = cache().get(&CacheRequest { lang: Some("ko".into()), ..Default::default() });
        assert_eq!(response.header("Vary"), Some(VARY));
        assert_eq!(response.header("Content-Type"), Some(CONTENT_TYPE));
        assert_eq!(response.header("Content-Language"), Some("ko"));
    }

    #[test]
    fn accept_language_negotiates_when_no_explicit_lang_given() {
        let response = cache().get(&CacheRequest {
            accept_language: Some("ko-KR,ko;q=0.9,en;q=0.8".into()),
            ..Default::default()
        });
        assert_eq!(response.header("Content-Language"), Some("ko"));
        let body = String::from_utf8(response.body).unwrap();
        assert!(body.contains(r#"lang="ko""#));
    }
}
