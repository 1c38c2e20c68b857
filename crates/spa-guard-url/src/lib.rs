// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! Encodes and decodes the three reserved query parameters the retry
//! orchestrator uses to persist progress across a page reload.
//!
//! Parameter names are stable, opaque string constants so that an old tab
//! (running a previous deployment's code) and a freshly reloaded tab (running
//! the new deployment's code) agree on their meaning across the reload.

use url::Url;

/// Query parameter carrying the 0-based retry attempt number.
pub const RETRY_ATTEMPT_PARAM: &str = "spa_guard_retry_attempt";
/// Query parameter carrying the opaque retry session id.
pub const RETRY_ID_PARAM: &str = "spa_guard_retry_id";
/// Query parameter carrying a millisecond timestamp used to defeat HTTP caches.
pub const CACHE_BUST_PARAM: &str = "spa_guard_cache_bust";

/// The retry-related state decoded from a page URL.
///
/// A malformed or negative value for a parameter decodes to `None` for that
/// field rather than producing an error - an old, possibly hand-edited or
/// corrupted URL must never crash the boot sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryUrlState {
    /// The recorded attempt number, if present and well-formed.
    pub attempt: Option<u32>,
    /// The recorded retry session id, if present.
    pub retry_id: Option<String>,
    /// The recorded cache-bust timestamp, if present and well-formed.
    pub cache_bust: Option<u64>,
}

/// Decodes [`RetryUrlState`] from `url`'s query string.
#[must_use]
pub fn decode(url: &Url) -> RetryUrlState {
    let mut state = RetryUrlState::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            RETRY_ATTEMPT_PARAM => state.attempt = value.parse::<u32>().ok(),
            RETRY_ID_PARAM => state.retry_id = Some(value.into_owned()),
            CACHE_BUST_PARAM => state.cache_bust = value.parse::<u64>().ok(),
            _ => {}
        }
    }
    state
}

/// Returns a copy of `url` with the reserved parameters overwritten.
///
/// Only `RETRY_ATTEMPT_PARAM`, `RETRY_ID_PARAM` (when `retry_id` is `Some`),
/// and `CACHE_BUST_PARAM` (when `cache_bust` is `Some`) are touched; every
/// other query parameter and the fragment are carried over unchanged. A
/// `None` for `retry_id` or `cache_bust` drops any existing value for that
/// parameter rather than preserving it, since the caller explicitly chose not
/// to carry it forward (e.g. `useRetryId: false`, or a trigger that did not
/// request cache-busting).
#[must_use]
pub fn encode(url: &Url, attempt: u32, retry_id: Option<&str>, cache_bust: Option<u64>) -> Url {
    let preserved: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_reserved(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut next = url.clone();
    {
        let mut pairs = next.query_pairs_mut();
        pairs.clear();
        for (key, value) in &preserved {
            pairs.append_pair(key, value);
        }
        pairs.append_pair(RETRY_ATTEMPT_PARAM, &attempt.to_string());
        if let Some(retry_id) = retry_id {
            pairs.append_pair(RETRY_ID_PARAM, retry_id);
        }
        if let Some(cache_bust) = cache_bust {
            pairs.append_pair(CACHE_BUST_PARAM, &cache_bust.to_string());
        }
    }
    next
}

/// Returns a copy of `url` with all three reserved parameters removed
/// entirely (rather than reset to a value), used by
/// `markRetryHealthyBoot` to restore the page's "clean" URL.
#[must_use]
pub fn clear(url: &Url) -> Url {
    let preserved: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_reserved(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut next = url.clone();
    {
        let mut pairs = next.query_pairs_mut();
        pairs.clear();
        for (key, value) in &preserved {
            pairs.append_pair(key, value);
        }
    }
    if preserved.is_empty() {
        next.set_query(None);
    }
    next
}

fn is_reserved(key: &str) -> bool {
    matches!(key, RETRY_ATTEMPT_PARAM | RETRY_ID_PARAM | CACHE_BUST_PARAM)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).expect("valid test URL")
    }

    #[test]
    fn decode_absent_params_is_all_none() {
        let state = decode(&url("https://example.com/app"));
        assert_eq!(state, RetryUrlState::default());
    }

    #[test]
    fn decode_reads_all_three_params() {
        let state = decode(&url(
            "https://example.com/app?spa_guard_retry_attempt=2&spa_guard_retry_id=R1&spa_guard_cache_bust=1690000000000",
        ));
        assert_eq!(state.attempt, Some(2));
        assert_eq!(state.retry_id.as_deref(), Some("R1"));
        assert_eq!(state.cache_bust, Some(1_690_000_000_000));
    }

    #[test]
    fn decode_malformed_attempt_yields_none_not_error() {
        let state = decode(&url("https://example.com/app?spa_guard_retry_attempt=-1"));
        assert_eq!(state.attempt, None);

        let state = decode(&url("https://example.com/app?spa_guard_retry_attempt=not-a-number"));
        assert_eq!(state.attempt, None);
    }

    #[test]
    fn encode_overwrites_only_reserved_params() {
        let encoded = encode(
            &url("https://example.com/app?lang=en&spa_guard_retry_attempt=0#section"),
            1,
            Some("R1"),
            None,
        );
        assert_eq!(encoded.fragment(), Some("section"));
        let state = decode(&encoded);
        assert_eq!(state.attempt, Some(1));
        assert_eq!(state.retry_id.as_deref(), Some("R1"));
        assert!(encoded.query().unwrap().contains("lang=en"));
    }

    #[test]
    fn encode_with_cache_bust_adds_param() {
        let encoded = encode(&url("https://example.com/app"), 1, Some("R1"), Some(1_700_000_000_000));
        let state = decode(&encoded);
        assert_eq!(state.cache_bust, Some(1_700_000_000_000));
    }

    #[test]
    fn roundtrip_preserves_value() {
        let original = url("https://example.com/app?spa_guard_retry_attempt=3&spa_guard_retry_id=R9");
        let state = decode(&original);
        let rebuilt = encode(&original, state.attempt.unwrap(), state.retry_id.as_deref(), None);
        assert_eq!(decode(&rebuilt).attempt, Some(3));
    }
}
