// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! Negotiates a language tag against an available set (§4.I).

/// Resolves `input` against `available`, an ordered list of language tags
/// the cache actually has entries for.
///
/// `input` may be absent, a single tag (`"zh-CN"`, `"ko"`), or an
/// `Accept-Language`-style header (`"ko-KR,ko;q=0.9,en;q=0.8"`). Detection of
/// header form is by the presence of `","` or `";q="` in the input.
#[must_use]
pub fn match_lang(input: Option<&str>, available: &[String]) -> String {
    let Some(input) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return resolve_single("en", available);
    };

    if input.contains(',') || input.contains(";q=") {
        let mut entries = parse_accept_language(input);
        // Stable sort: entries with equal q keep their original relative order.
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        match entries.first() {
            Some((lang, _)) => resolve_single(lang, available),
            None => resolve_single("en", available),
        }
    } else {
        resolve_single(input, available)
    }
}

/// Case-insensitive exact match, then prefix match, then `"en"`, then the
/// first available tag (§9 "Language matcher ambiguity": build-time order
/// of `available` is the deterministic fallback when `en` is missing too).
fn resolve_single(tag: &str, available: &[String]) -> String {
    if let Some(hit) = available.iter().find(|a| a.eq_ignore_ascii_case(tag)) {
        return hit.clone();
    }

    let prefix = tag.split('-').next().unwrap_or(tag);
    if let Some(hit) = available.iter().find(|a| {
        a.eq_ignore_ascii_case(prefix) || a.to_ascii_lowercase().starts_with(&format!("{}-", prefix.to_ascii_lowercase()))
    }) {
        return hit.clone();
    }

    if let Some(hit) = available.iter().find(|a| a.eq_ignore_ascii_case("en")) {
        return hit.clone();
    }

    available.first().cloned().unwrap_or_default()
}

fn parse_accept_language(input: &str) -> Vec<(String, f32)> {
    input
        .split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            let mut parts = entry.split(';');
            let lang = parts.next()?.trim();
            if lang.is_empty() {
                return None;
            }
            let mut q = 1.0_f32;
            for param in parts {
                if let Some(value) = param.trim().strip_prefix("q=") {
                    q = value.trim().parse().unwrap_or(1.0);
                }
            }
            Some((lang.to_string(), q))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn undefined_input_falls_back_to_en_then_first() {
        assert_eq!(match_lang(None, &tags(&["en", "ko"])), "en");
        assert_eq!(match_lang(None, &tags(&["ko", "ja"])), "ko");
    }

    #[rstest]
    #[case("zh-CN", & ["en", "zh"], "zh")]
    #[case("ko", & ["en", "ko"], "ko")]
    #[case("zh-Hant", & ["en", "zh"], "zh")]
    #[case("fr", & ["en", "ko"], "en")]
    #[case("fr", & ["ko", "ja"], "ko")]
    fn single_tag_resolution(#[case] input: &str, #[case] available: &[&str], #[case] expected: &str) {
        assert_eq!(match_lang(Some(input), &tags(available)), expected);
    }

    #[test]
    fn header_form_picks_highest_q_entry() {
        let available = tags(&["en", "ko"]);
        assert_eq!(match_lang(Some("ko-KR,ko;q=0.9,en;q=0.8"), &available), "ko");
    }

    #[test]
    fn header_form_invalid_q_defaults_to_one() {
        let available = tags(&["en", "ko"]);
        // "ko" gets an unparsable q and should be treated as 1.0, beating en;q=0.9.
        assert_eq!(match_lang(Some("en;q=0.9,ko;q=nonsense"), &available), "ko");
    }

    #[test]
    fn header_form_with_no_available_match_falls_back_to_en() {
        let available = tags(&["en", "ja"]);
        assert_eq!(match_lang(Some("fr-FR,fr;q=0.9"), &available), "en");
    }

    #[test]
    fn unique_highest_q_matches_single_tag_resolution_of_that_entry() {
        // P10: for a unique highest-q entry L', output equals resolveSingle(L', available).
        let available = tags(&["en", "zh"]);
        let header = "zh-Hant;q=0.7,ko;q=0.3";
        assert_eq!(match_lang(Some(header), &available), match_lang(Some("zh-Hant"), &available));
    }
}
