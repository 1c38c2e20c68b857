// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! `patchHtmlI18n` (§4.J): sets `<html lang>` and injects the
//! `<meta name="spa-guard-i18n">` tag carrying the active translation
//! record, shared by the cache builder and (conceptually) the same
//! marker-patching engine the fallback renderer uses.

use regex::{Captures, Regex};
use spa_guard_error::SpaGuardError;

use crate::dom::escape_attr;
use crate::i18n::{TranslationRecord, TranslationTable};

/// Sets `lang` on the `<html>` element and injects the i18n meta tag.
///
/// English with no overrides (i.e. `table.is_unmodified_builtin("en")`) is a
/// documented no-op (§4.J, P6): returns `html` unchanged, byte for byte.
pub fn patch_html_i18n(html: &str, lang: &str, table: &TranslationTable) -> Result<String, SpaGuardError> {
    if lang.eq_ignore_ascii_case("en") && table.is_unmodified_builtin("en") {
        return Ok(html.to_string());
    }

    let record = table.get(lang).cloned().unwrap_or_default();
    let patched = set_html_lang(html, lang)?;
    inject_i18n_meta(&patched, &record)
}

/// Sets `<html lang="...">`, creating the attribute if absent. Never
/// confuses `data-lang`, `xml:lang`, or an unrelated attribute like
/// `x-on:click.prevent` with a bare `lang` attribute, because the match
/// requires the character immediately before `lang` to be whitespace or the
/// start of the attribute list.
fn set_html_lang(html: &str, lang: &str) -> Result<String, SpaGuardError> {
    let open_re = Regex::new(r"(?i)<html\b([^>]*)>").unwrap();
    let Some(caps) = open_re.captures(html) else {
        return Err(SpaGuardError::MalformedHtml("missing <html> element".to_string()));
    };
    let whole = caps.get(0).unwrap();
    let attrs = &caps[1];

    let lang_attr_re = Regex::new(r#"(?i)(^|\s)lang\s*=\s*"[^"]*""#).unwrap();
    let new_attrs = if lang_attr_re.is_match(attrs) {
        lang_attr_re
            .replace(attrs, |caps: &Captures| format!(r#"{}lang="{}""#, &caps[1], lang))
            .into_owned()
    } else {
        format!(r#" lang="{lang}"{attrs}"#)
    };

    let new_open_tag = format!("<html{new_attrs}>");
    Ok(format!("{}{}{}", &html[..whole.start()], new_open_tag, &html[whole.end()..]))
}

/// Injects `<meta name="spa-guard-i18n" content="...">` as the first child
/// of `<head>`, matching the tag case-insensitively and tolerating other
/// attributes on it.
fn inject_i18n_meta(html: &str, record: &TranslationRecord) -> Result<String, SpaGuardError> {
    let head_re = Regex::new(r"(?i)<head\b[^>]*>").unwrap();
    let Some(found) = head_re.find(html) else {
        return Err(SpaGuardError::MalformedHtml("missing <head> element".to_string()));
    };

    let json = serde_json::to_string(record)?;
    let meta = format!(r#"<meta name="spa-guard-i18n" content="{}">"#, escape_attr(&json));
    Ok(format!("{}{}{}", &html[..found.end()], meta, &html[found.end()..]))
}
