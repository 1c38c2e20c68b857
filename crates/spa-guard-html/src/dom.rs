// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! Low-level `data-spa-guard-*` marker and tag-attribute patching shared by
//! the fallback renderer (§4.H) and `patch_html_i18n` (§4.J).
//!
//! There is no real DOM here - no HTML parser lives anywhere in the
//! reference corpus for this kind of build-time/render-time text patching,
//! so this module treats markup as text and patches it with regexes,
//! tracking tag nesting by name where a regex backreference would otherwise
//! be required (the `regex` crate deliberately has none).

use regex::{Captures, Regex};

/// Escapes text for safe assignment as element text content.
#[must_use]
pub fn escape_text(value: &str) -> String {
    value.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Escapes text for safe assignment inside a double-quoted HTML attribute.
#[must_use]
pub fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Replaces the text content of the first element carrying
/// `{attr}="{key}"` (word-bounded, so `data-spa-guard-content="attempt"`
/// does not also match a hypothetical `"attempt-2"`) with `text`, escaped.
///
/// Missing markers are a no-op (§6 "degrade gracefully"): returns `html`
/// unchanged if no element carries the marker.
#[must_use]
pub fn set_marker_text(html: &str, attr: &str, key: &str, text: &str) -> String {
    let Some((tag_name, open_end)) = find_marker_open_tag(html, attr, key) else {
        return html.to_string();
    };
    let Some(close_start) = find_matching_close(html, open_end, &tag_name) else {
        return html.to_string();
    };
    format!("{}{}{}", &html[..open_end], escape_text(text), &html[close_start..])
}

/// Replaces the inner markup of the first element carrying a boolean
/// (value-less or empty) marker attribute, e.g. `[data-spa-guard-spinner]`.
#[must_use]
pub fn set_boolean_marker_html(html: &str, attr: &str, inner_html: &str) -> String {
    let pattern = format!(
        r#"(?is)<([a-zA-Z][a-zA-Z0-9]*)\b([^>]*\b{}\b(?:\s*=\s*"")?[^>]*)>"#,
        regex::escape(attr)
    );
    let re = Regex::new(&pattern).expect("boolean marker pattern is well-formed");
    let Some(caps) = re.captures(html) else {
        return html.to_string();
    };
    let whole = caps.get(0).unwrap();
    let tag_name = caps[1].to_string();
    let Some(close_start) = find_matching_close(html, whole.end(), &tag_name) else {
        return html.to_string();
    };
    format!("{}{}{}", &html[..whole.end()], inner_html, &html[close_start..])
}

/// Sets `style="display:{display}"` on the first element carrying
/// `{attr}="{key}"`, merging with (and overriding any existing `display` in)
/// an existing `style` attribute.
#[must_use]
pub fn set_marker_display(html: &str, attr: &str, key: &str, display: &str) -> String {
    let marker_re = marker_regex(attr, key);
    let Some(caps) = marker_re.captures(html) else {
        return html.to_string();
    };
    let whole = caps.get(0).unwrap();
    let attrs = &caps[2];

    let style_re = Regex::new(r#"(?is)\bstyle\s*=\s*"([^"]*)""#).unwrap();
    let new_attrs = if let Some(style_caps) = style_re.captures(attrs) {
        let existing = &style_caps[1];
        let without_display = Regex::new(r"(?is)display\s*:\s*[^;]*;?\s*")
            .unwrap()
            .replace_all(existing, "")
            .into_owned();
        let merged = format!("{}display:{display};", without_display.trim());
        style_re.replace(attrs, |_: &Captures| format!(r#"style="{merged}""#)).into_owned()
    } else {
        format!(r#"{attrs} style="display:{display};""#)
    };

    let new_open = format!("<{}{}>", &caps[1], new_attrs);
    format!("{}{}{}", &html[..whole.start()], new_open, &html[whole.end()..])
}

fn marker_regex(attr: &str, key: &str) -> Regex {
    let pattern = format!(
        r#"(?is)<([a-zA-Z][a-zA-Z0-9]*)\b([^>]*\b{}\s*=\s*"{}"[^>]*)>"#,
        regex::escape(attr),
        regex::escape(key)
    );
    Regex::new(&pattern).expect("marker pattern is well-formed")
}

/// Finds the element carrying `{attr}="{key}"`, returning its tag name and
/// the byte offset immediately after its opening tag's closing `>`.
fn find_marker_open_tag(html: &str, attr: &str, key: &str) -> Option<(String, usize)> {
    let caps = marker_regex(attr, key).captures(html)?;
    let whole = caps.get(0)?;
    Some((caps[1].to_string(), whole.end()))
}

/// Scans forward from `from`, tracking nested `<tag_name ...>` opens against
/// `</tag_name>` closes, and returns the byte offset of the matching close
/// tag's `<` for depth zero.
fn find_matching_close(html: &str, from: usize, tag_name: &str) -> Option<usize> {
    let open_re = Regex::new(&format!(r"(?i)<{}\b[^>]*>", regex::escape(tag_name))).unwrap();
    let close_re = Regex::new(&format!(r"(?i)</{}\s*>", regex::escape(tag_name))).unwrap();

    let mut depth: i32 = 0;
    let mut cursor = from;
    loop {
        let next_open = open_re.find_at(html, cursor).map(|m| m.start());
        let next_close = close_re.find_at(html, cursor)?;

        match next_open {
            Some(open_start) if open_start < next_close.start() => {
                depth += 1;
                cursor = open_start + 1;
            }
            _ => {
                if depth == 0 {
                    return Some(next_close.start());
                }
                depth -= 1;
                cursor = next_close.end();
            }
        }
    }
}
