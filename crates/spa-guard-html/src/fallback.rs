// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! The fallback renderer (§4.H): patches i18n strings and the spinner into
//! one of two built-in templates (or a caller-supplied override) and
//! returns the finished markup ready for a single DOM write.
//!
//! Inserting the returned string into the document is a framework-specific
//! concern (Non-goal) - the error-boundary/router-error wrapper that calls
//! this does `container.innerHTML = render_fallback(...)` in one shot to
//! avoid a flash of untranslated text.

use spa_guard_options::HtmlOptions;

use crate::dom::{escape_text, set_boolean_marker_html, set_marker_display, set_marker_text};
use crate::i18n::TranslationRecord;

const ERROR_TEMPLATE: &str = r#"<div class="spa-guard-fallback">
<h1 data-spa-guard-content="heading"></h1>
<p data-spa-guard-content="message"></p>
<button data-spa-guard-action="reload" type="button"></button>
<button data-spa-guard-action="try-again" type="button"></button>
<span class="spa-guard-retry-id"></span>
</div>"#;

const LOADING_TEMPLATE: &str = r#"<div class="spa-guard-fallback">
<p data-spa-guard-content="loading"></p>
<div data-spa-guard-section="retrying" style="display:none;">
<p data-spa-guard-content="retrying"></p>
<span data-spa-guard-content="attempt"></span>
</div>
<div data-spa-guard-spinner></div>
</div>"#;

const CONTENT_ATTR: &str = "data-spa-guard-content";
const ACTION_ATTR: &str = "data-spa-guard-action";
const SECTION_ATTR: &str = "data-spa-guard-section";
const SPINNER_ATTR: &str = "data-spa-guard-spinner";

/// The subset of [`spa_guard_retry::RetrySnapshot`] the renderer needs - it
/// depends on the retry orchestrator's *data*, not the crate itself, so this
/// crate stays a leaf per the component dependency order (§2).
#[derive(Debug, Clone)]
pub struct FallbackRequest {
    /// Whether a reload is currently scheduled (loading template) or the
    /// budget is exhausted (error template).
    pub is_retrying: bool,
    /// The current attempt number, shown in the loading template.
    pub attempt: u32,
    /// The active retry session id, shown in the error template.
    pub retry_id: Option<String>,
}

/// Renders the fallback markup per the patching algorithm in §4.H.
#[must_use]
pub fn render_fallback(request: &FallbackRequest, options: &HtmlOptions, table: Option<&TranslationRecord>) -> String {
    let mut html = if request.is_retrying {
        options.loading_content.clone().unwrap_or_else(|| LOADING_TEMPLATE.to_string())
    } else {
        options.fallback_content.clone().unwrap_or_else(|| ERROR_TEMPLATE.to_string())
    };

    if let Some(table) = table {
        if let Some(text) = &table.heading {
            html = set_marker_text(&html, CONTENT_ATTR, "heading", text);
        }
        if let Some(text) = &table.message {
            html = set_marker_text(&html, CONTENT_ATTR, "message", text);
        }
        if let Some(text) = &table.reload {
            html = set_marker_text(&html, ACTION_ATTR, "reload", text);
        }
        if let Some(text) = &table.try_again {
            html = set_marker_text(&html, ACTION_ATTR, "try-again", text);
        }
        if let Some(text) = &table.loading {
            html = set_marker_text(&html, CONTENT_ATTR, "loading", text);
        }
        if let Some(text) = &table.retrying {
            html = set_marker_text(&html, CONTENT_ATTR, "retrying", text);
        }
    }

    if !options.spinner_disabled {
        if let Some(spinner) = &options.spinner_content {
            html = set_boolean_marker_html(&html, SPINNER_ATTR, spinner);
        }
    }

    if !request.retry_id.as_deref().unwrap_or_default().is_empty() {
        html = set_retry_id_span(&html, request.retry_id.as_deref().unwrap_or_default());
    }

    if request.is_retrying {
        html = set_marker_display(&html, SECTION_ATTR, "retrying", "block");
        html = set_marker_text(&html, CONTENT_ATTR, "attempt", &request.attempt.to_string());
    }

    if table.is_some_and(|t| t.rtl == Some(true)) {
        html = set_container_rtl(&html);
    }

    html
}

fn set_retry_id_span(html: &str, retry_id: &str) -> String {
    let Some(start) = html.find(r#"class="spa-guard-retry-id""#) else {
        return html.to_string();
    };
    let Some(open_end_rel) = html[start..].find('>') else {
        return html.to_string();
    };
    let open_end = start + open_end_rel + 1;
    let Some(close_start) = html[open_end..].find("</span>") else {
        return html.to_string();
    };
    let close_start = open_end + close_start;
    format!("{}{}{}", &html[..open_end], escape_text(retry_id), &html[close_start..])
}

fn set_container_rtl(html: &str) -> String {
    let Some(start) = html.find(r#"class="spa-guard-fallback""#) else {
        return html.to_string();
    };
    let Some(open_end_rel) = html[start..].find('>') else {
        return html.to_string();
    };
    let prefix = &html[..start];
    let tail = &html[start + open_end_rel..];
    format!(r#"{prefix}style="direction:rtl;" class="spa-guard-fallback"{tail}"#)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::TranslationTable;

    fn table() -> TranslationTable {
        TranslationTable::builtin()
    }

    #[test]
    fn error_template_shows_heading_and_message_in_english() {
        let request = FallbackRequest { is_retrying: false, attempt: 3, retry_id: Some("R1".to_string()) };
        let table = table();
        let html = render_fallback(&request, &HtmlOptions::default(), table.get("en"));
        assert!(html.contains("Something went wrong"));
        assert!(html.contains("R1"));
        assert!(!html.contains(r#"display:block"#));
    }

    #[test]
    fn loading_template_reveals_retrying_section_with_attempt() {
        let request = FallbackRequest { is_retrying: true, attempt: 2, retry_id: None };
        let table = table();
        let html = render_fallback(&request, &HtmlOptions::default(), table.get("en"));
        assert!(html.contains("Reconnecting"));
        assert!(html.contains("display:block"));
        assert!(html.contains(r#"data-spa-guard-content="attempt">2<"#));
    }

    #[test]
    fn rtl_table_sets_container_direction() {
        let request = FallbackRequest { is_retrying: false, attempt: 0, retry_id: None };
        let table = table();
        let html = render_fallback(&request, &HtmlOptions::default(), table.get("ar"));
        assert!(html.contains("direction:rtl"));
    }

    #[test]
    fn missing_translation_table_leaves_placeholders_empty_but_does_not_panic() {
        let request = FallbackRequest { is_retrying: false, attempt: 0, retry_id: None };
        let html = render_fallback(&request, &HtmlOptions::default(), None);
        assert!(html.contains(r#"data-spa-guard-content="heading"></h1>"#));
    }

    #[test]
    fn spinner_content_is_injected_as_raw_markup() {
        let request = FallbackRequest { is_retrying: true, attempt: 1, retry_id: None };
        let options = HtmlOptions {
            spinner_content: Some("<svg class=\"spin\"></svg>".to_string()),
            ..HtmlOptions::default()
        };
        let table = table();
        let html = render_fallback(&request, &options, table.get("en"));
        assert!(html.contains(r#"<svg class="spin"></svg>"#));
    }

    #[test]
    fn spinner_disabled_skips_injection_even_with_content_configured() {
        let request = FallbackRequest { is_retrying: true, attempt: 1, retry_id: None };
        let options = HtmlOptions {
            spinner_content: Some("<svg></svg>".to_string()),
            spinner_disabled: true,
            ..HtmlOptions::default()
        };
        let table = table();
        let html = render_fallback(&request, &options, table.get("en"));
        assert!(!html.contains("<svg>"));
    }

    #[test]
    fn dynamic_values_are_text_escaped_not_raw_html() {
        let request = FallbackRequest { is_retrying: false, attempt: 0, retry_id: Some("<script>".to_string()) };
        let html = render_fallback(&request, &HtmlOptions::default(), None);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn custom_fallback_content_with_subset_of_markers_still_patches_present_ones() {
        let options = HtmlOptions {
            fallback_content: Some(r#"<div class="spa-guard-fallback"><h1 data-spa-guard-content="heading"></h1></div>"#.to_string()),
            ..HtmlOptions::default()
        };
        let request = FallbackRequest { is_retrying: false, attempt: 0, retry_id: None };
        let table = table();
        let html = render_fallback(&request, &options, table.get("en"));
        assert!(html.contains("Something went wrong"));
    }
}
