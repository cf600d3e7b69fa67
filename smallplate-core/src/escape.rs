//! HTML escaping for rendered values.
//!
//! Escapes the same characters as Go's `html/template` text context, using
//! numeric references for quotes and `+`, so output matches the templates
//! this tool has always produced.

use std::fmt::Write as _;

use minijinja::value::Value;
use minijinja::{AutoEscape, Error, ErrorKind, Output, State, escape_formatter};

/// Escapes `text` for inclusion in HTML.
///
/// # Examples
/// ```
/// use smallplate_core::escape_html;
///
/// assert_eq!(escape_html("Tom & Jerry's"), "Tom &amp; Jerry&#39;s");
/// assert_eq!(escape_html("<a href=\"x\">"), "&lt;a href=&#34;x&#34;&gt;");
/// ```
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            '+' => escaped.push_str("&#43;"),
            '\0' => escaped.push('\u{FFFD}'),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Output formatter installed on every render environment.
///
/// Values that are not marked safe are escaped with [`escape_html`] when the
/// template renders with HTML auto-escaping; everything else takes the
/// engine's default path.
pub(crate) fn html_formatter(
    out: &mut Output<'_>,
    state: &State<'_, '_>,
    value: &Value,
) -> Result<(), Error> {
    let escaping = matches!(state.auto_escape(), AutoEscape::Html);
    if !escaping || value.is_safe() || value.is_undefined() || value.is_none() {
        return escape_formatter(out, state, value);
    }
    write!(out, "{}", escape_html(&value.to_string()))
        .map_err(|_| Error::new(ErrorKind::WriteFailure, "failed to write rendered value"))
}
