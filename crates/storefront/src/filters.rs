//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for `checkout.js`.
///
/// The hash is computed at build time from the script's content.
///
/// Usage in templates: `{{ ""|checkout_js_hash }}`
#[askama::filter_fn]
pub fn checkout_js_hash(
    _value: impl Display,
    _env: &dyn askama::Values,
) -> askama::Result<&'static str> {
    Ok(env!("CHECKOUT_JS_HASH"))
}

/// Serialize a value as JSON that is safe inside a `<script>` element.
///
/// `<`, `>` and `&` are escaped as unicode escapes so the payload cannot close
/// the element or open a comment.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn script_json<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}
