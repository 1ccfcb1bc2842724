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

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Shortens a principal for tables: first and last groups only.
///
/// Usage in templates: `{{ user.principal|short_principal }}`
#[askama::filter_fn]
pub fn short_principal(principal: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(shorten(&principal.to_string()))
}

fn shorten(text: &str) -> String {
    let groups: Vec<&str> = text.split('-').collect();
    match (groups.first(), groups.last()) {
        (Some(first), Some(last)) if groups.len() > 3 => format!("{first}-...-{last}"),
        _ => text.to_string(),
    }
}
