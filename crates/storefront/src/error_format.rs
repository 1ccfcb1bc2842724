//! User-facing error messages.
//!
//! Every message shown in an alert passes through [`format_error_message`],
//! which strips credentials that backend or transport errors may echo back
//! (query-string tokens, bearer headers).

use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;

/// Fallback text when an error renders to nothing.
pub const UNKNOWN_ERROR: &str = "An unknown error occurred";

/// Friendly text for authorization rejections.
pub const UNAUTHORIZED_MESSAGE: &str =
    "Unauthorized: You do not have permission to perform this action";

/// `key=value` pairs whose value is a credential.
static SECRET_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(caffeineAdminToken|token|secret|password|apikey)=[^&\s]+")
        .expect("Invalid regex")
});

static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Bearer\s+\S+").expect("Invalid regex"));

static TRAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)trap[:\s]+(.+?)(?:\n|$)").expect("Invalid regex"));

/// Replace credential values in `message` with `[REDACTED]`.
///
/// ```
/// use cardshop_storefront::error_format::redact_sensitive_info;
///
/// assert_eq!(redact_sensitive_info("token=abc123&x=1"), "token=[REDACTED]&x=1");
/// ```
#[must_use]
pub fn redact_sensitive_info(message: &str) -> String {
    let message = SECRET_PARAM_RE.replace_all(message, |caps: &regex::Captures<'_>| {
        format!("{}=[REDACTED]", canonical_secret_key(&caps[1]))
    });
    BEARER_RE
        .replace_all(&message, "Bearer [REDACTED]")
        .into_owned()
}

/// Keys are written back in one spelling whatever case they arrived in.
fn canonical_secret_key(key: &str) -> String {
    if key.eq_ignore_ascii_case("caffeineAdminToken") {
        "caffeineAdminToken".to_string()
    } else {
        key.to_ascii_lowercase()
    }
}

/// Render an error for display, redacting credentials.
#[must_use]
pub fn format_error_message(error: &dyn Display) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        return UNKNOWN_ERROR.to_string();
    }
    redact_sensitive_info(&message)
}

/// Extract a friendly message from a backend rejection.
///
/// Authorization failures collapse to [`UNAUTHORIZED_MESSAGE`]; traps yield
/// the text after the `trap` marker. Anything else returns `None`.
#[must_use]
pub fn extract_backend_error(error: &dyn Display) -> Option<String> {
    let message = format_error_message(error);

    if message.contains("Unauthorized") {
        return Some(UNAUTHORIZED_MESSAGE.to_string());
    }

    if message.contains("trap") {
        return TRAP_RE
            .captures(&message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string());
    }

    None
}

/// Backend message if one can be extracted, otherwise the redacted error.
#[must_use]
pub fn user_message(error: &dyn Display) -> String {
    extract_backend_error(error).unwrap_or_else(|| format_error_message(error))
}
