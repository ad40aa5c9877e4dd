//! E.164 phone number normalization.

use std::sync::LazyLock;

use regex::Regex;

/// Country code assumed when a number has no leading `+`.
pub const DEFAULT_COUNTRY_CODE: &str = "1";

/// Result of [`normalize_e164`]. An invalid number is still returned so the
/// caller can log it; the provider decides what to do with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedNumber {
    pub number: String,
    pub is_valid: bool,
}

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[- ().]").expect("valid regex"));

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));

/// Strip common separators and prefix `+1` when no country code is given.
pub fn normalize_e164(raw: &str) -> NormalizedNumber {
    let stripped = SEPARATOR_RE.replace_all(raw, "");

    let (number, digits) = match stripped.strip_prefix('+') {
        Some(rest) => (stripped.to_string(), rest.to_string()),
        None => (
            format!("+{DEFAULT_COUNTRY_CODE}{stripped}"),
            format!("{DEFAULT_COUNTRY_CODE}{stripped}"),
        ),
    };

    NormalizedNumber {
        is_valid: DIGITS_RE.is_match(&digits),
        number,
    }
}
