//! Shared field validators used by handlers before hitting the database.
//!
//! Required-field presence on DTOs is checked with `validator` derives in the
//! db crate; the functions here cover formats that need domain knowledge.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// `HH:MM`, 24-hour clock.
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("valid regex"));

/// `#rgb` or `#rrggbb`.
static COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid regex")
});

/// Lowercase letters, digits and single dashes.
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid regex"));

/// Reject empty or whitespace-only values for a required text field.
pub fn require_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Validate a `HH:MM` time string.
pub fn validate_time(field: &str, value: &str) -> Result<(), CoreError> {
    if TIME_RE.is_match(value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{field} must be a time in HH:MM format, got '{value}'"
        )))
    }
}

/// Validate every entry of a list of `HH:MM` times.
pub fn validate_times(field: &str, values: &[String]) -> Result<(), CoreError> {
    values.iter().try_for_each(|v| validate_time(field, v))
}

/// Validate a CSS hex color.
pub fn validate_color(value: &str) -> Result<(), CoreError> {
    if COLOR_RE.is_match(value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "color must be a hex value like #1e40af, got '{value}'"
        )))
    }
}

/// Validate a church slug.
pub fn validate_slug(value: &str) -> Result<(), CoreError> {
    if SLUG_RE.is_match(value) && value.len() <= 64 {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "slug must contain only lowercase letters, digits and dashes, got '{value}'"
        )))
    }
}

/// Derive a slug from a free-text church name.
///
/// Accented Portuguese letters are folded to ASCII; everything else that is
/// not alphanumeric becomes a dash.
pub fn slugify(name: &str) -> String {
    let folded: String = name
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            c if c.is_ascii_alphanumeric() => c,
            _ => '-',
        })
        .collect();

    folded
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Validate a day-of-week number (0 = Sunday).
pub fn validate_day_of_week(value: i16) -> Result<(), CoreError> {
    if (0..=6).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "day_of_week must be between 0 (Sunday) and 6 (Saturday), got {value}"
        )))
    }
}
