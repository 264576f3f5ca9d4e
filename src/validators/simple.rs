//! Structural validators without checksum algorithms: email, phone, date,
//! and street address shapes

use crate::domain::{ValidationConfidence, ValidationResult};
use chrono::NaiveDate;

/// Validate an email address structurally
///
/// The recognizer pattern already did the broad match; this confirms a
/// single `@`, a dotted domain, and sane label lengths.
pub fn validate_email(text: &str) -> ValidationResult {
    let trimmed = text.trim();
    let mut parts = trimmed.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = match parts.next() {
        Some(d) => d,
        None => {
            return ValidationResult::invalid(ValidationConfidence::InvalidFormat, "missing @")
        }
    };

    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return ValidationResult::invalid(
            ValidationConfidence::InvalidFormat,
            "malformed local part",
        );
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2
        || labels
            .iter()
            .any(|l| l.is_empty() || l.starts_with('-') || l.ends_with('-'))
    {
        return ValidationResult::invalid(
            ValidationConfidence::InvalidFormat,
            "malformed domain",
        );
    }

    let tld = labels.last().unwrap_or(&"");
    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return ValidationResult::invalid(ValidationConfidence::InvalidFormat, "malformed TLD");
    }

    ValidationResult::valid(ValidationConfidence::FormatValid)
}

/// Validate a phone number for the supported regions
///
/// Accepts international (`+41 21 ...`, `0041 ...`) and national
/// (`021 ...`) shapes; checks digit count, not carrier allocation.
pub fn validate_phone(text: &str) -> ValidationResult {
    let trimmed = text.trim();
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    let allowed = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '.' | '(' | ')' | '/'));
    if !allowed {
        return ValidationResult::invalid(
            ValidationConfidence::InvalidFormat,
            "invalid characters",
        );
    }

    let international = trimmed.starts_with('+') || digits.starts_with("00");
    if international {
        // Country code + subscriber number
        if (9..=15).contains(&digits.len()) {
            ValidationResult::valid(ValidationConfidence::FormatValid)
        } else {
            ValidationResult::invalid(ValidationConfidence::InvalidFormat, "wrong digit count")
        }
    } else if digits.starts_with('0') && (9..=11).contains(&digits.len()) {
        ValidationResult::valid(ValidationConfidence::Standard)
    } else {
        ValidationResult::invalid(
            ValidationConfidence::Weak,
            "no international or trunk prefix",
        )
    }
}

/// Validate a date expression
///
/// Tries the formats in use across EN/FR/DE documents and requires the date
/// to be a real calendar day within a plausible window.
pub fn validate_date(text: &str) -> ValidationResult {
    const FORMATS: &[&str] = &[
        "%d.%m.%Y",
        "%d.%m.%y",
        "%d/%m/%Y",
        "%d-%m-%Y",
        "%Y-%m-%d",
        "%d %B %Y",
        "%B %d, %Y",
    ];

    let trimmed = text.trim();
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            let year = chrono::Datelike::year(&date);
            if (1900..=2100).contains(&year) {
                return ValidationResult::valid(ValidationConfidence::FormatValid);
            }
            return ValidationResult::invalid(
                ValidationConfidence::Weak,
                "implausible year",
            );
        }
    }

    ValidationResult::invalid(ValidationConfidence::InvalidFormat, "unparseable date")
}

/// Street designators across the supported languages
const STREET_KEYWORDS: &[&str] = &[
    "strasse", "straße", "str.", "gasse", "weg", "platz", "allee", "ring",
    "rue", "avenue", "av.", "chemin", "ch.", "boulevard", "bd", "quai", "place",
    "via", "viale", "piazza", "corso",
    "street", "road", "lane", "drive",
];

/// Validate a street-name candidate by designator keyword
pub fn validate_street(text: &str) -> ValidationResult {
    let lower = text.trim().to_lowercase();
    if lower.len() < 3 {
        return ValidationResult::invalid(ValidationConfidence::InvalidFormat, "too short");
    }

    let has_keyword = STREET_KEYWORDS.iter().any(|k| {
        lower.starts_with(k)
            || lower.ends_with(k)
            || lower.contains(&format!(" {k} "))
            || lower.contains(&format!("{k} "))
            || lower.ends_with(&format!(" {k}"))
    });

    if has_keyword {
        ValidationResult::valid(ValidationConfidence::Standard)
    } else {
        ValidationResult::valid(ValidationConfidence::Weak)
    }
}
