//! IBAN checksum validation (ISO 7064 MOD97-10)

use crate::domain::{ValidationConfidence, ValidationResult};

/// Expected IBAN length per supported country
fn expected_length(country: &str) -> Option<usize> {
    match country {
        "AT" => Some(20),
        "CH" => Some(21),
        "DE" => Some(22),
        "FR" => Some(27),
        "IT" => Some(27),
        "LI" => Some(21),
        _ => None,
    }
}

/// Validate an IBAN
///
/// Whitespace is stripped before validation. The check moves the first four
/// characters to the end, maps letters to two-digit numbers (A=10 … Z=35),
/// and verifies the resulting number mod 97 equals 1.
pub fn validate(text: &str) -> ValidationResult {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if compact.len() < 15 || compact.len() > 34 {
        return ValidationResult::invalid(ValidationConfidence::InvalidFormat, "invalid length");
    }

    if !compact.chars().all(|c| c.is_ascii_alphanumeric()) {
        return ValidationResult::invalid(
            ValidationConfidence::InvalidFormat,
            "invalid characters",
        );
    }

    let country = &compact[..2];
    if !country.chars().all(|c| c.is_ascii_alphabetic()) {
        return ValidationResult::invalid(
            ValidationConfidence::InvalidFormat,
            "missing country prefix",
        );
    }

    match expected_length(country) {
        Some(len) if compact.len() != len => {
            return ValidationResult::invalid(
                ValidationConfidence::InvalidFormat,
                format!("wrong length for {country}"),
            );
        }
        Some(_) => {}
        None => {
            return ValidationResult::invalid(
                ValidationConfidence::Weak,
                format!("unsupported country {country}"),
            );
        }
    }

    if mod97(&compact) == 1 {
        ValidationResult::valid(ValidationConfidence::ChecksumValid)
    } else {
        ValidationResult::invalid(ValidationConfidence::Failed, "checksum failed")
    }
}

/// ISO 7064 MOD97-10 remainder of a rearranged IBAN
///
/// The numeric expansion exceeds u128 for long IBANs, so the remainder is
/// folded digit by digit.
fn mod97(compact: &str) -> u32 {
    let rearranged = format!("{}{}", &compact[4..], &compact[..4]);
    let mut remainder: u32 = 0;
    for c in rearranged.chars() {
        if let Some(d) = c.to_digit(10) {
            remainder = (remainder * 10 + d) % 97;
        } else {
            let value = c as u32 - 'A' as u32 + 10;
            remainder = (remainder * 100 + value) % 97;
        }
    }
    remainder
}
