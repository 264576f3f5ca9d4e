//! Swiss AHV (social insurance number) validation
//!
//! The new-format AHV number is 13 digits, printed `756.XXXX.XXXX.XX`. The
//! first three digits are the ISO 3166 country prefix 756 (Switzerland); the
//! last digit is an EAN-13 check digit over the preceding twelve.

use crate::domain::{ValidationConfidence, ValidationResult};

/// Validate a Swiss AHV number
pub fn validate(text: &str) -> ValidationResult {
    let digits: Vec<u32> = text.chars().filter_map(|c| c.to_digit(10)).collect();

    let separators_ok = text
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c.is_whitespace());
    if !separators_ok {
        return ValidationResult::invalid(
            ValidationConfidence::InvalidFormat,
            "invalid characters",
        );
    }

    if digits.len() != 13 {
        return ValidationResult::invalid(
            ValidationConfidence::InvalidFormat,
            "expected 13 digits",
        );
    }

    if digits[0] != 7 || digits[1] != 5 || digits[2] != 6 {
        return ValidationResult::invalid(
            ValidationConfidence::InvalidFormat,
            "missing 756 country prefix",
        );
    }

    let check = ean13_check_digit(&digits[..12]);
    if check == digits[12] {
        ValidationResult::valid(ValidationConfidence::ChecksumValid)
    } else {
        ValidationResult::invalid(ValidationConfidence::Failed, "checksum failed")
    }
}

/// EAN-13 check digit: alternating ×1/×3 weights from the left, mod 10
fn ean13_check_digit(digits: &[u32]) -> u32 {
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
        .sum();
    (10 - sum % 10) % 10
}
