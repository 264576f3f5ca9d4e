//! VAT registration number validation
//!
//! Each supported country uses its own modulus check:
//! - `CHE` (Swiss UID): weights 5,4,3,2,7,6,5,4 over the first eight digits,
//!   check = 11 − (sum mod 11), where 11 maps to 0 and 10 is invalid.
//! - `DE`: ISO 7064 MOD 11,10 iterative product over the first eight digits.
//! - `FR`: two-digit key = (12 + 3 × (SIREN mod 97)) mod 97.
//!
//! `ATU`/`IT` numbers are recognized by shape only and score as
//! format-valid without a checksum claim.

use crate::domain::{ValidationConfidence, ValidationResult};

/// Validate a VAT number, dispatching on the country prefix
pub fn validate(text: &str) -> ValidationResult {
    let mut compact: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase();

    // Swiss numbers may carry a legal-form suffix (CHE-...-MWST / TVA / IVA)
    for suffix in ["MWST", "TVA", "IVA"] {
        if let Some(stripped) = compact.strip_suffix(suffix) {
            compact = stripped.to_string();
            break;
        }
    }

    if compact.starts_with("CHE") {
        validate_swiss(&compact[3..])
    } else if let Some(rest) = compact.strip_prefix("ATU") {
        validate_shape_only(rest, 8)
    } else if let Some(rest) = compact.strip_prefix("DE") {
        validate_german(rest)
    } else if let Some(rest) = compact.strip_prefix("FR") {
        validate_french(rest)
    } else if let Some(rest) = compact.strip_prefix("IT") {
        validate_shape_only(rest, 11)
    } else {
        ValidationResult::invalid(
            ValidationConfidence::InvalidFormat,
            "unknown country prefix",
        )
    }
}

fn digits_of(s: &str) -> Option<Vec<u32>> {
    s.chars().map(|c| c.to_digit(10)).collect()
}

/// Swiss UID: CHE + 9 digits
fn validate_swiss(body: &str) -> ValidationResult {
    let digits = match digits_of(body) {
        Some(d) if d.len() == 9 => d,
        _ => {
            return ValidationResult::invalid(
                ValidationConfidence::InvalidFormat,
                "expected 9 digits after CHE",
            )
        }
    };

    const WEIGHTS: [u32; 8] = [5, 4, 3, 2, 7, 6, 5, 4];
    let sum: u32 = digits[..8]
        .iter()
        .zip(WEIGHTS.iter())
        .map(|(d, w)| d * w)
        .sum();
    let check = match sum % 11 {
        0 => 0,
        r if 11 - r == 10 => {
            return ValidationResult::invalid(
                ValidationConfidence::Failed,
                "checksum undefined for this number",
            )
        }
        r => 11 - r,
    };

    if check == digits[8] {
        ValidationResult::valid(ValidationConfidence::ChecksumValid)
    } else {
        ValidationResult::invalid(ValidationConfidence::Failed, "checksum failed")
    }
}

/// German VAT: DE + 9 digits, ISO 7064 MOD 11,10
fn validate_german(body: &str) -> ValidationResult {
    let digits = match digits_of(body) {
        Some(d) if d.len() == 9 => d,
        _ => {
            return ValidationResult::invalid(
                ValidationConfidence::InvalidFormat,
                "expected 9 digits after DE",
            )
        }
    };

    let mut product: u32 = 10;
    for d in &digits[..8] {
        let mut sum = (d + product) % 10;
        if sum == 0 {
            sum = 10;
        }
        product = (2 * sum) % 11;
    }
    let check = match 11 - product {
        10 => 0,
        c => c,
    };

    if check == digits[8] {
        ValidationResult::valid(ValidationConfidence::ChecksumValid)
    } else {
        ValidationResult::invalid(ValidationConfidence::Failed, "checksum failed")
    }
}

/// French VAT: FR + 2-digit key + 9-digit SIREN
fn validate_french(body: &str) -> ValidationResult {
    let digits = match digits_of(body) {
        Some(d) if d.len() == 11 => d,
        _ => {
            return ValidationResult::invalid(
                ValidationConfidence::InvalidFormat,
                "expected 11 digits after FR",
            )
        }
    };

    let key = digits[0] * 10 + digits[1];
    let siren: u64 = digits[2..].iter().fold(0u64, |acc, d| acc * 10 + *d as u64);
    let expected = (12 + 3 * (siren % 97)) % 97;

    if key as u64 == expected {
        ValidationResult::valid(ValidationConfidence::ChecksumValid)
    } else {
        ValidationResult::invalid(ValidationConfidence::Failed, "checksum failed")
    }
}

/// Shape-only countries: digit count must match, no checksum claim
fn validate_shape_only(body: &str, expected_len: usize) -> ValidationResult {
    match digits_of(body) {
        Some(d) if d.len() == expected_len => {
            ValidationResult::valid(ValidationConfidence::FormatValid)
        }
        _ => ValidationResult::invalid(
            ValidationConfidence::InvalidFormat,
            format!("expected {expected_len} digits"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("CHE-123.456.788"; "swiss dotted")]
    #[test_case("CHE123456788 MWST"; "swiss with mwst suffix")]
    #[test_case("CHE-123.456.788 TVA"; "swiss with tva suffix")]
    #[test_case("DE136695976"; "german")]
    #[test_case("FR40303265045"; "french")]
    fn checksum_valid_numbers(vat: &str) {
        let result = validate(vat);
        assert!(result.is_valid, "expected valid: {vat}");
        assert_eq!(result.confidence, ValidationConfidence::ChecksumValid);
    }

    #[test_case("CHE-123.456.789"; "swiss wrong check")]
    #[test_case("DE136695977"; "german wrong check")]
    #[test_case("FR41303265045"; "french wrong key")]
    fn checksum_failures(vat: &str) {
        let result = validate(vat);
        assert!(!result.is_valid);
        assert_eq!(result.confidence, ValidationConfidence::Failed);
        assert_eq!(result.reason.as_deref(), Some("checksum failed"));
    }

    #[test]
    fn shape_only_countries_are_format_valid() {
        let result = validate("ATU12345678");
        assert!(result.is_valid);
        assert_eq!(result.confidence, ValidationConfidence::FormatValid);

        let result = validate("IT12345678901");
        assert!(result.is_valid);
        assert_eq!(result.confidence, ValidationConfidence::FormatValid);
    }

    #[test_case("CHE-123.456"; "swiss short")]
    #[test_case("DE1366959"; "german short")]
    #[test_case("XX123456789"; "unknown prefix")]
    fn format_rejections(vat: &str) {
        let result = validate(vat);
        assert!(!result.is_valid);
        assert_eq!(result.confidence, ValidationConfidence::InvalidFormat);
    }
}
