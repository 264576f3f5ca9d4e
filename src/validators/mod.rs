//! Format and checksum validators
//!
//! Validators are pure functions over candidate text. Each returns a
//! [`ValidationResult`] whose confidence comes from the fixed scale in
//! [`crate::domain::confidence`] — never an arbitrary float. The
//! [`ValidatorKind`] enum is the closed set a recognizer can reference from
//! configuration.

pub mod ahv;
pub mod iban;
pub mod postal;
pub mod simple;
pub mod vat;

use crate::domain::ValidationResult;
use serde::{Deserialize, Serialize};

/// The closed set of validators a recognizer can attach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorKind {
    Iban,
    Ahv,
    Vat,
    PostalCode,
    Date,
    Email,
    Phone,
    Street,
}

impl ValidatorKind {
    /// Run the validator on candidate text
    pub fn validate(&self, text: &str) -> ValidationResult {
        match self {
            Self::Iban => iban::validate(text),
            Self::Ahv => ahv::validate(text),
            Self::Vat => vat::validate(text),
            Self::PostalCode => postal::validate(text),
            Self::Date => simple::validate_date(text),
            Self::Email => simple::validate_email(text),
            Self::Phone => simple::validate_phone(text),
            Self::Street => simple::validate_street(text),
        }
    }

    /// Parse a validator name from configuration
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "iban" => Some(Self::Iban),
            "ahv" | "national_id" => Some(Self::Ahv),
            "vat" | "vat_number" => Some(Self::Vat),
            "postal_code" | "postal" => Some(Self::PostalCode),
            "date" => Some(Self::Date),
            "email" => Some(Self::Email),
            "phone" => Some(Self::Phone),
            "street" => Some(Self::Street),
            _ => None,
        }
    }
}
