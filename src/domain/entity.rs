//! PII entity data models

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// PII entity type covering identity, financial, and address components
/// across the supported jurisdictions (Swiss/EU)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    /// Person names (first, middle, last)
    PersonName,
    /// Organization/company names
    Organization,
    /// Email addresses
    Email,
    /// Telephone numbers
    Phone,
    /// International Bank Account Numbers
    Iban,
    /// National identification numbers (Swiss AHV)
    NationalId,
    /// VAT registration numbers
    VatNumber,
    /// Date expressions
    Date,
    /// Street name component of an address
    StreetName,
    /// House/building number component of an address
    StreetNumber,
    /// Postal code component of an address
    PostalCode,
    /// City component of an address
    City,
    /// Country component of an address
    Country,
    /// Grouped full address (street + number + postal + city [+ country])
    Address,
    /// Any other entity type, carried by label
    Other(String),
}

impl EntityType {
    /// Get the placeholder label for this type
    pub fn label(&self) -> &str {
        match self {
            Self::PersonName => "PERSON_NAME",
            Self::Organization => "ORGANIZATION",
            Self::Email => "EMAIL",
            Self::Phone => "PHONE",
            Self::Iban => "IBAN",
            Self::NationalId => "NATIONAL_ID",
            Self::VatNumber => "VAT_NUMBER",
            Self::Date => "DATE",
            Self::StreetName => "STREET_NAME",
            Self::StreetNumber => "STREET_NUMBER",
            Self::PostalCode => "POSTAL_CODE",
            Self::City => "CITY",
            Self::Country => "COUNTRY",
            Self::Address => "ADDRESS",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Parse an entity type from a label string
    ///
    /// BIO prefixes (`B-`, `I-`) and common classifier aliases are accepted.
    pub fn parse_label(label: &str) -> Self {
        let stripped = label
            .strip_prefix("B-")
            .or_else(|| label.strip_prefix("I-"))
            .unwrap_or(label);
        match stripped.to_uppercase().as_str() {
            "PERSON_NAME" | "PERSON" | "PER" | "NAME" => Self::PersonName,
            "ORGANIZATION" | "ORG" => Self::Organization,
            "EMAIL" => Self::Email,
            "PHONE" | "TEL" | "TELEPHONE" => Self::Phone,
            "IBAN" => Self::Iban,
            "NATIONAL_ID" | "AHV" | "SSN" => Self::NationalId,
            "VAT_NUMBER" | "VAT" | "UID" => Self::VatNumber,
            "DATE" | "TIME" => Self::Date,
            "STREET_NAME" | "STREET" => Self::StreetName,
            "STREET_NUMBER" | "HOUSE_NUMBER" => Self::StreetNumber,
            "POSTAL_CODE" | "ZIP" | "PLZ" | "NPA" => Self::PostalCode,
            "CITY" | "LOC" | "LOCATION" => Self::City,
            "COUNTRY" => Self::Country,
            "ADDRESS" => Self::Address,
            other => Self::Other(other.to_string()),
        }
    }

    /// Check if this type is an address component
    pub fn is_address_component(&self) -> bool {
        matches!(
            self,
            Self::StreetName | Self::StreetNumber | Self::PostalCode | Self::City | Self::Country
        )
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Detection source of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    /// Pattern/rule-based recognizer
    Rule,
    /// Token-classification model
    Ml,
    /// Confirmed by both rule and ML detection
    Both,
    /// Added by a reviewer
    Manual,
}

impl DetectionSource {
    /// Ranking used by consolidation: `Both` outranks single sources
    pub fn rank(&self) -> u8 {
        match self {
            Self::Manual => 3,
            Self::Both => 2,
            Self::Rule | Self::Ml => 1,
        }
    }
}

/// A detected PII entity with its position in the normalized document text
///
/// Entities are immutable once produced by a pass; confidence adjustments go
/// through [`Entity::with_confidence`], which returns a new value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Surface text as it appears in the document
    pub text: String,
    /// Entity type
    pub entity_type: EntityType,
    /// Start byte offset in the normalized text
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,
    /// How the entity was detected
    pub source: DetectionSource,
    /// Name of the recognizer that produced the entity, if rule-based
    pub recognizer: Option<String>,
    /// Pass-scoped annotations (validation reason, context hits, ...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Entity {
    /// Create a new entity with a clamped confidence
    pub fn new(
        text: impl Into<String>,
        entity_type: EntityType,
        start: usize,
        end: usize,
        confidence: f64,
        source: DetectionSource,
    ) -> Self {
        Self {
            text: text.into(),
            entity_type,
            start,
            end,
            confidence: confidence.clamp(0.0, 1.0),
            source,
            recognizer: None,
            metadata: HashMap::new(),
        }
    }

    /// Create a manual entity (reviewer-supplied, confidence 1.0)
    pub fn manual(text: impl Into<String>, entity_type: EntityType, start: usize, end: usize) -> Self {
        Self::new(text, entity_type, start, end, 1.0, DetectionSource::Manual)
    }

    /// Set the originating recognizer name
    pub fn with_recognizer(mut self, name: impl Into<String>) -> Self {
        self.recognizer = Some(name.into());
        self
    }

    /// Return a copy with an adjusted, clamped confidence
    pub fn with_confidence(&self, confidence: f64) -> Self {
        let mut copy = self.clone();
        copy.confidence = confidence.clamp(0.0, 1.0);
        copy
    }

    /// Return a copy with an added metadata annotation
    pub fn with_annotation(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.metadata.insert(key.into(), value.into());
        copy
    }

    /// Span length in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span is empty
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Check if this entity's span overlaps another's
    pub fn overlaps(&self, other: &Entity) -> bool {
        !(self.end <= other.start || other.end <= self.start)
    }

    /// Check if this entity's span fully contains another's
    pub fn contains(&self, other: &Entity) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}
