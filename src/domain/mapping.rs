//! Versioned mapping record
//!
//! The mapping record is the auditable output of one anonymization session:
//! every placeholder emitted into the anonymized text, the original value it
//! replaced, and — for grouped addresses — the structured components and
//! scoring factors behind the decision.
//!
//! Versioning is additive: new optional fields may appear in later versions,
//! existing fields never change meaning.

use crate::domain::entity::{DetectionSource, EntityType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current mapping record version
pub const MAPPING_RECORD_VERSION: &str = "1.1";

/// Structured address components captured for a grouped address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponents {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl AddressComponents {
    /// Number of populated components
    pub fn present_count(&self) -> usize {
        [
            self.street.is_some(),
            self.number.is_some(),
            self.postal.is_some(),
            self.city.is_some(),
            self.country.is_some(),
        ]
        .iter()
        .filter(|p| **p)
        .count()
    }
}

/// One simple (non-address) placeholder mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedEntity {
    /// Placeholder emitted into the anonymized text (e.g. `PERSON_NAME_1`)
    pub placeholder: String,
    /// Entity type
    pub entity_type: EntityType,
    /// Original text the placeholder replaced
    pub original_text: String,
    /// Final confidence after all passes
    pub confidence: f64,
    /// Detection source
    pub source: DetectionSource,
}

/// One grouped-address placeholder mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedAddress {
    /// Placeholder emitted into the anonymized text (e.g. `ADDRESS_1`)
    pub placeholder: String,
    /// Original address text covered by the union span
    pub original_text: String,
    /// Structured components
    pub components: AddressComponents,
    /// Composite confidence from address scoring
    pub confidence: f64,
    /// Country ordering pattern the components matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_matched: Option<String>,
    /// Human-readable factors that contributed to the score
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scoring_factors: Vec<String>,
    /// Below the review threshold: emit, but ask a reviewer
    pub flagged_for_review: bool,
    /// At or above the auto threshold: safe for unattended redaction
    pub auto_anonymize: bool,
}

/// Versioned mapping record produced alongside the anonymized text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingRecord {
    /// Record format version
    pub version: String,
    /// Session that produced this record
    pub session_id: Uuid,
    /// Document type the pipeline ran with
    pub document_type: String,
    /// Ordered pass names applied to the document
    pub detection_methods: Vec<String>,
    /// Simple entity mappings
    pub entities: Vec<MappedEntity>,
    /// Grouped address mappings
    pub addresses: Vec<MappedAddress>,
    /// Record creation time
    pub created_at: DateTime<Utc>,
}

impl MappingRecord {
    /// Create an empty record for a session
    pub fn new(session_id: Uuid, document_type: &str, detection_methods: Vec<String>) -> Self {
        Self {
            version: MAPPING_RECORD_VERSION.to_string(),
            session_id,
            document_type: document_type.to_string(),
            detection_methods,
            entities: Vec::new(),
            addresses: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Total number of placeholders in the record
    pub fn total_mappings(&self) -> usize {
        self.entities.len() + self.addresses.len()
    }

    /// Look up the original text behind a placeholder
    pub fn original_for(&self, placeholder: &str) -> Option<&str> {
        self.entities
            .iter()
            .find(|e| e.placeholder == placeholder)
            .map(|e| e.original_text.as_str())
            .or_else(|| {
                self.addresses
                    .iter()
                    .find(|a| a.placeholder == placeholder)
                    .map(|a| a.original_text.as_str())
            })
    }
}
