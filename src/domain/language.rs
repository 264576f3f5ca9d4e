//! Language, country, and document type enumerations

use serde::{Deserialize, Serialize};

/// Supported document languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    En,
    /// French
    Fr,
    /// German
    De,
}

impl Language {
    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
            Self::De => "de",
        }
    }

    /// Parse from an ISO 639-1 code (case-insensitive)
    pub fn parse(code: &str) -> Option<Self> {
        match code.to_lowercase().as_str() {
            "en" => Some(Self::En),
            "fr" => Some(Self::Fr),
            "de" => Some(Self::De),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Jurisdictions a recognizer can be scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Country {
    /// Switzerland
    Ch,
    /// Germany
    De,
    /// France
    Fr,
    /// Italy
    It,
    /// Austria
    At,
}

impl Country {
    /// ISO 3166-1 alpha-2 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ch => "CH",
            Self::De => "DE",
            Self::Fr => "FR",
            Self::It => "IT",
            Self::At => "AT",
        }
    }

    /// Parse from an ISO 3166-1 alpha-2 code (case-insensitive)
    pub fn parse(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "CH" => Some(Self::Ch),
            "DE" => Some(Self::De),
            "FR" => Some(Self::Fr),
            "IT" => Some(Self::It),
            "AT" => Some(Self::At),
            _ => None,
        }
    }
}

/// Geographic scope of a recognizer, used as the secondary tiebreak when
/// two recognizers claim the same entity type at equal priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specificity {
    /// Applies everywhere
    Global,
    /// Applies to a multi-country region (e.g. EU)
    Regional,
    /// Applies to a single country
    CountrySpecific,
}

/// Document type hint supplied by the caller
///
/// Drives type-specific minimum-confidence rules in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Invoice,
    Letter,
    Form,
    Contract,
    Report,
    Unknown,
}

impl DocumentType {
    /// Minimum confidence an entity must reach for this document type.
    ///
    /// `Unknown` uses the conservative 0.4 floor.
    pub fn min_confidence(&self) -> f64 {
        match self {
            Self::Invoice | Self::Form => 0.5,
            Self::Letter | Self::Contract | Self::Report => 0.45,
            Self::Unknown => 0.4,
        }
    }

    /// Label used in the mapping record
    pub fn label(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Letter => "letter",
            Self::Form => "form",
            Self::Contract => "contract",
            Self::Report => "report",
            Self::Unknown => "unknown",
        }
    }
}

impl Default for DocumentType {
    fn default() -> Self {
        Self::Unknown
    }
}
