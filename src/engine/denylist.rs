//! Deny-list filtering of known false positives
//!
//! Table headers, acronyms, and boilerplate terms routinely match PII
//! patterns. The deny list rejects them in three scopes, checked in order:
//! global (any type, any language), type-scoped, then language-scoped.
//! String entries compare case-insensitively after trimming; regex entries
//! test the untrimmed original text.

use crate::domain::{CloakError, EntityType, Language, Result};
use std::collections::HashMap;

/// A single deny entry
#[derive(Debug)]
pub enum DenyPattern {
    /// Matched by trimmed, case-insensitive equality
    Literal(String),
    /// Matched against the untrimmed original text
    Regex(fancy_regex::Regex),
}

impl DenyPattern {
    /// Compile a literal entry
    pub fn literal(s: impl Into<String>) -> Self {
        Self::Literal(s.into().trim().to_lowercase())
    }

    /// Compile a regex entry
    pub fn regex(pattern: &str) -> Result<Self> {
        let compiled = fancy_regex::Regex::new(pattern)
            .map_err(|e| CloakError::Configuration(format!("invalid deny regex: {e}")))?;
        Ok(Self::Regex(compiled))
    }

    fn matches(&self, text: &str) -> Result<bool> {
        match self {
            Self::Literal(expected) => Ok(text.trim().to_lowercase() == *expected),
            Self::Regex(regex) => regex
                .is_match(text)
                .map_err(|e| CloakError::Other(format!("deny regex evaluation failed: {e}"))),
        }
    }
}

/// Three-scope deny list
#[derive(Debug, Default)]
pub struct DenyList {
    global: Vec<DenyPattern>,
    by_type: HashMap<EntityType, Vec<DenyPattern>>,
    by_language: HashMap<Language, Vec<DenyPattern>>,
}

impl DenyList {
    /// An empty deny list
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in deny list for the supported document corpus
    pub fn with_defaults() -> Self {
        let mut list = Self::new();

        for term in ["n/a", "none", "unknown", "xxx", "tbd"] {
            list.add_global(DenyPattern::literal(term));
        }

        // Invoice/table vocabulary that name recognizers keep tripping on
        for term in [
            "montant", "betrag", "total", "subtotal", "zwischensumme", "rechnung",
            "facture", "invoice", "mwst", "tva", "iva", "konto", "datum", "quantité",
            "menge", "position", "artikel",
        ] {
            list.add_for_type(EntityType::PersonName, DenyPattern::literal(term));
        }

        for term in ["bank", "post", "swift", "bic"] {
            list.add_for_type(EntityType::Organization, DenyPattern::literal(term));
        }

        // Header words that pattern-match as cities
        for term in ["ort", "lieu", "place"] {
            list.add_for_type(EntityType::City, DenyPattern::literal(term));
        }

        list
    }

    /// Add a global entry
    pub fn add_global(&mut self, pattern: DenyPattern) {
        self.global.push(pattern);
    }

    /// Add a type-scoped entry
    pub fn add_for_type(&mut self, entity_type: EntityType, pattern: DenyPattern) {
        self.by_type.entry(entity_type).or_default().push(pattern);
    }

    /// Add a language-scoped entry
    pub fn add_for_language(&mut self, language: Language, pattern: DenyPattern) {
        self.by_language.entry(language).or_default().push(pattern);
    }

    /// Check whether a detected text is a known false positive
    ///
    /// Scopes are consulted in order: global, type, language. The first hit
    /// wins.
    pub fn is_denied(&self, text: &str, entity_type: &EntityType, language: Language) -> Result<bool> {
        for pattern in &self.global {
            if pattern.matches(text)? {
                return Ok(true);
            }
        }
        if let Some(patterns) = self.by_type.get(entity_type) {
            for pattern in patterns {
                if pattern.matches(text)? {
                    return Ok(true);
                }
            }
        }
        if let Some(patterns) = self.by_language.get(&language) {
            for pattern in patterns {
                if pattern.matches(text)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}
