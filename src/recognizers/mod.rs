//! Pattern-based recognizers and the recognizer registry
//!
//! A [`Recognizer`] is a compiled set of regex patterns plus metadata:
//! language/country scope, priority, specificity, deny patterns, context
//! words, and an optional validator. The [`RecognizerRegistry`] holds one
//! recognizer per entity type, resolving registration conflicts by priority
//! and then specificity, and isolates per-recognizer failures during
//! analysis so one bad pattern can never abort a document.

pub mod builtin;
pub mod config;

use crate::domain::{
    CloakError, Country, DetectionSource, Entity, EntityType, Language, Result, Specificity,
};
use crate::engine::context::ContextWord;
use crate::validators::ValidatorKind;
use regex::Regex;
use std::collections::HashMap;

/// A compiled pattern-based recognizer for one entity type
#[derive(Debug, Clone)]
pub struct Recognizer {
    /// Unique recognizer name (used in logs and entity provenance)
    pub name: String,
    /// Entity type this recognizer emits
    pub entity_type: EntityType,
    /// Languages the recognizer applies to; empty means all
    pub languages: Vec<Language>,
    /// Countries the recognizer is scoped to; empty means all
    pub countries: Vec<Country>,
    /// Conflict-resolution priority (higher wins)
    pub priority: i32,
    /// Geographic specificity, the tiebreak at equal priority
    pub specificity: Specificity,
    /// Base confidence attached to raw pattern matches
    pub confidence: f64,
    /// Compiled match patterns
    patterns: Vec<Regex>,
    /// Recognizer-scoped deny patterns (support look-around)
    deny_patterns: Vec<fancy_regex::Regex>,
    /// Context words contributed to the context-scoring pass
    pub context_words: Vec<ContextWord>,
    /// Validator applied during the validation pass
    pub validator: Option<ValidatorKind>,
    /// Whether the global context-word defaults also apply
    pub use_global_context: bool,
    /// Whether the global deny list also applies
    pub use_global_deny_list: bool,
}

impl Recognizer {
    /// Build a recognizer, compiling its patterns
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        entity_type: EntityType,
        patterns: &[String],
        deny_patterns: &[String],
        confidence: f64,
        priority: i32,
        specificity: Specificity,
    ) -> Result<Self> {
        let name = name.into();
        let mut compiled = Vec::with_capacity(patterns.len());
        for p in patterns {
            let regex = Regex::new(p).map_err(|e| CloakError::Recognizer {
                recognizer: name.clone(),
                reason: format!("invalid pattern: {e}"),
            })?;
            compiled.push(regex);
        }

        let mut compiled_deny = Vec::with_capacity(deny_patterns.len());
        for p in deny_patterns {
            let regex = fancy_regex::Regex::new(p).map_err(|e| CloakError::Recognizer {
                recognizer: name.clone(),
                reason: format!("invalid deny pattern: {e}"),
            })?;
            compiled_deny.push(regex);
        }

        Ok(Self {
            name,
            entity_type,
            languages: Vec::new(),
            countries: Vec::new(),
            priority,
            specificity,
            confidence: confidence.clamp(0.0, 1.0),
            patterns: compiled,
            deny_patterns: compiled_deny,
            context_words: Vec::new(),
            validator: None,
            use_global_context: true,
            use_global_deny_list: true,
        })
    }

    /// Restrict to specific languages
    pub fn with_languages(mut self, languages: Vec<Language>) -> Self {
        self.languages = languages;
        self
    }

    /// Restrict to specific countries
    pub fn with_countries(mut self, countries: Vec<Country>) -> Self {
        self.countries = countries;
        self
    }

    /// Attach context words
    pub fn with_context_words(mut self, words: Vec<ContextWord>) -> Self {
        self.context_words = words;
        self
    }

    /// Attach a validator
    pub fn with_validator(mut self, validator: ValidatorKind) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Opt out of global context words
    pub fn without_global_context(mut self) -> Self {
        self.use_global_context = false;
        self
    }

    /// Opt out of the global deny list
    pub fn without_global_deny_list(mut self) -> Self {
        self.use_global_deny_list = false;
        self
    }

    /// Whether this recognizer applies to a document language
    pub fn supports_language(&self, language: Language) -> bool {
        self.languages.is_empty() || self.languages.contains(&language)
    }

    /// Run all patterns over the text, stripping recognizer-scoped denials
    pub fn analyze(&self, text: &str, language: Language) -> Result<Vec<Entity>> {
        if !self.supports_language(language) {
            return Ok(Vec::new());
        }

        let mut entities = Vec::new();
        for pattern in &self.patterns {
            for m in pattern.find_iter(text) {
                if self.is_denied(m.as_str())? {
                    continue;
                }
                entities.push(
                    Entity::new(
                        m.as_str(),
                        self.entity_type.clone(),
                        m.start(),
                        m.end(),
                        self.confidence,
                        DetectionSource::Rule,
                    )
                    .with_recognizer(&self.name),
                );
            }
        }
        Ok(entities)
    }

    /// Test recognizer-scoped deny patterns against a raw match
    fn is_denied(&self, matched: &str) -> Result<bool> {
        for deny in &self.deny_patterns {
            let hit = deny.is_match(matched).map_err(|e| CloakError::Recognizer {
                recognizer: self.name.clone(),
                reason: format!("deny pattern failed: {e}"),
            })?;
            if hit {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// What happened to a registration attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// No recognizer held the type yet
    Inserted,
    /// The new recognizer outranked and replaced the holder
    Replaced { previous: String },
    /// The existing holder outranked the candidate; nothing changed
    Kept { existing: String },
}

/// An isolated recognizer failure recorded during analysis
#[derive(Debug, Clone)]
pub struct RecognizerFailure {
    pub recognizer: String,
    pub reason: String,
}

/// Result of running every applicable recognizer over a document
#[derive(Debug, Default)]
pub struct AnalysisOutcome {
    pub entities: Vec<Entity>,
    pub failures: Vec<RecognizerFailure>,
}

/// Registry holding the winning recognizer per entity type
///
/// The registry is built once at engine construction and then frozen; a
/// frozen registry is immutable and safe to share across concurrent
/// pipeline runs.
#[derive(Debug, Default)]
pub struct RecognizerRegistry {
    recognizers: HashMap<EntityType, Recognizer>,
    frozen: bool,
}

impl RecognizerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recognizer for its entity type
    ///
    /// Registration is idempotent per type: on conflict the higher-priority
    /// entry wins, with specificity as tiebreak at equal priority. A frozen
    /// registry rejects all mutation.
    pub fn register(&mut self, recognizer: Recognizer) -> Result<RegisterOutcome> {
        if self.frozen {
            return Err(CloakError::Configuration(
                "registry is frozen; register before freeze()".to_string(),
            ));
        }

        match self.recognizers.get(&recognizer.entity_type) {
            None => {
                self.recognizers
                    .insert(recognizer.entity_type.clone(), recognizer);
                Ok(RegisterOutcome::Inserted)
            }
            Some(existing) => {
                let incoming_wins = recognizer.priority > existing.priority
                    || (recognizer.priority == existing.priority
                        && recognizer.specificity > existing.specificity);
                if incoming_wins {
                    let previous = existing.name.clone();
                    self.recognizers
                        .insert(recognizer.entity_type.clone(), recognizer);
                    Ok(RegisterOutcome::Replaced { previous })
                } else {
                    Ok(RegisterOutcome::Kept {
                        existing: existing.name.clone(),
                    })
                }
            }
        }
    }

    /// Forbid further mutation
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether the registry is frozen
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Clear all recognizers and unfreeze (test isolation)
    pub fn reset(&mut self) {
        self.recognizers.clear();
        self.frozen = false;
    }

    /// Recognizer registered for a type, if any
    pub fn get(&self, entity_type: &EntityType) -> Option<&Recognizer> {
        self.recognizers.get(entity_type)
    }

    /// All registered recognizers
    pub fn recognizers(&self) -> impl Iterator<Item = &Recognizer> {
        self.recognizers.values()
    }

    /// Number of registered recognizers
    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }

    /// Run every applicable recognizer over the text
    ///
    /// A recognizer failure is recorded and skipped; the rest of the batch
    /// still runs.
    pub fn analyze(&self, text: &str, language: Language) -> AnalysisOutcome {
        let mut outcome = AnalysisOutcome::default();
        // Deterministic recognizer order regardless of map iteration
        let mut ordered: Vec<&Recognizer> = self.recognizers.values().collect();
        ordered.sort_by(|a, b| a.name.cmp(&b.name));

        for recognizer in ordered {
            match recognizer.analyze(text, language) {
                Ok(entities) => outcome.entities.extend(entities),
                Err(e) => {
                    tracing::warn!(
                        recognizer = %recognizer.name,
                        error = %e,
                        "Recognizer failed; continuing without it"
                    );
                    outcome.failures.push(RecognizerFailure {
                        recognizer: recognizer.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        outcome.entities.sort_by_key(|e| (e.start, e.end));
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iban_recognizer(name: &str, priority: i32, specificity: Specificity) -> Recognizer {
        Recognizer::new(
            name,
            EntityType::Iban,
            &[r"\b[A-Z]{2}\d{2}(?:\s?[A-Z0-9]{4}){3,7}(?:\s?[A-Z0-9]{1,3})?\b".to_string()],
            &[],
            0.8,
            priority,
            specificity,
        )
        .unwrap()
    }

    #[test]
    fn test_register_and_analyze() {
        let mut registry = RecognizerRegistry::new();
        let outcome = registry
            .register(iban_recognizer("iban_generic", 5, Specificity::Global))
            .unwrap();
        assert_eq!(outcome, RegisterOutcome::Inserted);

        let result = registry.analyze("Konto: CH93 0076 2011 6238 5295 7", Language::De);
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.entities[0].entity_type, EntityType::Iban);
        assert_eq!(result.entities[0].source, DetectionSource::Rule);
        assert_eq!(result.entities[0].recognizer.as_deref(), Some("iban_generic"));
    }

    #[test]
    fn test_higher_priority_replaces() {
        let mut registry = RecognizerRegistry::new();
        registry
            .register(iban_recognizer("iban_generic", 5, Specificity::Global))
            .unwrap();
        let outcome = registry
            .register(iban_recognizer("iban_swiss", 10, Specificity::CountrySpecific))
            .unwrap();
        assert_eq!(
            outcome,
            RegisterOutcome::Replaced {
                previous: "iban_generic".to_string()
            }
        );
        assert_eq!(registry.get(&EntityType::Iban).unwrap().name, "iban_swiss");
    }

    #[test]
    fn test_specificity_breaks_priority_tie() {
        let mut registry = RecognizerRegistry::new();
        registry
            .register(iban_recognizer("iban_generic", 5, Specificity::Global))
            .unwrap();
        let outcome = registry
            .register(iban_recognizer("iban_swiss", 5, Specificity::CountrySpecific))
            .unwrap();
        assert!(matches!(outcome, RegisterOutcome::Replaced { .. }));

        // Lower specificity at equal priority is kept out
        let outcome = registry
            .register(iban_recognizer("iban_region", 5, Specificity::Regional))
            .unwrap();
        assert_eq!(
            outcome,
            RegisterOutcome::Kept {
                existing: "iban_swiss".to_string()
            }
        );
    }

    #[test]
    fn test_frozen_registry_rejects_mutation() {
        let mut registry = RecognizerRegistry::new();
        registry
            .register(iban_recognizer("iban_generic", 5, Specificity::Global))
            .unwrap();
        registry.freeze();
        assert!(registry.is_frozen());

        let err = registry
            .register(iban_recognizer("late", 99, Specificity::Global))
            .unwrap_err();
        assert!(matches!(err, CloakError::Configuration(_)));

        registry.reset();
        assert!(!registry.is_frozen());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_language_filter() {
        let mut registry = RecognizerRegistry::new();
        registry
            .register(
                iban_recognizer("iban_fr_only", 5, Specificity::CountrySpecific)
                    .with_languages(vec![Language::Fr]),
            )
            .unwrap();

        let hit = registry.analyze("IBAN FR14 2004 1010 0505 0001 3M02 606", Language::Fr);
        assert_eq!(hit.entities.len(), 1);

        let miss = registry.analyze("IBAN FR14 2004 1010 0505 0001 3M02 606", Language::De);
        assert!(miss.entities.is_empty());
    }

    #[test]
    fn test_recognizer_deny_pattern() {
        let recognizer = Recognizer::new(
            "postal",
            EntityType::PostalCode,
            &[r"\b[1-9]\d{3}\b".to_string()],
            // Years that look like postal codes
            &[r"^(?:19|20)\d{2}$".to_string()],
            0.6,
            5,
            Specificity::CountrySpecific,
        )
        .unwrap();

        let entities = recognizer.analyze("Zürich 8001, Jahr 2024", Language::De).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "8001");
    }

    #[test]
    fn test_invalid_pattern_is_rejected_at_build() {
        let err = Recognizer::new(
            "broken",
            EntityType::Email,
            &["([unclosed".to_string()],
            &[],
            0.5,
            1,
            Specificity::Global,
        )
        .unwrap_err();
        assert!(matches!(err, CloakError::Recognizer { .. }));
    }
}
