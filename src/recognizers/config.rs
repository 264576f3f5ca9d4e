//! Declarative recognizer configuration
//!
//! Recognizers are described in TOML and compiled into the registry at
//! startup — the extension point for adding a jurisdiction without
//! recompiling the engine. Entries are validated individually: a bad regex
//! or unknown validator rejects that entry with a reason and the rest of
//! the file still loads.

use super::Recognizer;
use crate::domain::{CloakError, Country, EntityType, Language, Result, Specificity};
use crate::engine::context::{ContextWord, Polarity};
use crate::validators::ValidatorKind;
use serde::Deserialize;
use std::path::Path;

/// One recognizer entry as written in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RecognizerSpec {
    pub name: String,
    pub entity_type: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_specificity")]
    pub specificity: Specificity,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub deny_patterns: Vec<String>,
    #[serde(default)]
    pub context_words: Vec<ContextWordSpec>,
    pub validator: Option<String>,
    #[serde(default = "default_true")]
    pub use_global_context: bool,
    #[serde(default = "default_true")]
    pub use_global_deny_list: bool,
}

fn default_specificity() -> Specificity {
    Specificity::Global
}

fn default_confidence() -> f64 {
    0.6
}

fn default_true() -> bool {
    true
}

/// Context word entry as written in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ContextWordSpec {
    pub word: String,
    pub weight: f64,
    #[serde(default = "default_polarity")]
    pub polarity: Polarity,
}

fn default_polarity() -> Polarity {
    Polarity::Positive
}

#[derive(Debug, Deserialize)]
struct RecognizerFile {
    #[serde(default)]
    recognizers: Vec<RecognizerSpec>,
}

/// An entry that failed validation, with the reason it was rejected
#[derive(Debug, Clone)]
pub struct RejectedRecognizer {
    pub name: String,
    pub reason: String,
}

/// Result of loading a recognizer file: compiled entries plus individual
/// rejections
#[derive(Debug)]
pub struct LoadOutcome {
    pub recognizers: Vec<Recognizer>,
    pub rejected: Vec<RejectedRecognizer>,
}

/// Load recognizers from TOML content
///
/// The file itself must parse; individual entries that fail to compile are
/// collected in [`LoadOutcome::rejected`] instead of failing the load.
pub fn load_from_toml(content: &str) -> Result<LoadOutcome> {
    let file: RecognizerFile = toml::from_str(content)?;

    let mut outcome = LoadOutcome {
        recognizers: Vec::with_capacity(file.recognizers.len()),
        rejected: Vec::new(),
    };

    for spec in file.recognizers {
        let name = spec.name.clone();
        match compile_spec(spec) {
            Ok(recognizer) => outcome.recognizers.push(recognizer),
            Err(e) => {
                tracing::warn!(recognizer = %name, error = %e, "Recognizer entry rejected");
                outcome.rejected.push(RejectedRecognizer {
                    name,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(outcome)
}

/// Load recognizers from a TOML file on disk
pub fn load_from_file(path: impl AsRef<Path>) -> Result<LoadOutcome> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        CloakError::Configuration(format!(
            "Failed to read recognizer file {}: {e}",
            path.display()
        ))
    })?;
    load_from_toml(&content)
}

fn compile_spec(spec: RecognizerSpec) -> Result<Recognizer> {
    if spec.patterns.is_empty() {
        return Err(CloakError::Recognizer {
            recognizer: spec.name,
            reason: "no patterns defined".to_string(),
        });
    }
    if !(0.0..=1.0).contains(&spec.confidence) {
        return Err(CloakError::Recognizer {
            recognizer: spec.name,
            reason: format!("confidence {} outside [0, 1]", spec.confidence),
        });
    }

    let entity_type = EntityType::parse_label(&spec.entity_type);

    let mut languages = Vec::with_capacity(spec.languages.len());
    for code in &spec.languages {
        let language = Language::parse(code).ok_or_else(|| CloakError::Recognizer {
            recognizer: spec.name.clone(),
            reason: format!("unknown language '{code}'"),
        })?;
        languages.push(language);
    }

    let mut countries = Vec::with_capacity(spec.countries.len());
    for code in &spec.countries {
        let country = Country::parse(code).ok_or_else(|| CloakError::Recognizer {
            recognizer: spec.name.clone(),
            reason: format!("unknown country '{code}'"),
        })?;
        countries.push(country);
    }

    let validator = match &spec.validator {
        None => None,
        Some(name) => Some(ValidatorKind::parse(name).ok_or_else(|| CloakError::Recognizer {
            recognizer: spec.name.clone(),
            reason: format!("unknown validator '{name}'"),
        })?),
    };

    let context_words: Vec<ContextWord> = spec
        .context_words
        .iter()
        .map(|w| ContextWord {
            word: w.word.clone(),
            weight: w.weight.clamp(0.0, 1.0),
            polarity: w.polarity,
        })
        .collect();

    let mut recognizer = Recognizer::new(
        spec.name,
        entity_type,
        &spec.patterns,
        &spec.deny_patterns,
        spec.confidence,
        spec.priority,
        spec.specificity,
    )?
    .with_languages(languages)
    .with_countries(countries)
    .with_context_words(context_words);

    if let Some(validator) = validator {
        recognizer = recognizer.with_validator(validator);
    }
    if !spec.use_global_context {
        recognizer = recognizer.without_global_context();
    }
    if !spec.use_global_deny_list {
        recognizer = recognizer.without_global_deny_list();
    }

    Ok(recognizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_valid_entry() {
        let toml = r#"
            [[recognizers]]
            name = "swiss_iban"
            entity_type = "IBAN"
            languages = ["de", "fr"]
            countries = ["CH"]
            priority = 10
            specificity = "country_specific"
            confidence = 0.8
            patterns = ['\bCH\d{2}(?:\s?[A-Z0-9]{4}){4}\s?[A-Z0-9]\b']
            validator = "iban"

            [[recognizers.context_words]]
            word = "iban"
            weight = 0.9
        "#;

        let outcome = load_from_toml(toml).unwrap();
        assert_eq!(outcome.recognizers.len(), 1);
        assert!(outcome.rejected.is_empty());

        let recognizer = &outcome.recognizers[0];
        assert_eq!(recognizer.name, "swiss_iban");
        assert_eq!(recognizer.entity_type, EntityType::Iban);
        assert_eq!(recognizer.priority, 10);
        assert_eq!(recognizer.specificity, Specificity::CountrySpecific);
        assert_eq!(recognizer.context_words.len(), 1);
        assert!(recognizer.validator.is_some());
    }

    #[test]
    fn test_bad_entry_rejected_individually() {
        let toml = r#"
            [[recognizers]]
            name = "broken"
            entity_type = "EMAIL"
            patterns = ['([unclosed']

            [[recognizers]]
            name = "fine"
            entity_type = "EMAIL"
            patterns = ['[a-z]+@[a-z]+\.[a-z]{2,}']
        "#;

        let outcome = load_from_toml(toml).unwrap();
        assert_eq!(outcome.recognizers.len(), 1);
        assert_eq!(outcome.recognizers[0].name, "fine");
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].name, "broken");
        assert!(outcome.rejected[0].reason.contains("invalid pattern"));
    }

    #[test]
    fn test_unknown_validator_rejected() {
        let toml = r#"
            [[recognizers]]
            name = "mystery"
            entity_type = "IBAN"
            patterns = ['\d+']
            validator = "luhn"
        "#;

        let outcome = load_from_toml(toml).unwrap();
        assert!(outcome.recognizers.is_empty());
        assert!(outcome.rejected[0].reason.contains("unknown validator"));
    }

    #[test]
    fn test_unknown_language_rejected() {
        let toml = r#"
            [[recognizers]]
            name = "spanish"
            entity_type = "EMAIL"
            languages = ["es"]
            patterns = ['\d+']
        "#;

        let outcome = load_from_toml(toml).unwrap();
        assert!(outcome.recognizers.is_empty());
        assert!(outcome.rejected[0].reason.contains("unknown language"));
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let toml = r#"
            [[recognizers]]
            name = "overconfident"
            entity_type = "EMAIL"
            confidence = 1.5
            patterns = ['\d+']
        "#;

        let outcome = load_from_toml(toml).unwrap();
        assert!(outcome.recognizers.is_empty());
        assert!(outcome.rejected[0].reason.contains("outside [0, 1]"));
    }

    #[test]
    fn test_whole_file_parse_error_fails_load() {
        let err = load_from_toml("this is not toml at all [").unwrap_err();
        assert!(matches!(err, CloakError::Configuration(_)));
    }
}
