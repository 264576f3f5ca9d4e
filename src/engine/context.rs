//! Context-based confidence adjustment
//!
//! An entity's confidence is nudged up or down by lexical cues found in a
//! fixed-size character window around its span: field labels ("IBAN:",
//! "Tel."), salutations ("Herr", "Madame"), and table headers. Word lists
//! are merged from three sources — entity-type defaults, the recognizer's
//! own words, and caller-supplied runtime words at reduced weight. Runtime
//! region hints (column types, text regions) add a separate bounded boost.

use crate::domain::{Entity, EntityType, Language};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a context word supports or contradicts an entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
}

/// A weighted lexical cue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextWord {
    /// The cue, matched case-insensitively inside the window
    pub word: String,
    /// Weight in [0, 1]
    pub weight: f64,
    /// Additive sign
    pub polarity: Polarity,
}

impl ContextWord {
    /// A positive cue
    pub fn positive(word: impl Into<String>, weight: f64) -> Self {
        Self {
            word: word.into(),
            weight: weight.clamp(0.0, 1.0),
            polarity: Polarity::Positive,
        }
    }

    /// A negative cue
    pub fn negative(word: impl Into<String>, weight: f64) -> Self {
        Self {
            word: word.into(),
            weight: weight.clamp(0.0, 1.0),
            polarity: Polarity::Negative,
        }
    }
}

/// A caller-declared region whose entities of a given type get a boost
///
/// Front ends use these for tabular data ("column 3 holds IBANs") and for
/// regions identified by layout analysis (letterhead, signature block).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionHint {
    /// Region start offset in the normalized text
    pub start: usize,
    /// Region end offset (exclusive)
    pub end: usize,
    /// Entity type the hint vouches for
    pub entity_type: EntityType,
    /// Additional confidence, clamped to [0.0, 0.5]
    pub boost: f64,
}

/// Per-call context supplied by the consumer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeContext {
    /// Extra context words per entity type, applied at reduced weight
    #[serde(default)]
    pub words: HashMap<String, Vec<ContextWord>>,
    /// Declared regions
    #[serde(default)]
    pub region_hints: Vec<RegionHint>,
}

impl RuntimeContext {
    fn words_for(&self, entity_type: &EntityType) -> &[ContextWord] {
        self.words
            .get(entity_type.label())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// Outcome of enhancing one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Unchanged,
    Boosted,
    Penalized,
}

/// Context enhancer with built-in per-type, per-language defaults
#[derive(Debug)]
pub struct ContextEnhancer {
    window: usize,
    boost_factor: f64,
    boosted_floor: f64,
    runtime_weight_factor: f64,
    defaults: HashMap<EntityType, HashMap<Language, Vec<ContextWord>>>,
}

impl ContextEnhancer {
    /// Build an enhancer with the default cue lists
    pub fn new(window: usize, boost_factor: f64, boosted_floor: f64) -> Self {
        Self {
            window,
            boost_factor,
            boosted_floor,
            runtime_weight_factor: 0.5,
            defaults: default_context_words(),
        }
    }

    /// Adjust one entity's confidence from its surrounding context
    ///
    /// Returns the (possibly new) entity and what happened to it. With no
    /// matching cue and no region hit the entity is returned as-is —
    /// context never amplifies an entity on its own.
    pub fn enhance(
        &self,
        entity: &Entity,
        text: &str,
        language: Language,
        recognizer_words: &[ContextWord],
        use_defaults: bool,
        runtime: &RuntimeContext,
    ) -> (Entity, Adjustment) {
        let window = self.window_around(text, entity);
        let window_lower = window.to_lowercase();

        let mut delta = 0.0;
        let mut positive_hits = 0usize;
        let mut negative_hits = 0usize;

        let mut apply = |words: &[ContextWord], weight_factor: f64| {
            for cue in words {
                if window_lower.contains(&cue.word.to_lowercase()) {
                    let contribution = cue.weight * self.boost_factor * weight_factor;
                    match cue.polarity {
                        Polarity::Positive => {
                            delta += contribution;
                            positive_hits += 1;
                        }
                        Polarity::Negative => {
                            delta -= contribution;
                            negative_hits += 1;
                        }
                    }
                }
            }
        };

        if use_defaults {
            if let Some(by_language) = self.defaults.get(&entity.entity_type) {
                if let Some(words) = by_language.get(&language) {
                    apply(words, 1.0);
                }
            }
        }
        apply(recognizer_words, 1.0);
        apply(runtime.words_for(&entity.entity_type), self.runtime_weight_factor);

        // Region hints are positional, independent of the lexical window
        let mut region_boost = 0.0;
        for hint in &runtime.region_hints {
            if hint.entity_type == entity.entity_type
                && entity.start >= hint.start
                && entity.end <= hint.end
            {
                region_boost += hint.boost.clamp(0.0, 0.5);
            }
        }

        if positive_hits == 0 && negative_hits == 0 && region_boost == 0.0 {
            return (entity.clone(), Adjustment::Unchanged);
        }

        let mut confidence = (entity.confidence + delta + region_boost).clamp(0.0, 1.0);
        if (positive_hits > 0 || region_boost > 0.0) && confidence < self.boosted_floor {
            confidence = self.boosted_floor;
        }

        let adjustment = if confidence > entity.confidence {
            Adjustment::Boosted
        } else if confidence < entity.confidence {
            Adjustment::Penalized
        } else {
            Adjustment::Unchanged
        };

        let enhanced = entity
            .with_confidence(confidence)
            .with_annotation("context_hits", (positive_hits + negative_hits).to_string());
        (enhanced, adjustment)
    }

    /// Character window around an entity, clamped to char boundaries
    fn window_around<'t>(&self, text: &'t str, entity: &Entity) -> &'t str {
        let mut start = entity.start.saturating_sub(self.window);
        while start > 0 && !text.is_char_boundary(start) {
            start -= 1;
        }
        let mut end = (entity.end + self.window).min(text.len());
        while end < text.len() && !text.is_char_boundary(end) {
            end += 1;
        }
        &text[start..end]
    }
}

/// Built-in context cues per entity type and language
fn default_context_words() -> HashMap<EntityType, HashMap<Language, Vec<ContextWord>>> {
    let mut defaults: HashMap<EntityType, HashMap<Language, Vec<ContextWord>>> = HashMap::new();

    let mut add = |entity_type: EntityType, language: Language, words: Vec<ContextWord>| {
        defaults
            .entry(entity_type)
            .or_default()
            .insert(language, words);
    };

    add(
        EntityType::PersonName,
        Language::De,
        vec![
            ContextWord::positive("herr", 0.8),
            ContextWord::positive("frau", 0.8),
            ContextWord::positive("sehr geehrte", 0.9),
            ContextWord::positive("name", 0.5),
            ContextWord::negative("betrag", 0.8),
            ContextWord::negative("gesamt", 0.6),
        ],
    );
    add(
        EntityType::PersonName,
        Language::Fr,
        vec![
            ContextWord::positive("monsieur", 0.8),
            ContextWord::positive("madame", 0.8),
            ContextWord::positive("nom", 0.5),
            ContextWord::negative("montant", 0.8),
            ContextWord::negative("total", 0.6),
        ],
    );
    add(
        EntityType::PersonName,
        Language::En,
        vec![
            ContextWord::positive("mr", 0.7),
            ContextWord::positive("mrs", 0.7),
            ContextWord::positive("dear", 0.8),
            ContextWord::positive("name", 0.5),
            ContextWord::negative("amount", 0.8),
            ContextWord::negative("total", 0.6),
        ],
    );

    for language in [Language::En, Language::Fr, Language::De] {
        add(
            EntityType::Iban,
            language,
            vec![
                ContextWord::positive("iban", 0.9),
                ContextWord::positive("konto", 0.6),
                ContextWord::positive("compte", 0.6),
                ContextWord::positive("account", 0.6),
            ],
        );
        add(
            EntityType::Phone,
            language,
            vec![
                ContextWord::positive("tel", 0.8),
                ContextWord::positive("phone", 0.8),
                ContextWord::positive("fax", 0.6),
                ContextWord::positive("natel", 0.6),
            ],
        );
        add(
            EntityType::Email,
            language,
            vec![
                ContextWord::positive("e-mail", 0.8),
                ContextWord::positive("mail", 0.6),
                ContextWord::positive("courriel", 0.8),
            ],
        );
        add(
            EntityType::VatNumber,
            language,
            vec![
                ContextWord::positive("mwst", 0.8),
                ContextWord::positive("tva", 0.8),
                ContextWord::positive("vat", 0.8),
                ContextWord::positive("uid", 0.7),
            ],
        );
        add(
            EntityType::NationalId,
            language,
            vec![
                ContextWord::positive("ahv", 0.9),
                ContextWord::positive("avs", 0.9),
                ContextWord::positive("versichertennummer", 0.8),
                ContextWord::positive("assuré", 0.7),
            ],
        );
        add(
            EntityType::Date,
            language,
            vec![
                ContextWord::positive("datum", 0.6),
                ContextWord::positive("date", 0.6),
                ContextWord::negative("rechnung nr", 0.5),
            ],
        );
    }

    defaults
}
