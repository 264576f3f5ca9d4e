//! Sub-token merging for classifier output
//!
//! Token-classification models emit BIO-tagged sub-word tokens. This module
//! folds them back into complete entity spans: `B-X` opens an entity, `I-X`
//! of the same type extends it, anything else closes it. Confidence is the
//! running average of the merged token scores, and the entity text is
//! re-sliced from the original document — the tokenizer's own surface form
//! may not match original spacing or casing.

use crate::domain::{DetectionSource, Entity, EntityType};
use serde::{Deserialize, Serialize};

/// Minimum character length for a merged entity; anything shorter is noise
pub const MIN_ENTITY_LENGTH: usize = 2;

/// One classified token as returned by the model service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedToken {
    /// Tokenizer surface form (informational only)
    pub word: String,
    /// BIO tag: `B-X`, `I-X`, or `O`
    pub tag: String,
    /// Token-level score in [0, 1]
    pub score: f64,
    /// Start byte offset in the document text
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

struct OpenEntity {
    label: String,
    start: usize,
    end: usize,
    scores: Vec<f64>,
}

impl OpenEntity {
    fn close(self, text: &str, min_len: usize, out: &mut Vec<Entity>) {
        // Re-slice from the original document, not the tokenizer output
        let surface = match text.get(self.start..self.end) {
            Some(s) => s,
            None => return,
        };
        if surface.chars().count() < min_len {
            return;
        }
        let confidence = self.scores.iter().sum::<f64>() / self.scores.len() as f64;
        out.push(Entity::new(
            surface,
            EntityType::parse_label(&self.label),
            self.start,
            self.end,
            confidence,
            DetectionSource::Ml,
        ));
    }
}

/// Merge BIO-tagged tokens into complete entities
///
/// Idempotent on already-merged input: tokens that each carry a full entity
/// under a `B-X` tag pass through with unchanged spans.
pub fn merge_subword_tokens(tokens: &[ClassifiedToken], text: &str) -> Vec<Entity> {
    merge_with_min_length(tokens, text, MIN_ENTITY_LENGTH)
}

/// Merge with an explicit minimum entity length
pub fn merge_with_min_length(
    tokens: &[ClassifiedToken],
    text: &str,
    min_len: usize,
) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut open: Option<OpenEntity> = None;

    for token in tokens {
        if let Some(label) = token.tag.strip_prefix("I-") {
            if let Some(current) = open.as_mut() {
                if current.label == label {
                    current.end = token.end;
                    current.scores.push(token.score);
                    continue;
                }
            }
            // A continuation with nothing to continue: close whatever is
            // open and drop the dangling token
            if let Some(current) = open.take() {
                current.close(text, min_len, &mut entities);
            }
        } else if let Some(label) = token.tag.strip_prefix("B-") {
            if let Some(current) = open.take() {
                current.close(text, min_len, &mut entities);
            }
            open = Some(OpenEntity {
                label: label.to_string(),
                start: token.start,
                end: token.end,
                scores: vec![token.score],
            });
        } else {
            // `O` or malformed tag
            if let Some(current) = open.take() {
                current.close(text, min_len, &mut entities);
            }
        }
    }

    if let Some(current) = open.take() {
        current.close(text, min_len, &mut entities);
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(word: &str, tag: &str, score: f64, start: usize, end: usize) -> ClassifiedToken {
        ClassifiedToken {
            word: word.to_string(),
            tag: tag.to_string(),
            score,
            start,
            end,
        }
    }

    #[test]
    fn test_b_i_sequence_merges() {
        let text = "Hans Müller";
        let tokens = vec![
            token("Hans", "B-PER", 0.95, 0, 4),
            token("Müller", "I-PER", 0.92, 5, 12),
        ];

        let entities = merge_subword_tokens(&tokens, text);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "Hans Müller");
        assert_eq!(entities[0].entity_type, EntityType::PersonName);
        assert!((entities[0].confidence - 0.935).abs() < 1e-9);
        assert_eq!(entities[0].source, DetectionSource::Ml);
    }

    #[test]
    fn test_text_resliced_from_document_not_tokenizer() {
        // Tokenizer lowercased and split; spans must win over surface forms
        let text = "HANS Müller";
        let tokens = vec![
            token("hans", "B-PER", 0.9, 0, 4),
            token("##müller", "I-PER", 0.8, 5, 12),
        ];

        let entities = merge_subword_tokens(&tokens, text);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "HANS Müller");
    }

    #[test]
    fn test_o_token_closes() {
        let text = "Hans war in Bern";
        let tokens = vec![
            token("Hans", "B-PER", 0.9, 0, 4),
            token("war", "O", 0.99, 5, 8),
            token("Bern", "B-LOC", 0.85, 12, 16),
        ];

        let entities = merge_subword_tokens(&tokens, text);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].text, "Hans");
        assert_eq!(entities[1].text, "Bern");
        assert_eq!(entities[1].entity_type, EntityType::City);
    }

    #[test]
    fn test_type_change_closes_without_extending() {
        let text = "Hans Bern";
        let tokens = vec![
            token("Hans", "B-PER", 0.9, 0, 4),
            token("Bern", "I-LOC", 0.8, 5, 9),
        ];

        // The dangling I-LOC never opened; only the person survives
        let entities = merge_subword_tokens(&tokens, text);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "Hans");
    }

    #[test]
    fn test_idempotent_on_merged_input() {
        let text = "Hans Müller besucht Bern";
        let tokens = vec![
            token("Hans Müller", "B-PER", 0.935, 0, 12),
            token("Bern", "B-LOC", 0.85, 20, 24),
        ];

        let first = merge_subword_tokens(&tokens, text);
        let again: Vec<ClassifiedToken> = first
            .iter()
            .map(|e| token(&e.text, &format!("B-{}", e.entity_type.label()), e.confidence, e.start, e.end))
            .collect();
        let second = merge_subword_tokens(&again, text);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.start, b.start);
            assert_eq!(a.end, b.end);
            assert_eq!(a.text, b.text);
        }
    }

    #[test]
    fn test_short_entities_dropped() {
        let text = "M met N";
        let tokens = vec![
            token("M", "B-PER", 0.9, 0, 1),
            token("N", "B-PER", 0.9, 6, 7),
        ];

        let entities = merge_subword_tokens(&tokens, text);
        assert!(entities.is_empty());
    }

    #[test]
    fn test_invalid_span_skipped() {
        let text = "short";
        let tokens = vec![token("ghost", "B-PER", 0.9, 10, 20)];
        let entities = merge_subword_tokens(&tokens, text);
        assert!(entities.is_empty());
    }

    #[test]
    fn test_running_average_over_three_tokens() {
        let text = "Anna Maria Rossi";
        let tokens = vec![
            token("Anna", "B-PER", 0.9, 0, 4),
            token("Maria", "I-PER", 0.8, 5, 10),
            token("Rossi", "I-PER", 0.7, 11, 16),
        ];

        let entities = merge_subword_tokens(&tokens, text);
        assert_eq!(entities.len(), 1);
        assert!((entities[0].confidence - 0.8).abs() < 1e-9);
        assert_eq!(entities[0].text, "Anna Maria Rossi");
    }
}
