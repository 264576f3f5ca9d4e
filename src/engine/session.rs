//! Per-document anonymization session
//!
//! A session owns the pseudonym counters, the deduplicating text→placeholder
//! map, and the anonymized-ranges ledger for exactly one document. It is
//! created when processing starts and discarded when the mapping record has
//! been produced — never shared across documents or threads, which is what
//! keeps placeholder numbering and pseudonym reuse from leaking between
//! documents.

use super::address::GroupedAddress;
use crate::domain::{
    DocumentType, Entity, EntityType, MappedAddress, MappedEntity, MappingRecord,
};
use std::collections::HashMap;
use uuid::Uuid;

/// A text range already covered by a placeholder
///
/// Offsets refer to the original (pre-anonymization) text. The ledger is
/// append-only and guarantees no two placeholders are emitted for
/// overlapping text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnonymizedRange {
    pub start: usize,
    pub end: usize,
}

impl AnonymizedRange {
    fn intersects(&self, start: usize, end: usize) -> bool {
        !(end <= self.start || self.end <= start)
    }
}

/// Anonymization scope for one document
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    document_type: DocumentType,
    pseudonym_counters: HashMap<EntityType, u32>,
    pseudonym_mapping: HashMap<(EntityType, String), String>,
    anonymized_ranges: Vec<AnonymizedRange>,
}

impl Session {
    /// Open a session for one document
    pub fn new(document_type: DocumentType) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_type,
            pseudonym_counters: HashMap::new(),
            pseudonym_mapping: HashMap::new(),
            anonymized_ranges: Vec::new(),
        }
    }

    /// Session identifier (also stamped into the mapping record)
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next placeholder for a type: `TYPE_N`, counters scoped to this session
    fn next_placeholder(&mut self, entity_type: &EntityType) -> String {
        let counter = self
            .pseudonym_counters
            .entry(entity_type.clone())
            .or_insert(0);
        *counter += 1;
        format!("{}_{}", entity_type.label(), counter)
    }

    /// Placeholder for an entity, reusing the session mapping for repeated text
    fn placeholder_for(&mut self, entity_type: &EntityType, original: &str) -> (String, bool) {
        let key = (entity_type.clone(), original.to_string());
        if let Some(existing) = self.pseudonym_mapping.get(&key) {
            return (existing.clone(), false);
        }
        let placeholder = self.next_placeholder(entity_type);
        self.pseudonym_mapping.insert(key, placeholder.clone());
        (placeholder, true)
    }

    /// Turn the consolidated entity set into anonymized text plus a record
    ///
    /// Grouped addresses go first with position-based replacement from the
    /// end of the document towards the start, so earlier offsets stay
    /// valid. Remaining entities are replaced by exact text, keyed through
    /// the deduplicating pseudonym map; entities whose span intersects an
    /// already-anonymized range are skipped.
    pub fn anonymize(
        &mut self,
        text: &str,
        entities: &[Entity],
        addresses: &[GroupedAddress],
        detection_methods: Vec<String>,
    ) -> (String, MappingRecord) {
        let mut record =
            MappingRecord::new(self.id, self.document_type.label(), detection_methods);
        let mut output = text.to_string();

        // Placeholders are numbered in document order, but the actual
        // replacement runs end to start so earlier offsets stay valid
        let mut ordered: Vec<&GroupedAddress> = addresses.iter().collect();
        ordered.sort_by_key(|a| a.start);
        let mut planned: Vec<(&GroupedAddress, String)> = Vec::with_capacity(ordered.len());
        for address in ordered {
            if self.is_covered(address.start, address.end) {
                continue;
            }
            let placeholder = self.next_placeholder(&EntityType::Address);
            self.anonymized_ranges.push(AnonymizedRange {
                start: address.start,
                end: address.end,
            });
            record.addresses.push(MappedAddress {
                placeholder: placeholder.clone(),
                original_text: address.original_text(text).to_string(),
                components: address.components.clone(),
                confidence: address.final_confidence,
                pattern_matched: address.pattern_matched.clone(),
                scoring_factors: address.scoring_factors.clone(),
                flagged_for_review: address.flagged_for_review,
                auto_anonymize: address.auto_anonymize,
            });
            planned.push((address, placeholder));
        }
        for (address, placeholder) in planned.iter().rev() {
            output.replace_range(address.start..address.end, placeholder);
        }

        // Remaining entities, by exact text through the dedup map
        let mut ordered: Vec<&Entity> = entities
            .iter()
            .filter(|e| e.entity_type != EntityType::Address)
            .collect();
        ordered.sort_by_key(|e| (e.start, e.end));
        for entity in ordered {
            if self.is_covered(entity.start, entity.end) {
                continue;
            }
            let (placeholder, fresh) = self.placeholder_for(&entity.entity_type, &entity.text);
            if fresh {
                output = output.replace(&entity.text, &placeholder);
                record.entities.push(MappedEntity {
                    placeholder,
                    entity_type: entity.entity_type.clone(),
                    original_text: entity.text.clone(),
                    confidence: entity.confidence,
                    source: entity.source,
                });
            }
            self.anonymized_ranges.push(AnonymizedRange {
                start: entity.start,
                end: entity.end,
            });
        }

        (output, record)
    }

    fn is_covered(&self, start: usize, end: usize) -> bool {
        self.anonymized_ranges
            .iter()
            .any(|r| r.intersects(start, end))
    }
}
