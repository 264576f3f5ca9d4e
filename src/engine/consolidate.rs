//! Overlap consolidation
//!
//! Rule recognizers, the classifier, and the address grouper all emit spans
//! over the same text. Consolidation resolves them into one non-overlapping
//! final set with deterministic tiebreaks: a grouped address always beats
//! its fragments, and between two other entities the higher confidence,
//! then the `Both` source, then the longer span wins. The loser is dropped,
//! never merged.

use super::address::GroupedAddress;
use crate::domain::{DetectionSource, Entity, EntityType};

/// Fold rule and ML detections of the identical span and type into one
/// `Both`-source entity carrying the higher confidence
pub fn merge_dual_source(entities: Vec<Entity>) -> Vec<Entity> {
    let mut merged: Vec<Entity> = Vec::with_capacity(entities.len());
    for entity in entities {
        if let Some(existing) = merged.iter_mut().find(|e| {
            e.start == entity.start && e.end == entity.end && e.entity_type == entity.entity_type
        }) {
            if existing.source != entity.source {
                let confidence = existing.confidence.max(entity.confidence);
                let mut both = existing.with_confidence(confidence);
                both.source = DetectionSource::Both;
                *existing = both;
            }
            continue;
        }
        merged.push(entity);
    }
    merged
}

/// Resolve all overlaps into a final, non-overlapping entity set
///
/// Grouped addresses enter the set as single [`EntityType::Address`]
/// entities spanning the union of their components; everything their span
/// covers is excluded. The result is ordered by start offset.
pub fn consolidate(
    entities: Vec<Entity>,
    addresses: &[GroupedAddress],
    text: &str,
) -> Vec<Entity> {
    let entities = merge_dual_source(entities);

    // Fragments and any other entity inside an address union span lose
    let mut survivors: Vec<Entity> = entities
        .into_iter()
        .filter(|e| !addresses.iter().any(|a| a.covers(e)))
        .collect();

    for address in addresses {
        survivors.push(address_entity(address, text));
    }

    survivors.sort_by_key(|e| (e.start, e.end));

    let mut result: Vec<Entity> = Vec::with_capacity(survivors.len());
    for entity in survivors {
        loop {
            match result.last() {
                Some(last) if last.overlaps(&entity) => {
                    if wins(&entity, last) {
                        result.pop();
                        // re-check against the new tail
                    } else {
                        break;
                    }
                }
                _ => {
                    result.push(entity);
                    break;
                }
            }
        }
    }
    result
}

/// Deterministic overlap tiebreak between two non-address entities
///
/// Addresses are already union spans; they compete here like any other
/// entity, which preserves "address wins over fragments" because fragments
/// were removed before this point.
fn wins(candidate: &Entity, incumbent: &Entity) -> bool {
    if candidate.confidence != incumbent.confidence {
        return candidate.confidence > incumbent.confidence;
    }
    if candidate.source.rank() != incumbent.source.rank() {
        return candidate.source.rank() > incumbent.source.rank();
    }
    candidate.len() > incumbent.len()
}

/// Build the single entity representing a grouped address
fn address_entity(address: &GroupedAddress, text: &str) -> Entity {
    let sources: Vec<DetectionSource> = address
        .component_entities
        .iter()
        .map(|e| e.source)
        .collect();
    let source = if sources.iter().any(|s| *s == DetectionSource::Rule)
        && sources.iter().any(|s| *s == DetectionSource::Ml)
    {
        DetectionSource::Both
    } else {
        sources.first().copied().unwrap_or(DetectionSource::Rule)
    };

    let mut entity = Entity::new(
        address.original_text(text),
        EntityType::Address,
        address.start,
        address.end,
        address.final_confidence,
        source,
    );
    if let Some(pattern) = &address.pattern_matched {
        entity = entity.with_annotation("pattern", pattern.clone());
    }
    entity
}
