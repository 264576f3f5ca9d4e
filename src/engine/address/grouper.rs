//! Linking adjacent address components into grouped addresses
//!
//! Components are clustered by proximity (a short gap containing only
//! separator characters) and kept only when their order matches one of the
//! known country conventions. Clusters that match no pattern are left
//! ungrouped; their components stay individual entities.

use super::GroupedAddress;
use crate::domain::{AddressComponents, Entity, EntityType};

/// Maximum gap in bytes between two components of the same address
const DEFAULT_MAX_GAP: usize = 16;

/// Known component orderings per country convention
///
/// Swiss and German addresses put the street before the house number;
/// French addresses lead with the number. The postal code always precedes
/// the city in all supported jurisdictions.
const COUNTRY_PATTERNS: &[(&str, &[EntityType])] = &[
    (
        "swiss_full",
        &[
            EntityType::StreetName,
            EntityType::StreetNumber,
            EntityType::PostalCode,
            EntityType::City,
            EntityType::Country,
        ],
    ),
    (
        "swiss_street_first",
        &[
            EntityType::StreetName,
            EntityType::StreetNumber,
            EntityType::PostalCode,
            EntityType::City,
        ],
    ),
    (
        "french_number_first",
        &[
            EntityType::StreetNumber,
            EntityType::StreetName,
            EntityType::PostalCode,
            EntityType::City,
        ],
    ),
    (
        "street_number_city",
        &[
            EntityType::StreetName,
            EntityType::StreetNumber,
            EntityType::City,
        ],
    ),
    (
        "postal_city",
        &[EntityType::PostalCode, EntityType::City],
    ),
    (
        "street_number",
        &[EntityType::StreetName, EntityType::StreetNumber],
    ),
];

/// Groups adjacent address-component entities
#[derive(Debug, Clone)]
pub struct AddressGrouper {
    max_gap: usize,
}

impl Default for AddressGrouper {
    fn default() -> Self {
        Self {
            max_gap: DEFAULT_MAX_GAP,
        }
    }
}

impl AddressGrouper {
    /// Grouper with a custom adjacency gap
    pub fn with_max_gap(max_gap: usize) -> Self {
        Self { max_gap }
    }

    /// Group address components out of a scored entity list
    ///
    /// Returned addresses carry no score yet; run them through the
    /// [`super::AddressScorer`].
    pub fn group(&self, entities: &[Entity], text: &str) -> Vec<GroupedAddress> {
        let mut sorted: Vec<Entity> = entities
            .iter()
            .filter(|e| e.entity_type.is_address_component())
            .cloned()
            .collect();
        sorted.sort_by_key(|e| (e.start, e.end));

        // A component nested inside a longer one (a city name inside a
        // street name, say) would break adjacency; the longer span wins.
        // Equal spans with different component types keep the first.
        let mut components: Vec<Entity> = Vec::with_capacity(sorted.len());
        for candidate in &sorted {
            let nested = sorted
                .iter()
                .any(|other| other.len() > candidate.len() && other.contains(candidate));
            let duplicate_span = components
                .last()
                .map(|prev| (prev.start, prev.end) == (candidate.start, candidate.end))
                .unwrap_or(false);
            if !nested && !duplicate_span {
                components.push(candidate.clone());
            }
        }

        let mut groups = Vec::new();
        let mut cluster: Vec<Entity> = Vec::new();

        for component in components {
            let adjacent = match cluster.last() {
                None => true,
                Some(prev) => {
                    component.start >= prev.end
                        && component.start - prev.end <= self.max_gap
                        && is_separator_gap(&text[prev.end..component.start])
                }
            };

            if adjacent {
                cluster.push(component);
            } else {
                if let Some(group) = self.close_cluster(&cluster) {
                    groups.push(group);
                }
                cluster = vec![component];
            }
        }
        if let Some(group) = self.close_cluster(&cluster) {
            groups.push(group);
        }

        groups
    }

    /// Turn a proximity cluster into a grouped address if its order matches
    /// a known country pattern
    fn close_cluster(&self, cluster: &[Entity]) -> Option<GroupedAddress> {
        if cluster.len() < 2 {
            return None;
        }

        let observed: Vec<EntityType> =
            cluster.iter().map(|e| e.entity_type.clone()).collect();
        let pattern = COUNTRY_PATTERNS
            .iter()
            .find(|(_, expected)| observed.as_slice() == *expected)?;

        let start = cluster.first()?.start;
        let end = cluster.last()?.end;

        let mut components = AddressComponents::default();
        for entity in cluster {
            let value = Some(entity.text.clone());
            match entity.entity_type {
                EntityType::StreetName => components.street = value,
                EntityType::StreetNumber => components.number = value,
                EntityType::PostalCode => components.postal = value,
                EntityType::City => components.city = value,
                EntityType::Country => components.country = value,
                _ => {}
            }
        }

        Some(GroupedAddress {
            components,
            component_entities: cluster.to_vec(),
            start,
            end,
            pattern_matched: Some(pattern.0.to_string()),
            final_confidence: 0.0,
            scoring_factors: Vec::new(),
            flagged_for_review: false,
            auto_anonymize: false,
        })
    }
}

/// Whether the text between two components is only separators
fn is_separator_gap(gap: &str) -> bool {
    gap.chars()
        .all(|c| c.is_whitespace() || matches!(c, ',' | '.' | ';' | '-' | '/'))
}

/// Convenience wrapper with the default gap
pub fn group_components(entities: &[Entity], text: &str) -> Vec<GroupedAddress> {
    AddressGrouper::default().group(entities, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DetectionSource;

    fn entity(text: &str, entity_type: EntityType, start: usize) -> Entity {
        Entity::new(
            text,
            entity_type,
            start,
            start + text.len(),
            0.6,
            DetectionSource::Rule,
        )
    }

    #[test]
    fn test_swiss_address_groups() {
        let text = "Rue de Lausanne 12, 1000 Lausanne";
        let entities = vec![
            entity("Rue de Lausanne", EntityType::StreetName, 0),
            entity("12", EntityType::StreetNumber, 16),
            entity("1000", EntityType::PostalCode, 20),
            entity("Lausanne", EntityType::City, 25),
        ];

        let groups = group_components(&entities, text);
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.pattern_matched.as_deref(), Some("swiss_street_first"));
        assert_eq!(group.original_text(text), "Rue de Lausanne 12, 1000 Lausanne");
        assert_eq!(group.components.street.as_deref(), Some("Rue de Lausanne"));
        assert_eq!(group.components.number.as_deref(), Some("12"));
        assert_eq!(group.components.postal.as_deref(), Some("1000"));
        assert_eq!(group.components.city.as_deref(), Some("Lausanne"));
    }

    #[test]
    fn test_distant_components_stay_apart() {
        let text = "Rue de Lausanne 12 ........ lots of words in between ........ 1000 Lausanne";
        let postal_start = text.find("1000").unwrap();
        let city_start = text.rfind("Lausanne").unwrap();
        let entities = vec![
            entity("Rue de Lausanne", EntityType::StreetName, 0),
            entity("12", EntityType::StreetNumber, 16),
            entity("1000", EntityType::PostalCode, postal_start),
            entity("Lausanne", EntityType::City, city_start),
        ];

        let groups = group_components(&entities, text);
        // street+number match, postal+city match, but no full address
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].pattern_matched.as_deref(), Some("street_number"));
        assert_eq!(groups[1].pattern_matched.as_deref(), Some("postal_city"));
    }

    #[test]
    fn test_wrong_order_is_not_grouped() {
        let text = "Lausanne 1000 12 Rue";
        let entities = vec![
            Entity::new("Lausanne", EntityType::City, 0, 8, 0.6, DetectionSource::Rule),
            Entity::new("1000", EntityType::PostalCode, 9, 13, 0.6, DetectionSource::Rule),
        ];

        let groups = group_components(&entities, text);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_single_component_is_not_grouped() {
        let text = "nur 8001 hier";
        let entities = vec![Entity::new(
            "8001",
            EntityType::PostalCode,
            4,
            8,
            0.6,
            DetectionSource::Rule,
        )];
        assert!(group_components(&entities, text).is_empty());
    }

    #[test]
    fn test_french_number_first_pattern() {
        let text = "12 Rue du Rhône, 1204 Genève";
        let entities = vec![
            Entity::new("12", EntityType::StreetNumber, 0, 2, 0.6, DetectionSource::Rule),
            Entity::new("Rue du Rhône", EntityType::StreetName, 3, 16, 0.6, DetectionSource::Rule),
            Entity::new("1204", EntityType::PostalCode, 18, 22, 0.6, DetectionSource::Rule),
            Entity::new("Genève", EntityType::City, 23, 30, 0.6, DetectionSource::Rule),
        ];

        let groups = group_components(&entities, text);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].pattern_matched.as_deref(),
            Some("french_number_first")
        );
    }

    #[test]
    fn test_non_separator_gap_breaks_cluster() {
        let text = "Bahnhofstrasse 5 kostet 8001 Franken";
        let entities = vec![
            Entity::new("Bahnhofstrasse", EntityType::StreetName, 0, 14, 0.6, DetectionSource::Rule),
            Entity::new("5", EntityType::StreetNumber, 15, 16, 0.6, DetectionSource::Rule),
            Entity::new("8001", EntityType::PostalCode, 24, 28, 0.6, DetectionSource::Rule),
        ];

        let groups = group_components(&entities, text);
        // "kostet" between number and postal is not a separator gap
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].pattern_matched.as_deref(), Some("street_number"));
    }
}
