//! Address component grouping and scoring
//!
//! Street, number, postal code, city, and country entities that sit next to
//! each other in the text are linked into one logical address, scored as a
//! whole, and anonymized under a single placeholder.

pub mod grouper;
pub mod scorer;

use crate::domain::{AddressComponents, Entity};

pub use grouper::{group_components, AddressGrouper};
pub use scorer::AddressScorer;

/// A group of adjacent address components forming one logical address
#[derive(Debug, Clone)]
pub struct GroupedAddress {
    /// Structured component values
    pub components: AddressComponents,
    /// The component entities in document order
    pub component_entities: Vec<Entity>,
    /// Union span start (min component start)
    pub start: usize,
    /// Union span end (max component end)
    pub end: usize,
    /// Name of the country ordering pattern that matched
    pub pattern_matched: Option<String>,
    /// Composite confidence; set by the scorer
    pub final_confidence: f64,
    /// Human-readable scoring factors
    pub scoring_factors: Vec<String>,
    /// Below the review threshold: emitted, but needs human eyes
    pub flagged_for_review: bool,
    /// At or above the auto threshold: safe for unattended redaction
    pub auto_anonymize: bool,
}

impl GroupedAddress {
    /// The address text as it appears in the document
    pub fn original_text<'t>(&self, text: &'t str) -> &'t str {
        text.get(self.start..self.end).unwrap_or_default()
    }

    /// Whether an entity's span lies inside this address's union span
    pub fn covers(&self, entity: &Entity) -> bool {
        entity.start >= self.start && entity.end <= self.end
    }
}
