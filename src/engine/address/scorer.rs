//! Composite confidence scoring for grouped addresses
//!
//! The score combines four weighted factors: how many of the expected
//! components are present, whether the postal code is a known Swiss code
//! (and agrees with the city next to it), how specific the matched country
//! pattern is, and whether the address sits in the document header or
//! footer where sender/recipient blocks live.

use super::GroupedAddress;
use crate::validators::postal;

/// Thresholded scorer for grouped addresses
#[derive(Debug, Clone)]
pub struct AddressScorer {
    review_threshold: f64,
    auto_threshold: f64,
}

impl Default for AddressScorer {
    fn default() -> Self {
        Self {
            review_threshold: 0.6,
            auto_threshold: 0.85,
        }
    }
}

impl AddressScorer {
    /// Scorer with explicit thresholds
    pub fn new(review_threshold: f64, auto_threshold: f64) -> Self {
        Self {
            review_threshold,
            auto_threshold,
        }
    }

    /// Score a grouped address in place
    ///
    /// Sets `final_confidence`, `scoring_factors`, `flagged_for_review`,
    /// and `auto_anonymize`. Addresses below the review threshold are
    /// flagged, never dropped.
    pub fn score(&self, address: &mut GroupedAddress, text_len: usize) {
        let mut factors = Vec::new();

        // Components present out of the full street/number/postal/city set
        let present = address.components.present_count().min(4);
        let component_ratio = present as f64 / 4.0;
        factors.push(format!("components {present}/4"));

        // Postal plausibility against the embedded Swiss table
        let mut postal_factor = 0.0;
        if let Some(code) = address
            .components
            .postal
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
        {
            if let Some(table_city) = postal::city_for_code(code) {
                postal_factor = 0.8;
                factors.push("known_postal_code".to_string());
                if let Some(city) = address.components.city.as_deref() {
                    if city.eq_ignore_ascii_case(table_city) {
                        postal_factor = 1.0;
                        factors.push("postal_city_agreement".to_string());
                    }
                }
            } else if postal::in_swiss_range(code) {
                postal_factor = 0.5;
                factors.push("postal_in_range".to_string());
            }
        }

        // Pattern specificity: full conventions outrank two-component stubs
        let pattern_factor = match address.pattern_matched.as_deref() {
            Some("swiss_full") => 1.0,
            Some("swiss_street_first") | Some("french_number_first") => 0.9,
            Some("street_number_city") => 0.7,
            Some("postal_city") => 0.5,
            Some("street_number") => 0.4,
            _ => 0.0,
        };
        if let Some(pattern) = address.pattern_matched.as_deref() {
            factors.push(format!("pattern {pattern}"));
        }

        // Header/footer position: sender and recipient blocks
        let position_factor = if text_len > 0 {
            let relative = address.start as f64 / text_len as f64;
            if relative < 0.2 {
                factors.push("header_position".to_string());
                1.0
            } else if relative > 0.8 {
                factors.push("footer_position".to_string());
                1.0
            } else {
                0.0
            }
        } else {
            0.0
        };

        let confidence = (0.4 * component_ratio
            + 0.3 * postal_factor
            + 0.2 * pattern_factor
            + 0.1 * position_factor)
            .clamp(0.0, 1.0);

        address.final_confidence = confidence;
        address.scoring_factors = factors;
        address.flagged_for_review = confidence < self.review_threshold;
        address.auto_anonymize = confidence >= self.auto_threshold;
    }
}
