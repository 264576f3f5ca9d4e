//! Standardized validation confidence scale
//!
//! Validators never return arbitrary floats. Every validation outcome maps
//! onto one step of a fixed ordered scale so that confidence values are
//! comparable across entity types.

use serde::{Deserialize, Serialize};

/// Ordered confidence scale for validation outcomes
///
/// Variants are ordered strongest to weakest; `score()` gives the numeric
/// confidence attached to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationConfidence {
    /// A known false-positive signal was present
    FalsePositiveSignal,
    /// Validation ran and the value failed it
    Failed,
    /// The value does not match the expected format at all
    InvalidFormat,
    /// Weak evidence only (bare pattern hit)
    Weak,
    /// Moderate evidence (pattern plus partial structure)
    Moderate,
    /// Value appears in a known-valid reference set
    KnownValid,
    /// Ordinary pattern match with sound structure
    Standard,
    /// Format fully valid but carries no checksum
    FormatValid,
    /// Checksum verified
    ChecksumValid,
}

impl ValidationConfidence {
    /// Numeric confidence for this scale step
    pub fn score(&self) -> f64 {
        match self {
            Self::ChecksumValid => 0.95,
            Self::FormatValid => 0.85,
            Self::Standard => 0.75,
            Self::KnownValid => 0.7,
            Self::Moderate => 0.6,
            Self::Weak => 0.4,
            Self::InvalidFormat => 0.2,
            Self::Failed => 0.1,
            Self::FalsePositiveSignal => 0.0,
        }
    }
}

/// Outcome of validating one entity value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the value passed validation
    pub is_valid: bool,
    /// Scale step the outcome maps to
    pub confidence: ValidationConfidence,
    /// Failure reason, when invalid
    pub reason: Option<String>,
}

impl ValidationResult {
    /// A passing result at the given scale step
    pub fn valid(confidence: ValidationConfidence) -> Self {
        Self {
            is_valid: true,
            confidence,
            reason: None,
        }
    }

    /// A failing result with a reason
    pub fn invalid(confidence: ValidationConfidence, reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            confidence,
            reason: Some(reason.into()),
        }
    }

    /// Numeric confidence of the outcome
    pub fn score(&self) -> f64 {
        self.confidence.score()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_is_ordered() {
        let scale = [
            ValidationConfidence::FalsePositiveSignal,
            ValidationConfidence::Failed,
            ValidationConfidence::InvalidFormat,
            ValidationConfidence::Weak,
            ValidationConfidence::Moderate,
            ValidationConfidence::KnownValid,
            ValidationConfidence::Standard,
            ValidationConfidence::FormatValid,
            ValidationConfidence::ChecksumValid,
        ];

        for pair in scale.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].score() <= pair[1].score());
        }
    }

    #[test]
    fn test_scores_bounded() {
        for step in [
            ValidationConfidence::ChecksumValid,
            ValidationConfidence::FalsePositiveSignal,
            ValidationConfidence::Weak,
        ] {
            let s = step.score();
            assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn test_valid_result_has_no_reason() {
        let result = ValidationResult::valid(ValidationConfidence::ChecksumValid);
        assert!(result.is_valid);
        assert!(result.reason.is_none());
        assert!((result.score() - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_result_carries_reason() {
        let result = ValidationResult::invalid(ValidationConfidence::Failed, "checksum failed");
        assert!(!result.is_valid);
        assert_eq!(result.reason.as_deref(), Some("checksum failed"));
    }
}
