//! Batch detection reporting
//!
//! Aggregated statistics over a batch of documents, used by dry-run mode:
//! totals, per-type counts, placeholder samples, warnings, and processing
//! stats. Samples carry placeholders and types only — original values stay
//! out of the report.

use crate::domain::MappingRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Aggregated detection report over a batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Documents analyzed
    pub total_documents: usize,
    /// Entities and addresses detected across the batch
    pub total_detections: usize,
    /// Detections per entity-type label
    pub detections_by_type: HashMap<String, usize>,
    /// Placeholder samples (first few per document)
    pub samples: Vec<DetectionSample>,
    /// Warnings collected while processing
    pub warnings: Vec<String>,
    /// Processing statistics
    pub stats: ProcessingStats,
}

/// One sample detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSample {
    pub placeholder: String,
    pub entity_type: String,
    pub confidence: f64,
    pub flagged_for_review: bool,
}

/// Processing statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub total_processing_time_ms: u64,
    pub avg_processing_time_ms: u64,
    pub documents_with_pii: usize,
    pub documents_without_pii: usize,
    pub documents_degraded: usize,
}

/// Samples kept per document
const SAMPLES_PER_DOCUMENT: usize = 3;

impl DetectionReport {
    /// Empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one document's mapping record into the report
    pub fn add_document(
        &mut self,
        record: &MappingRecord,
        processing_time_ms: u64,
        degraded: bool,
    ) {
        self.total_documents += 1;
        self.stats.total_processing_time_ms += processing_time_ms;
        if degraded {
            self.stats.documents_degraded += 1;
        }

        let detections = record.total_mappings();
        if detections == 0 {
            self.stats.documents_without_pii += 1;
        } else {
            self.stats.documents_with_pii += 1;
            self.total_detections += detections;

            for entity in &record.entities {
                *self
                    .detections_by_type
                    .entry(entity.entity_type.label().to_string())
                    .or_insert(0) += 1;
            }
            for _ in &record.addresses {
                *self
                    .detections_by_type
                    .entry("ADDRESS".to_string())
                    .or_insert(0) += 1;
            }

            for entity in record.entities.iter().take(SAMPLES_PER_DOCUMENT) {
                self.samples.push(DetectionSample {
                    placeholder: entity.placeholder.clone(),
                    entity_type: entity.entity_type.label().to_string(),
                    confidence: entity.confidence,
                    flagged_for_review: false,
                });
            }
            for address in record.addresses.iter().take(SAMPLES_PER_DOCUMENT) {
                self.samples.push(DetectionSample {
                    placeholder: address.placeholder.clone(),
                    entity_type: "ADDRESS".to_string(),
                    confidence: address.confidence,
                    flagged_for_review: address.flagged_for_review,
                });
            }
        }

        self.stats.avg_processing_time_ms =
            self.stats.total_processing_time_ms / self.total_documents as u64;
    }

    /// Record a warning
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}
