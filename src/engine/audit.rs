//! Audit trail for anonymization operations
//!
//! Every processed document can be recorded as one JSONL entry: counts,
//! per-entity category/position/confidence, and a SHA-256 hash of each
//! original value. Plaintext PII never reaches the audit file.

use super::pipeline::PipelineMetadata;
use crate::domain::{CloakError, MappingRecord, Result};
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Audit log entry for one document
#[derive(Debug, Serialize)]
struct AuditEntry {
    timestamp: String,
    session_id: String,
    document_type: String,
    entity_count: usize,
    address_count: usize,
    degraded_to_rule_only: bool,
    detections: Vec<AuditDetection>,
}

/// Per-detection audit record with hashed value
#[derive(Debug, Serialize)]
struct AuditDetection {
    category: String,
    placeholder: String,
    confidence: f64,
    /// SHA-256 hash of the original value (never plaintext)
    value_hash: String,
}

/// Appending JSONL audit logger
pub struct AuditLogger {
    log_path: PathBuf,
    enabled: bool,
}

impl AuditLogger {
    /// Create an audit logger, ensuring the parent directory exists
    pub fn new(log_path: PathBuf, enabled: bool) -> Result<Self> {
        if enabled {
            if let Some(parent) = log_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CloakError::Audit(format!(
                        "failed to create audit directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        Ok(Self { log_path, enabled })
    }

    /// Record one anonymized document
    pub fn log_document(
        &self,
        record: &MappingRecord,
        metadata: &PipelineMetadata,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let mut detections: Vec<AuditDetection> = record
            .entities
            .iter()
            .map(|e| AuditDetection {
                category: e.entity_type.label().to_string(),
                placeholder: e.placeholder.clone(),
                confidence: e.confidence,
                value_hash: hash_value(&e.original_text),
            })
            .collect();
        detections.extend(record.addresses.iter().map(|a| AuditDetection {
            category: "ADDRESS".to_string(),
            placeholder: a.placeholder.clone(),
            confidence: a.confidence,
            value_hash: hash_value(&a.original_text),
        }));

        let entry = AuditEntry {
            timestamp: Utc::now().to_rfc3339(),
            session_id: record.session_id.to_string(),
            document_type: record.document_type.clone(),
            entity_count: record.entities.len(),
            address_count: record.addresses.len(),
            degraded_to_rule_only: metadata.degraded_to_rule_only,
            detections,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| {
                CloakError::Audit(format!(
                    "failed to open audit log {}: {e}",
                    self.log_path.display()
                ))
            })?;
        let line = serde_json::to_string(&entry)?;
        writeln!(file, "{line}")
            .map_err(|e| CloakError::Audit(format!("failed to write audit entry: {e}")))?;
        Ok(())
    }
}

/// SHA-256 hex digest of a PII value
fn hash_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    format!("{result:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DetectionSource, EntityType, MappedEntity};
    use uuid::Uuid;

    fn record_with_one_entity() -> MappingRecord {
        let mut record = MappingRecord::new(Uuid::new_v4(), "letter", vec![]);
        record.entities.push(MappedEntity {
            placeholder: "EMAIL_1".to_string(),
            entity_type: EntityType::Email,
            original_text: "anna@example.ch".to_string(),
            confidence: 0.85,
            source: DetectionSource::Rule,
        });
        record
    }

    #[test]
    fn test_audit_entry_contains_hash_not_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = AuditLogger::new(path.clone(), true).unwrap();

        logger
            .log_document(&record_with_one_entity(), &PipelineMetadata::default())
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("anna@example.ch"));
        assert!(content.contains(&hash_value("anna@example.ch")));
        assert!(content.contains("EMAIL_1"));
    }

    #[test]
    fn test_disabled_logger_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = AuditLogger::new(path.clone(), false).unwrap();

        logger
            .log_document(&record_with_one_entity(), &PipelineMetadata::default())
            .unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_entries_append_as_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = AuditLogger::new(path.clone(), true).unwrap();

        logger
            .log_document(&record_with_one_entity(), &PipelineMetadata::default())
            .unwrap();
        logger
            .log_document(&record_with_one_entity(), &PipelineMetadata::default())
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(parsed["entity_count"], 1);
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_value("John Doe"), hash_value("John Doe"));
        assert_ne!(hash_value("John Doe"), hash_value("Jane Doe"));
        assert_eq!(hash_value("x").len(), 64);
    }
}
