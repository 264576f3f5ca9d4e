//! Detection and anonymization engine
//!
//! The [`Engine`] wires the frozen recognizer registry, deny list, context
//! enhancer, address grouper/scorer, and the optional ML classifier into
//! one pipeline, and exposes the public entry points:
//!
//! - [`Engine::detect`] — run the pipeline, return scored entities plus
//!   per-pass metadata
//! - [`Engine::anonymize`] — detect, then replace entities with stable
//!   placeholders through a per-document [`session::Session`]
//! - [`Engine::anonymize_batch`] — process many documents concurrently,
//!   each with its own session and context
//!
//! # Thread safety
//!
//! The engine holds only read-only shared state and can be wrapped in
//! `Arc` and used from any number of tasks. All per-document mutable state
//! lives in the context and session created for that document.

pub mod address;
pub mod audit;
pub mod consolidate;
pub mod context;
pub mod denylist;
pub mod ml;
pub mod pipeline;
pub mod report;
pub mod session;

use crate::config::CloakConfig;
use crate::domain::{Entity, MappingRecord, Result};
use crate::recognizers::builtin;
use address::{AddressGrouper, AddressScorer, GroupedAddress};
use anyhow::Context as _;
use audit::AuditLogger;
use context::ContextEnhancer;
use denylist::DenyList;
use futures::stream::{self, StreamExt};
use ml::{HttpTokenClassifier, RetryPolicy, TokenClassifier};
use pipeline::{Pipeline, PipelineMetadata, PipelineOptions};
use report::DetectionReport;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Concurrent documents per batch
const BATCH_CONCURRENCY: usize = 8;

/// Result of running detection over one document
#[derive(Debug)]
pub struct Detection {
    /// Final, non-overlapping entity set ordered by start offset
    pub entities: Vec<Entity>,
    /// Grouped addresses backing the `ADDRESS` entities
    pub addresses: Vec<GroupedAddress>,
    /// Per-pass counts and timings
    pub metadata: PipelineMetadata,
}

/// Result of anonymizing one document
#[derive(Debug)]
pub struct AnonymizedDocument {
    /// Text with every detected entity replaced by its placeholder
    pub text: String,
    /// Versioned placeholder↔original mapping
    pub record: MappingRecord,
    /// Per-pass counts and timings
    pub metadata: PipelineMetadata,
}

/// The detection and anonymization engine
pub struct Engine {
    pipeline: Pipeline,
    audit_logger: Option<AuditLogger>,
}

impl Engine {
    /// Build an engine from configuration
    ///
    /// Compiles the built-in recognizers, layers the configured external
    /// recognizer file on top (individually rejecting invalid entries),
    /// freezes the registry, and connects the classifier and audit trail
    /// when enabled.
    pub fn new(config: &CloakConfig) -> anyhow::Result<Self> {
        config
            .validate()
            .context("Invalid engine configuration")?;

        let mut registry = match &config.engine.recognizer_file {
            Some(path) => {
                match builtin::build_registry_with_overrides(path) {
                    Ok((registry, rejected)) => {
                        for entry in &rejected {
                            tracing::warn!(
                                recognizer = %entry.name,
                                reason = %entry.reason,
                                "External recognizer rejected"
                            );
                        }
                        registry
                    }
                    Err(e) => {
                        // A broken external file falls back to the built-ins
                        tracing::error!(
                            file = %path.display(),
                            error = %e,
                            "Failed to load recognizer file; using built-in defaults"
                        );
                        builtin::build_registry()?
                    }
                }
            }
            None => builtin::build_registry()?,
        };
        registry.freeze();

        let classifier: Option<Arc<dyn TokenClassifier>> = if config.ml.enabled {
            let endpoint = config
                .ml
                .endpoint
                .as_deref()
                .context("ml.endpoint missing")?;
            let classifier = HttpTokenClassifier::new(
                endpoint,
                Duration::from_secs(config.ml.timeout_secs),
            )?;
            Some(Arc::new(classifier))
        } else {
            None
        };

        let retry_policy = RetryPolicy {
            max_attempts: config.ml.max_attempts,
            base_backoff_ms: config.ml.base_backoff_ms,
            max_input_chars: config.ml.max_input_chars,
        };

        let pipeline = Pipeline::new(
            Arc::new(registry),
            Arc::new(DenyList::with_defaults()),
            Arc::new(ContextEnhancer::new(
                config.engine.context_window,
                config.engine.context_boost_factor,
                config.engine.context_boosted_floor,
            )),
            AddressGrouper::with_max_gap(config.engine.address_max_gap),
            AddressScorer::new(
                config.engine.address_review_threshold,
                config.engine.address_auto_threshold,
            ),
            classifier,
            retry_policy,
            config.engine.max_input_bytes,
        );

        let audit_logger = if config.audit.enabled {
            Some(AuditLogger::new(config.audit.log_path.clone(), true)?)
        } else {
            None
        };

        Ok(Self {
            pipeline,
            audit_logger,
        })
    }

    /// Detect PII in one document
    pub async fn detect(&self, text: &str, options: &PipelineOptions) -> Result<Detection> {
        let ctx = self.pipeline.run(text, options).await?;
        Ok(Detection {
            entities: ctx.entities,
            addresses: ctx.addresses,
            metadata: ctx.metadata,
        })
    }

    /// Detect and anonymize one document
    ///
    /// A fresh [`session::Session`] is created for the document and dropped
    /// when the mapping record has been produced.
    pub async fn anonymize(
        &self,
        text: &str,
        options: &PipelineOptions,
    ) -> Result<AnonymizedDocument> {
        let ctx = self.pipeline.run(text, options).await?;

        let mut doc_session = session::Session::new(options.document_type);
        let (anonymized, record) = doc_session.anonymize(
            &ctx.text,
            &ctx.entities,
            &ctx.addresses,
            ctx.metadata.applied_passes(),
        );

        if let Some(logger) = &self.audit_logger {
            logger.log_document(&record, &ctx.metadata)?;
        }

        Ok(AnonymizedDocument {
            text: anonymized,
            record,
            metadata: ctx.metadata,
        })
    }

    /// Anonymize a batch of documents concurrently
    ///
    /// Each document runs with its own session and context. A failed
    /// document is logged, counted in the report, and skipped — the batch
    /// never aborts, and no un-anonymized text is returned.
    pub async fn anonymize_batch(
        &self,
        documents: Vec<String>,
        options: &PipelineOptions,
    ) -> (Vec<AnonymizedDocument>, DetectionReport) {
        let mut report = DetectionReport::new();

        let mut ordered: Vec<_> = stream::iter(documents.into_iter().enumerate())
            .map(|(index, document)| async move {
                let started = Instant::now();
                let result = self.anonymize(&document, options).await;
                (index, started.elapsed().as_millis() as u64, result)
            })
            .buffer_unordered(BATCH_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;
        ordered.sort_by_key(|(index, _, _)| *index);

        let mut results = Vec::with_capacity(ordered.len());
        for (index, elapsed_ms, outcome) in ordered {
            match outcome {
                Ok(document) => {
                    report.add_document(
                        &document.record,
                        elapsed_ms,
                        document.metadata.degraded_to_rule_only,
                    );
                    results.push(document);
                }
                Err(e) => {
                    tracing::error!(document = index, error = %e, "Failed to anonymize document");
                    report.add_warning(format!("document {index}: {e}"));
                }
            }
        }

        (results, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DetectionSource, DocumentType, EntityType, Language};

    fn engine() -> Engine {
        Engine::new(&CloakConfig::default()).unwrap()
    }

    fn de_options() -> PipelineOptions {
        PipelineOptions {
            language: Language::De,
            document_type: DocumentType::Letter,
            ..PipelineOptions::default()
        }
    }

    #[tokio::test]
    async fn test_detect_returns_entities_and_metadata() {
        let detection = engine()
            .detect("Kontakt: hans.muster@example.ch", &de_options())
            .await
            .unwrap();
        assert!(detection
            .entities
            .iter()
            .any(|e| e.entity_type == EntityType::Email));
        assert!(!detection.metadata.passes.is_empty());
    }

    #[tokio::test]
    async fn test_anonymize_swiss_address_end_to_end() {
        let result = engine()
            .anonymize(
                "Lieferadresse: Rue de Lausanne 12, 1000 Lausanne",
                &PipelineOptions {
                    language: Language::Fr,
                    ..PipelineOptions::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(result.text, "Lieferadresse: ADDRESS_1");
        assert_eq!(result.record.addresses.len(), 1);
        let address = &result.record.addresses[0];
        assert_eq!(address.components.street.as_deref(), Some("Rue de Lausanne"));
        assert_eq!(address.components.number.as_deref(), Some("12"));
        assert_eq!(address.components.postal.as_deref(), Some("1000"));
        assert_eq!(address.components.city.as_deref(), Some("Lausanne"));
    }

    #[tokio::test]
    async fn test_manual_entity_is_anonymized_like_detected() {
        let text = "Interne Referenz: Projekt Morgenstern";
        let start = text.find("Morgenstern").unwrap();
        let options = PipelineOptions {
            language: Language::De,
            manual_entities: vec![Entity::manual(
                "Morgenstern",
                EntityType::PersonName,
                start,
                start + "Morgenstern".len(),
            )],
            ..PipelineOptions::default()
        };

        let result = engine().anonymize(text, &options).await.unwrap();
        assert_eq!(result.text, "Interne Referenz: Projekt PERSON_NAME_1");
        assert_eq!(result.record.entities[0].source, DetectionSource::Manual);
        assert!((result.record.entities[0].confidence - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_batch_is_fail_safe() {
        let documents = vec![
            "Kontakt: hans@example.ch".to_string(),
            "   ".to_string(), // rejected by normalization
            "Tel: 044 123 45 67".to_string(),
        ];

        let (results, report) = engine().anonymize_batch(documents, &de_options()).await;
        assert_eq!(results.len(), 2);
        assert_eq!(report.total_documents, 2);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("document 1"));
    }

    #[tokio::test]
    async fn test_identical_text_in_two_documents_gets_independent_numbering() {
        let engine = engine();
        let options = de_options();

        let first = engine
            .anonymize("Kontakt: john.doe@example.ch", &options)
            .await
            .unwrap();
        let second = engine
            .anonymize("Kontakt: john.doe@example.ch", &options)
            .await
            .unwrap();

        assert_eq!(first.record.entities[0].placeholder, "EMAIL_1");
        assert_eq!(second.record.entities[0].placeholder, "EMAIL_1");
        assert_ne!(first.record.session_id, second.record.session_id);
    }
}
