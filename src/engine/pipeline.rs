//! Multi-pass detection pipeline
//!
//! The orchestrator runs a fixed, ordered sequence of passes over a shared
//! [`PipelineContext`]: normalize, recognize (rule + ML), deny-list filter,
//! validate, context-score, document-type rules, address grouping/scoring,
//! and consolidation. Every pass after normalization is isolated — a pass
//! failure is logged, recorded in the pass report, and the pipeline
//! continues with the previous entity list. Only a normalization failure
//! (the prerequisite for all span arithmetic) aborts a document.

use super::address::{AddressGrouper, AddressScorer, GroupedAddress};
use super::consolidate;
use super::context::{Adjustment, ContextEnhancer, RuntimeContext};
use super::denylist::DenyList;
use super::ml::{classify_with_retry, merge_subword_tokens, RetryPolicy, TokenClassifier};
use crate::domain::{
    DocumentType, Entity, InputError, Language, Result,
};
use crate::recognizers::RecognizerRegistry;
use std::sync::Arc;
use std::time::Instant;

/// Canonical pass names, in execution order
pub const PASS_ORDER: [&str; 8] = [
    "normalize",
    "recognize",
    "deny_list",
    "validate",
    "context",
    "document_rules",
    "address_grouping",
    "consolidate",
];

/// Per-pass execution report
#[derive(Debug, Clone, serde::Serialize)]
pub struct PassReport {
    pub name: String,
    pub duration_ms: u64,
    pub entities_after: usize,
    /// Entities removed by this pass
    pub filtered: usize,
    /// Entities whose confidence this pass raised
    pub boosted: usize,
    /// Failure reason if the pass was skipped after an error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<String>,
}

/// Aggregated pipeline metadata returned to the caller
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PipelineMetadata {
    pub passes: Vec<PassReport>,
    /// True when inference failed and detection fell back to rules only
    pub degraded_to_rule_only: bool,
    /// Isolated recognizer failures (name and reason)
    pub recognizer_failures: Vec<(String, String)>,
}

impl PipelineMetadata {
    /// Ordered names of passes that ran without failure
    pub fn applied_passes(&self) -> Vec<String> {
        self.passes
            .iter()
            .filter(|p| p.failed.is_none())
            .map(|p| p.name.clone())
            .collect()
    }
}

/// Shared mutable state handed from pass to pass
#[derive(Debug)]
pub struct PipelineContext {
    pub text: String,
    pub language: Language,
    pub document_type: DocumentType,
    pub entities: Vec<Entity>,
    pub addresses: Vec<GroupedAddress>,
    pub metadata: PipelineMetadata,
}

/// Per-call options for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub language: Language,
    pub document_type: DocumentType,
    pub runtime_context: RuntimeContext,
    /// Feature flag: disable the deny-list and context-enhancement stages
    /// (for A/B comparison); pass order is unaffected
    pub filtering_enabled: bool,
    /// Reviewer-supplied entities (`source = Manual`, confidence 1.0);
    /// they join the set before consolidation and win its tiebreaks
    pub manual_entities: Vec<Entity>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            language: Language::En,
            document_type: DocumentType::Unknown,
            runtime_context: RuntimeContext::default(),
            filtering_enabled: true,
            manual_entities: Vec::new(),
        }
    }
}

/// The detection pipeline
///
/// Holds only read-only, shareable components; every run gets its own
/// [`PipelineContext`], so concurrent documents never touch shared mutable
/// state.
pub struct Pipeline {
    registry: Arc<RecognizerRegistry>,
    deny_list: Arc<DenyList>,
    enhancer: Arc<ContextEnhancer>,
    grouper: AddressGrouper,
    scorer: AddressScorer,
    classifier: Option<Arc<dyn TokenClassifier>>,
    retry_policy: RetryPolicy,
    max_input_bytes: usize,
}

impl Pipeline {
    /// Assemble a pipeline from its frozen components
    pub fn new(
        registry: Arc<RecognizerRegistry>,
        deny_list: Arc<DenyList>,
        enhancer: Arc<ContextEnhancer>,
        grouper: AddressGrouper,
        scorer: AddressScorer,
        classifier: Option<Arc<dyn TokenClassifier>>,
        retry_policy: RetryPolicy,
        max_input_bytes: usize,
    ) -> Self {
        Self {
            registry,
            deny_list,
            enhancer,
            grouper,
            scorer,
            classifier,
            retry_policy,
            max_input_bytes,
        }
    }

    /// Run all passes over one document
    pub async fn run(&self, text: &str, options: &PipelineOptions) -> Result<PipelineContext> {
        let mut ctx = PipelineContext {
            text: String::new(),
            language: options.language,
            document_type: options.document_type,
            entities: Vec::new(),
            addresses: Vec::new(),
            metadata: PipelineMetadata::default(),
        };

        // Normalization is the one pass that may abort the document
        let started = Instant::now();
        ctx.text = self.normalize(text)?;
        ctx.metadata.passes.push(PassReport {
            name: "normalize".to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
            entities_after: 0,
            filtered: 0,
            boosted: 0,
            failed: None,
        });

        self.recognize(&mut ctx).await;

        if options.filtering_enabled {
            self.run_isolated(&mut ctx, "deny_list", |p, c| p.deny_list_pass(c));
        } else {
            self.record_skipped(&mut ctx, "deny_list", "disabled by feature flag");
        }

        self.run_isolated(&mut ctx, "validate", |p, c| p.validate_pass(c));

        if options.filtering_enabled {
            self.run_isolated(&mut ctx, "context", |p, c| {
                p.context_pass(c, &options.runtime_context)
            });
        } else {
            self.record_skipped(&mut ctx, "context", "disabled by feature flag");
        }

        self.run_isolated(&mut ctx, "document_rules", |p, c| p.document_rules_pass(c));
        self.run_isolated(&mut ctx, "address_grouping", |p, c| p.address_pass(c));

        ctx.entities.extend(options.manual_entities.iter().cloned());

        self.run_isolated(&mut ctx, "consolidate", |p, c| p.consolidate_pass(c));

        Ok(ctx)
    }

    /// Run a synchronous pass with failure isolation
    fn run_isolated<F>(&self, ctx: &mut PipelineContext, name: &str, pass: F)
    where
        F: FnOnce(&Self, &mut PipelineContext) -> Result<(usize, usize)>,
    {
        let started = Instant::now();
        let before = ctx.entities.len();
        let report = match pass(self, ctx) {
            Ok((filtered, boosted)) => PassReport {
                name: name.to_string(),
                duration_ms: started.elapsed().as_millis() as u64,
                entities_after: ctx.entities.len(),
                filtered,
                boosted,
                failed: None,
            },
            Err(e) => {
                tracing::error!(pass = name, error = %e, "Pass failed; continuing");
                PassReport {
                    name: name.to_string(),
                    duration_ms: started.elapsed().as_millis() as u64,
                    entities_after: before,
                    filtered: 0,
                    boosted: 0,
                    failed: Some(e.to_string()),
                }
            }
        };
        ctx.metadata.passes.push(report);
    }

    fn record_skipped(&self, ctx: &mut PipelineContext, name: &str, reason: &str) {
        ctx.metadata.passes.push(PassReport {
            name: name.to_string(),
            duration_ms: 0,
            entities_after: ctx.entities.len(),
            filtered: 0,
            boosted: 0,
            failed: Some(reason.to_string()),
        });
    }

    /// Input validation and text normalization
    fn normalize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(InputError::Empty.into());
        }
        if text.len() > self.max_input_bytes {
            return Err(InputError::TooLong {
                length: text.len(),
                max: self.max_input_bytes,
            }
            .into());
        }
        if let Some(position) = text.find('\u{FFFD}') {
            return Err(InputError::MalformedEncoding { position }.into());
        }

        // Canonical line endings and spaces; all downstream offsets refer
        // to this normalized text
        let normalized = text
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .replace('\u{00A0}', " ");
        Ok(normalized)
    }

    /// Rule and ML recognition
    async fn recognize(&self, ctx: &mut PipelineContext) {
        let started = Instant::now();

        let outcome = self.registry.analyze(&ctx.text, ctx.language);
        let rule_count = outcome.entities.len();
        ctx.entities = outcome.entities;
        for failure in outcome.failures {
            ctx.metadata
                .recognizer_failures
                .push((failure.recognizer, failure.reason));
        }

        if let Some(classifier) = &self.classifier {
            match classify_with_retry(classifier.as_ref(), &ctx.text, &self.retry_policy).await {
                Ok(tokens) => {
                    let merged = merge_subword_tokens(&tokens, &ctx.text);
                    tracing::debug!(
                        rule_entities = rule_count,
                        ml_entities = merged.len(),
                        "Recognition complete"
                    );
                    ctx.entities.extend(merged);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Inference unavailable; degrading to rule-only detection");
                    ctx.metadata.degraded_to_rule_only = true;
                }
            }
        }

        ctx.metadata.passes.push(PassReport {
            name: "recognize".to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
            entities_after: ctx.entities.len(),
            filtered: 0,
            boosted: 0,
            failed: None,
        });
    }

    /// Strip entities matching the global/type/language deny lists
    fn deny_list_pass(&self, ctx: &mut PipelineContext) -> Result<(usize, usize)> {
        let mut kept = Vec::with_capacity(ctx.entities.len());
        let mut filtered = 0;
        for entity in ctx.entities.drain(..) {
            let use_global = self
                .registry
                .get(&entity.entity_type)
                .map(|r| r.use_global_deny_list)
                .unwrap_or(true);
            if !use_global {
                kept.push(entity);
                continue;
            }
            let denied = match self
                .deny_list
                .is_denied(&entity.text, &entity.entity_type, ctx.language)
            {
                Ok(d) => d,
                Err(e) => {
                    // A broken deny pattern must not cost us the entity
                    tracing::warn!(error = %e, "Deny-list check failed; keeping entity");
                    false
                }
            };
            if denied {
                filtered += 1;
            } else {
                kept.push(entity);
            }
        }
        ctx.entities = kept;
        Ok((filtered, 0))
    }

    /// Apply format/checksum validators from the recognizer registry
    fn validate_pass(&self, ctx: &mut PipelineContext) -> Result<(usize, usize)> {
        let mut kept = Vec::with_capacity(ctx.entities.len());
        let mut filtered = 0;
        let mut boosted = 0;
        for entity in ctx.entities.drain(..) {
            let validator = self
                .registry
                .get(&entity.entity_type)
                .and_then(|r| r.validator);
            let Some(validator) = validator else {
                kept.push(entity);
                continue;
            };

            let result = validator.validate(&entity.text);
            if result.is_valid {
                let score = result.score();
                if score > entity.confidence {
                    boosted += 1;
                }
                let mut validated = entity.with_confidence(score);
                validated
                    .metadata
                    .insert("validation".to_string(), format!("{:?}", result.confidence));
                kept.push(validated);
            } else {
                filtered += 1;
                tracing::debug!(
                    entity_type = %entity.entity_type,
                    start = entity.start,
                    reason = result.reason.as_deref().unwrap_or("invalid"),
                    "Entity rejected by validator"
                );
            }
        }
        ctx.entities = kept;
        Ok((filtered, boosted))
    }

    /// Context-based confidence adjustment
    fn context_pass(
        &self,
        ctx: &mut PipelineContext,
        runtime: &RuntimeContext,
    ) -> Result<(usize, usize)> {
        let mut boosted = 0;
        let text = ctx.text.clone();
        let language = ctx.language;
        let entities = std::mem::take(&mut ctx.entities);
        ctx.entities = entities
            .into_iter()
            .map(|entity| {
                let recognizer = self.registry.get(&entity.entity_type);
                let words = recognizer
                    .map(|r| r.context_words.as_slice())
                    .unwrap_or(&[]);
                let use_defaults = recognizer.map(|r| r.use_global_context).unwrap_or(true);
                let (enhanced, adjustment) = self.enhancer.enhance(
                    &entity,
                    &text,
                    language,
                    words,
                    use_defaults,
                    runtime,
                );
                if adjustment == Adjustment::Boosted {
                    boosted += 1;
                }
                enhanced
            })
            .collect();
        Ok((0, boosted))
    }

    /// Document-type minimum confidence for non-address entities
    ///
    /// Address components are left alone here; they are scored as part of a
    /// grouped address and residuals are handled after grouping.
    fn document_rules_pass(&self, ctx: &mut PipelineContext) -> Result<(usize, usize)> {
        let min = ctx.document_type.min_confidence();
        let before = ctx.entities.len();
        ctx.entities.retain(|e| {
            e.entity_type.is_address_component() || e.confidence >= min
        });
        Ok((before - ctx.entities.len(), 0))
    }

    /// Group and score addresses
    fn address_pass(&self, ctx: &mut PipelineContext) -> Result<(usize, usize)> {
        let mut groups = self.grouper.group(&ctx.entities, &ctx.text);
        for group in &mut groups {
            self.scorer.score(group, ctx.text.len());
        }
        let count = groups.len();
        ctx.addresses = groups;
        tracing::debug!(addresses = count, "Address grouping complete");
        Ok((0, 0))
    }

    /// Final overlap resolution; residual ungrouped components below the
    /// document threshold are dropped here
    fn consolidate_pass(&self, ctx: &mut PipelineContext) -> Result<(usize, usize)> {
        let min = ctx.document_type.min_confidence();
        let before = ctx.entities.len();
        let addresses = std::mem::take(&mut ctx.addresses);
        let entities = std::mem::take(&mut ctx.entities);

        let entities: Vec<Entity> = entities
            .into_iter()
            .filter(|e| {
                !e.entity_type.is_address_component()
                    || addresses.iter().any(|a| a.covers(e))
                    || e.confidence >= min
            })
            .collect();

        ctx.entities = consolidate::consolidate(entities, &addresses, &ctx.text);
        ctx.addresses = addresses;
        let filtered = before.saturating_sub(ctx.entities.len());
        Ok((filtered, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CloakError;
    use crate::engine::context::ContextEnhancer;
    use crate::recognizers::builtin;

    fn pipeline() -> Pipeline {
        let mut registry = builtin::build_registry().expect("builtin registry");
        registry.freeze();
        Pipeline::new(
            Arc::new(registry),
            Arc::new(DenyList::with_defaults()),
            Arc::new(ContextEnhancer::new(50, 0.3, 0.4)),
            AddressGrouper::default(),
            AddressScorer::default(),
            None,
            RetryPolicy::default(),
            1_000_000,
        )
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let err = pipeline()
            .run("   ", &PipelineOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CloakError::Input(InputError::Empty)));
    }

    #[tokio::test]
    async fn test_oversize_input_rejected() {
        let p = Pipeline::new(
            Arc::new(builtin::build_registry().unwrap()),
            Arc::new(DenyList::new()),
            Arc::new(ContextEnhancer::new(50, 0.3, 0.4)),
            AddressGrouper::default(),
            AddressScorer::default(),
            None,
            RetryPolicy::default(),
            10,
        );
        let err = p
            .run("this is longer than ten bytes", &PipelineOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CloakError::Input(InputError::TooLong { .. })
        ));
    }

    #[tokio::test]
    async fn test_all_passes_reported_in_order() {
        let ctx = pipeline()
            .run(
                "Kontakt: info@example.ch",
                &PipelineOptions {
                    language: Language::De,
                    ..PipelineOptions::default()
                },
            )
            .await
            .unwrap();

        let names: Vec<&str> = ctx.metadata.passes.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, PASS_ORDER.to_vec());
    }

    #[tokio::test]
    async fn test_feature_flag_skips_filter_stages() {
        let options = PipelineOptions {
            filtering_enabled: false,
            language: Language::De,
            ..PipelineOptions::default()
        };
        let ctx = pipeline().run("Kontakt: info@example.ch", &options).await.unwrap();

        // pass order unchanged, stages recorded as skipped
        let names: Vec<&str> = ctx.metadata.passes.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, PASS_ORDER.to_vec());
        let deny = ctx.metadata.passes.iter().find(|p| p.name == "deny_list").unwrap();
        assert!(deny.failed.as_deref().unwrap().contains("feature flag"));
    }

    #[tokio::test]
    async fn test_invalid_iban_is_rejected_with_reason() {
        let ctx = pipeline()
            .run(
                "IBAN: CH9300762011623852958",
                &PipelineOptions {
                    language: Language::De,
                    ..PipelineOptions::default()
                },
            )
            .await
            .unwrap();

        assert!(ctx
            .entities
            .iter()
            .all(|e| e.entity_type != crate::domain::EntityType::Iban));
        let validate = ctx.metadata.passes.iter().find(|p| p.name == "validate").unwrap();
        assert!(validate.filtered >= 1);
    }

    #[tokio::test]
    async fn test_crlf_normalized() {
        let ctx = pipeline()
            .run("Zeile eins\r\nZeile zwei", &PipelineOptions::default())
            .await
            .unwrap();
        assert_eq!(ctx.text, "Zeile eins\nZeile zwei");
    }
}
