// Cloak - Multilingual PII Detection and Anonymization Engine
// Copyright (c) 2025 Cloak Contributors
// Licensed under the MIT License

//! # Cloak - PII Detection and Anonymization
//!
//! Cloak detects personally-identifiable information in unstructured
//! documents (invoices, letters, forms, contracts, reports) across EN/FR/DE
//! and Swiss/EU jurisdictions, and replaces detected spans with stable,
//! reversible placeholders backed by a versioned mapping record.
//!
//! ## Overview
//!
//! The engine runs a fixed multi-pass pipeline over each document:
//!
//! 1. **Normalize** — input validation and text canonicalization
//! 2. **Recognize** — rule-based recognizers plus optional ML
//!    token-classification with BIO merging
//! 3. **Deny-list filter** — known false positives removed per type/language
//! 4. **Validate** — exact checksum algorithms (IBAN mod-97, AHV EAN-13,
//!    country-specific VAT moduli) on a fixed confidence scale
//! 5. **Context-score** — lexical cues around each span adjust confidence
//! 6. **Document-type rules** — per-document-type confidence floors
//! 7. **Address grouping** — adjacent components linked into one address
//! 8. **Consolidate** — overlapping spans resolved deterministically
//!
//! The scored entity set then flows through a per-document anonymization
//! session that emits `TYPE_N` placeholders and a mapping record.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`engine`] - Pipeline, passes, session, audit, and reporting
//! - [`recognizers`] - Pattern recognizers and the priority registry
//! - [`validators`] - Checksum and format validators
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cloak::config::CloakConfig;
//! use cloak::engine::{pipeline::PipelineOptions, Engine};
//! use cloak::domain::Language;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Engine::new(&CloakConfig::default())?;
//!
//!     let options = PipelineOptions {
//!         language: Language::De,
//!         ..PipelineOptions::default()
//!     };
//!     let result = engine
//!         .anonymize("Herr Hans Müller, Bahnhofstrasse 5, 8001 Zürich", &options)
//!         .await?;
//!
//!     println!("{}", result.text);
//!     println!("{} placeholders", result.record.total_mappings());
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! The engine holds only frozen, read-only state (compiled recognizers,
//! deny lists, context words) and is safe to share across tasks. Every
//! document gets its own pipeline context and anonymization session, so
//! batches run fully in parallel with no cross-document pseudonym leakage.
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`] with the
//! [`domain::CloakError`] taxonomy: input errors are rejected with typed
//! reasons before inference, recognizer failures are isolated per
//! recognizer, ML failures degrade the document to rule-only detection,
//! and invalid external configuration falls back to the embedded defaults.
//! Log output never contains document text or detected values.

pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod logging;
pub mod recognizers;
pub mod validators;
