//! Anonymize command: produce anonymized text plus a mapping record

use super::{load_or_default, parse_document_type, parse_language, read_document};
use crate::engine::pipeline::PipelineOptions;
use crate::engine::Engine;
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the anonymize command
#[derive(Args, Debug)]
pub struct AnonymizeArgs {
    /// Document file to anonymize (`-` for stdin)
    pub input: String,

    /// Write anonymized text here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the JSON mapping record here
    #[arg(short, long)]
    pub mapping: Option<PathBuf>,

    /// Document language (en, fr, de)
    #[arg(short, long, default_value = "en")]
    pub language: String,

    /// Document type hint (invoice, letter, form, contract, report, unknown)
    #[arg(short, long, default_value = "unknown")]
    pub document_type: String,

    /// Disable the deny-list and context-enhancement stages
    #[arg(long)]
    pub no_filtering: bool,
}

impl AnonymizeArgs {
    /// Execute the anonymize command, returning a process exit code
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = load_or_default(config_path)?;
        let engine = Engine::new(&config)?;

        let text = read_document(&self.input)?;
        let options = PipelineOptions {
            language: parse_language(&self.language)?,
            document_type: parse_document_type(&self.document_type)?,
            filtering_enabled: !self.no_filtering && config.engine.filtering_enabled,
            ..PipelineOptions::default()
        };

        let result = engine.anonymize(&text, &options).await?;

        tracing::info!(
            placeholders = result.record.total_mappings(),
            degraded = result.metadata.degraded_to_rule_only,
            "Anonymization complete"
        );

        match &self.output {
            Some(path) => std::fs::write(path, &result.text)
                .with_context(|| format!("Failed to write anonymized text to {}", path.display()))?,
            None => println!("{}", result.text),
        }

        if let Some(path) = &self.mapping {
            let json = serde_json::to_string_pretty(&result.record)?;
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write mapping record to {}", path.display()))?;
        }

        Ok(0)
    }
}
