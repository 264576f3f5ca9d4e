//! Detect command: run the pipeline and print scored entities

use super::{load_or_default, parse_document_type, parse_language, read_document};
use crate::engine::pipeline::PipelineOptions;
use crate::engine::Engine;
use clap::Args;
use serde::Serialize;

/// Arguments for the detect command
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Document file to analyze (`-` for stdin)
    pub input: String,

    /// Document language (en, fr, de)
    #[arg(short, long, default_value = "en")]
    pub language: String,

    /// Document type hint (invoice, letter, form, contract, report, unknown)
    #[arg(short, long, default_value = "unknown")]
    pub document_type: String,

    /// Disable the deny-list and context-enhancement stages
    #[arg(long)]
    pub no_filtering: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Serialize)]
struct DetectOutput<'a> {
    entities: &'a [crate::domain::Entity],
    degraded_to_rule_only: bool,
    passes: &'a [crate::engine::pipeline::PassReport],
}

impl DetectArgs {
    /// Execute the detect command, returning a process exit code
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

        let detection = engine.detect(&text, &options).await?;

        tracing::info!(
            entities = detection.entities.len(),
            addresses = detection.addresses.len(),
            degraded = detection.metadata.degraded_to_rule_only,
            "Detection complete"
        );

        let output = DetectOutput {
            entities: &detection.entities,
            degraded_to_rule_only: detection.metadata.degraded_to_rule_only,
            passes: &detection.metadata.passes,
        };
        let json = if self.pretty {
            serde_json::to_string_pretty(&output)?
        } else {
            serde_json::to_string(&output)?
        };
        println!("{json}");

        Ok(0)
    }
}
