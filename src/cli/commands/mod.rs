//! CLI command implementations

pub mod anonymize;
pub mod detect;
pub mod init;
pub mod validate;

use crate::config::CloakConfig;
use crate::domain::{DocumentType, Language};
use anyhow::Context;
use std::path::Path;

/// Load configuration, falling back to defaults when the default config
/// file is absent
pub(crate) fn load_or_default(config_path: &str) -> anyhow::Result<CloakConfig> {
    if Path::new(config_path).exists() {
        crate::config::load_config(config_path)
            .with_context(|| format!("Failed to load configuration from {config_path}"))
    } else if config_path == "cloak.toml" {
        // No explicit config requested; embedded defaults apply
        Ok(CloakConfig::default())
    } else {
        anyhow::bail!("Configuration file not found: {config_path}")
    }
}

/// Parse a language argument
pub(crate) fn parse_language(code: &str) -> anyhow::Result<Language> {
    Language::parse(code)
        .ok_or_else(|| anyhow::anyhow!("Unsupported language '{code}' (expected en, fr, or de)"))
}

/// Parse a document type argument
pub(crate) fn parse_document_type(value: &str) -> anyhow::Result<DocumentType> {
    match value.to_lowercase().as_str() {
        "invoice" => Ok(DocumentType::Invoice),
        "letter" => Ok(DocumentType::Letter),
        "form" => Ok(DocumentType::Form),
        "contract" => Ok(DocumentType::Contract),
        "report" => Ok(DocumentType::Report),
        "unknown" => Ok(DocumentType::Unknown),
        other => anyhow::bail!("Unknown document type '{other}'"),
    }
}

/// Read a document from a path, `-` meaning stdin
pub(crate) fn read_document(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        use std::io::Read;
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read document from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read document {path}"))
    }
}
