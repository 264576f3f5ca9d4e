//! Embedded default recognizer set
//!
//! The built-in library covers the supported Swiss/EU entity types and is
//! compiled into the binary. External recognizer files are loaded on top of
//! it; the registry's priority rules decide which entry wins per type.

use super::config::{self, RejectedRecognizer};
use super::RecognizerRegistry;
use crate::domain::{CloakError, Result};
use std::path::Path;

/// Default recognizer library, embedded at build time
const BUILTIN_RECOGNIZERS: &str = include_str!("../../patterns/recognizers.toml");

/// Build a registry holding the built-in recognizer set
///
/// A rejected built-in entry is a packaging defect, not a runtime
/// condition, so any rejection fails the build-up.
pub fn build_registry() -> Result<RecognizerRegistry> {
    let outcome = config::load_from_toml(BUILTIN_RECOGNIZERS)?;
    if let Some(rejected) = outcome.rejected.first() {
        return Err(CloakError::Configuration(format!(
            "built-in recognizer '{}' failed to compile: {}",
            rejected.name, rejected.reason
        )));
    }

    let mut registry = RecognizerRegistry::new();
    for recognizer in outcome.recognizers {
        registry.register(recognizer)?;
    }
    Ok(registry)
}

/// Build a registry from the built-ins plus an external recognizer file
///
/// External entries compete with the built-ins through the registry's
/// priority/specificity rules. Individually rejected entries are returned
/// for reporting; they never fail the load.
pub fn build_registry_with_overrides(
    path: impl AsRef<Path>,
) -> Result<(RecognizerRegistry, Vec<RejectedRecognizer>)> {
    let mut registry = build_registry()?;
    let outcome = config::load_from_file(path)?;
    for recognizer in outcome.recognizers {
        registry.register(recognizer)?;
    }
    Ok((registry, outcome.rejected))
}
