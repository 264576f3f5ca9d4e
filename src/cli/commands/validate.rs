//! Validate-config command

use crate::config;
use crate::recognizers::config as recognizer_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command, returning a process exit code
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match config::load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("✗ Configuration invalid: {e}");
                return Ok(2);
            }
        };
        println!("✓ Configuration valid: {config_path}");

        if let Some(path) = &config.engine.recognizer_file {
            match recognizer_config::load_from_file(path) {
                Ok(outcome) => {
                    println!(
                        "✓ Recognizer file: {} entries compiled, {} rejected",
                        outcome.recognizers.len(),
                        outcome.rejected.len()
                    );
                    for rejected in &outcome.rejected {
                        println!("  ✗ {}: {}", rejected.name, rejected.reason);
                    }
                    if !outcome.rejected.is_empty() {
                        return Ok(2);
                    }
                }
                Err(e) => {
                    eprintln!("✗ Recognizer file invalid: {e}");
                    return Ok(2);
                }
            }
        }

        Ok(0)
    }
}
