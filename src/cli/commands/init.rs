//! Init command: write a starter configuration file

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the configuration file
    #[arg(short, long, default_value = "cloak.toml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

const STARTER_CONFIG: &str = r#"# Cloak configuration

[engine]
# Hard input ceiling in bytes
max_input_bytes = 1000000
# Character window scanned for context words on each side of an entity
context_window = 50
context_boost_factor = 0.3
context_boosted_floor = 0.4
# Grouped addresses below review_threshold are flagged for review;
# at or above auto_threshold they are safe for unattended redaction
address_review_threshold = 0.6
address_auto_threshold = 0.85
address_max_gap = 16
# Feature flag for the deny-list/context-enhancement stages
filtering_enabled = true
# Optional external recognizer file layered over the built-ins
# recognizer_file = "recognizers.toml"

[ml]
# Token-classification service; rule-based detection always runs
enabled = false
# endpoint = "http://localhost:8500/classify"
timeout_secs = 30
max_attempts = 3
base_backoff_ms = 200
max_input_chars = 10000

[audit]
enabled = false
log_path = "./audit/cloak.jsonl"

[logging]
level = "info"
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#;

impl InitArgs {
    /// Execute the init command, returning a process exit code
    pub async fn execute(&self) -> anyhow::Result<i32> {
        if self.output.exists() && !self.force {
            eprintln!(
                "Refusing to overwrite {} (use --force)",
                self.output.display()
            );
            return Ok(2);
        }

        std::fs::write(&self.output, STARTER_CONFIG)
            .with_context(|| format!("Failed to write {}", self.output.display()))?;
        println!("Wrote starter configuration to {}", self.output.display());
        Ok(0)
    }
}
