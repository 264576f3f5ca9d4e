//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::CloakConfig;
use crate::domain::errors::CloakError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into CloakConfig
/// 4. Applies environment variable overrides (CLOAK_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, TOML parsing fails, a
/// referenced environment variable is unset, or validation fails.
pub fn load_config(path: impl AsRef<Path>) -> Result<CloakConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CloakError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        CloakError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: CloakConfig = toml::from_str(&contents)
        .map_err(|e| CloakError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        CloakError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched. A referenced but unset variable is an
/// error listing every missing name.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(CloakError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the CLOAK_* prefix
///
/// Variables follow the pattern CLOAK_<SECTION>_<KEY>, for example
/// CLOAK_ML_ENDPOINT or CLOAK_AUDIT_ENABLED.
fn apply_env_overrides(config: &mut CloakConfig) {
    // Engine overrides
    if let Ok(val) = std::env::var("CLOAK_ENGINE_MAX_INPUT_BYTES") {
        if let Ok(parsed) = val.parse() {
            config.engine.max_input_bytes = parsed;
        }
    }
    if let Ok(val) = std::env::var("CLOAK_ENGINE_FILTERING_ENABLED") {
        if let Ok(parsed) = val.parse() {
            config.engine.filtering_enabled = parsed;
        }
    }
    if let Ok(val) = std::env::var("CLOAK_ENGINE_RECOGNIZER_FILE") {
        config.engine.recognizer_file = Some(val.into());
    }

    // ML overrides
    if let Ok(val) = std::env::var("CLOAK_ML_ENABLED") {
        if let Ok(parsed) = val.parse() {
            config.ml.enabled = parsed;
        }
    }
    if let Ok(val) = std::env::var("CLOAK_ML_ENDPOINT") {
        config.ml.endpoint = Some(val);
    }
    if let Ok(val) = std::env::var("CLOAK_ML_MAX_ATTEMPTS") {
        if let Ok(parsed) = val.parse() {
            config.ml.max_attempts = parsed;
        }
    }

    // Audit overrides
    if let Ok(val) = std::env::var("CLOAK_AUDIT_ENABLED") {
        if let Ok(parsed) = val.parse() {
            config.audit.enabled = parsed;
        }
    }
    if let Ok(val) = std::env::var("CLOAK_AUDIT_LOG_PATH") {
        config.audit.log_path = val.into();
    }

    // Logging overrides
    if let Ok(val) = std::env::var("CLOAK_LOGGING_LEVEL") {
        config.logging.level = val;
    }
}
