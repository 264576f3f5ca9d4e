//! Configuration management
//!
//! Configuration comes from a TOML file with `${VAR}` substitution and
//! `CLOAK_*` environment overrides, validated before use. Every section
//! defaults sensibly, so the engine also runs without a file at all.

pub mod loader;
pub mod schema;

pub use loader::load_config;
pub use schema::{AuditConfig, CloakConfig, EngineConfig, LoggingConfig, MlConfig};
