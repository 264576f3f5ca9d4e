//! Domain models and types for Cloak.
//!
//! This module contains the core domain models shared by every pipeline
//! pass:
//!
//! - **Entities** ([`Entity`], [`EntityType`], [`DetectionSource`])
//! - **Locale types** ([`Language`], [`Country`], [`Specificity`], [`DocumentType`])
//! - **Validation scale** ([`ValidationConfidence`], [`ValidationResult`])
//! - **Mapping record** ([`MappingRecord`] and friends)
//! - **Error types** ([`CloakError`], [`InputError`], [`MlError`])
//! - **Result type alias** ([`Result`])
//!
//! Entities are immutable once emitted by a pass; confidence adjustments go
//! through [`Entity::with_confidence`] and produce a new value, so no pass
//! can drift a float another pass already relied on.

pub mod confidence;
pub mod entity;
pub mod errors;
pub mod language;
pub mod mapping;
pub mod result;

// Re-export commonly used types for convenience
pub use confidence::{ValidationConfidence, ValidationResult};
pub use entity::{DetectionSource, Entity, EntityType};
pub use errors::{CloakError, InputError, MlError};
pub use language::{Country, DocumentType, Language, Specificity};
pub use mapping::{
    AddressComponents, MappedAddress, MappedEntity, MappingRecord, MAPPING_RECORD_VERSION,
};
pub use result::Result;
