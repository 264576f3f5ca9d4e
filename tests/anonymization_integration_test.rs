//! End-to-end anonymization scenarios
//!
//! Exercises the full pipeline: recognition, validation, context scoring,
//! address grouping, consolidation, and the anonymization session.

use cloak::config::CloakConfig;
use cloak::domain::{DocumentType, EntityType, Language};
use cloak::engine::pipeline::PipelineOptions;
use cloak::engine::Engine;

fn engine() -> Engine {
    Engine::new(&CloakConfig::default()).expect("engine")
}

fn options(language: Language, document_type: DocumentType) -> PipelineOptions {
    PipelineOptions {
        language,
        document_type,
        ..PipelineOptions::default()
    }
}

#[tokio::test]
async fn swiss_address_becomes_single_placeholder() {
    let result = engine()
        .anonymize(
            "Rue de Lausanne 12, 1000 Lausanne",
            &options(Language::Fr, DocumentType::Letter),
        )
        .await
        .unwrap();

    assert_eq!(result.text, "ADDRESS_1");
    assert_eq!(result.record.addresses.len(), 1);

    let address = &result.record.addresses[0];
    assert_eq!(address.original_text, "Rue de Lausanne 12, 1000 Lausanne");
    assert_eq!(address.components.street.as_deref(), Some("Rue de Lausanne"));
    assert_eq!(address.components.number.as_deref(), Some("12"));
    assert_eq!(address.components.postal.as_deref(), Some("1000"));
    assert_eq!(address.components.city.as_deref(), Some("Lausanne"));
    assert!(address.auto_anonymize);
    assert!(!address.flagged_for_review);
}

#[tokio::test]
async fn invoice_table_header_is_not_a_person() {
    let detection = engine()
        .detect(
            "Montant\nCHF 1'250.00\nTotal\nCHF 1'350.00",
            &options(Language::Fr, DocumentType::Invoice),
        )
        .await
        .unwrap();

    assert!(
        !detection
            .entities
            .iter()
            .any(|e| e.entity_type == EntityType::PersonName),
        "table headers must never be emitted as PERSON_NAME"
    );
}

#[tokio::test]
async fn invalid_iban_checksum_never_reaches_output() {
    // One digit off the valid CH93 0076 2011 6238 5295 7
    let result = engine()
        .anonymize(
            "Bitte zahlen Sie auf CH93 0076 2011 6238 5295 8.",
            &options(Language::De, DocumentType::Letter),
        )
        .await
        .unwrap();

    assert!(result
        .record
        .entities
        .iter()
        .all(|e| e.entity_type != EntityType::Iban));
}

#[tokio::test]
async fn valid_iban_is_anonymized_with_checksum_confidence() {
    let result = engine()
        .anonymize(
            "Konto: CH93 0076 2011 6238 5295 7",
            &options(Language::De, DocumentType::Letter),
        )
        .await
        .unwrap();

    assert_eq!(result.text, "Konto: IBAN_1");
    let entity = &result.record.entities[0];
    assert_eq!(entity.entity_type, EntityType::Iban);
    // checksum-valid confidence, possibly lifted further by the "Konto" cue
    assert!(entity.confidence >= 0.95);
    assert_eq!(
        result.record.original_for("IBAN_1"),
        Some("CH93 0076 2011 6238 5295 7")
    );
}

#[tokio::test]
async fn repeated_names_share_one_placeholder() {
    let result = engine()
        .anonymize(
            "Sehr geehrter Herr Weber\n\nHerr Weber hat am 12.03.2024 unterschrieben.",
            &options(Language::De, DocumentType::Contract),
        )
        .await
        .unwrap();

    let placeholders: Vec<&str> = result
        .record
        .entities
        .iter()
        .filter(|e| e.entity_type == EntityType::PersonName)
        .map(|e| e.placeholder.as_str())
        .collect();
    assert_eq!(placeholders, vec!["PERSON_NAME_1"]);
    assert!(!result.text.contains("Weber"));
}

#[tokio::test]
async fn mapping_record_is_versioned_and_lists_passes() {
    let result = engine()
        .anonymize(
            "Kontakt: max@example.ch",
            &options(Language::De, DocumentType::Form),
        )
        .await
        .unwrap();

    assert_eq!(result.record.version, cloak::domain::MAPPING_RECORD_VERSION);
    assert_eq!(result.record.document_type, "form");
    // normalization and recognition always apply
    assert!(result
        .record
        .detection_methods
        .iter()
        .any(|m| m == "normalize"));
    assert!(result
        .record
        .detection_methods
        .iter()
        .any(|m| m == "recognize"));
}

#[tokio::test]
async fn swiss_invoice_full_document() {
    let text = "Muster Treuhand AG\nBahnhofstrasse 5, 8001 Zürich\n\
                UID: CHE-123.456.788 MWST\n\n\
                Rechnung an Herrn Peter Brunner\n\
                AHV-Nr. 756.9217.0769.85\n\
                Konto CH93 0076 2011 6238 5295 7\n\
                Tel. 044 123 45 67, peter.brunner@example.ch";

    let result = engine()
        .anonymize(text, &options(Language::De, DocumentType::Invoice))
        .await
        .unwrap();

    for pii in [
        "CHE-123.456.788",
        "756.9217.0769.85",
        "CH93 0076 2011 6238 5295 7",
        "044 123 45 67",
        "peter.brunner@example.ch",
        "Bahnhofstrasse 5, 8001 Zürich",
    ] {
        assert!(
            !result.text.contains(pii),
            "output still contains {pii}: {}",
            result.text
        );
    }

    let types: Vec<&EntityType> = result
        .record
        .entities
        .iter()
        .map(|e| &e.entity_type)
        .collect();
    assert!(types.contains(&&EntityType::VatNumber));
    assert!(types.contains(&&EntityType::NationalId));
    assert!(types.contains(&&EntityType::Iban));
    assert!(types.contains(&&EntityType::Phone));
    assert!(types.contains(&&EntityType::Email));
    assert_eq!(result.record.addresses.len(), 1);
}
