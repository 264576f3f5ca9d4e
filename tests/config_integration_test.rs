//! Configuration loading, env overrides, and external recognizer files

use cloak::config::{load_config, CloakConfig};
use cloak::domain::{DocumentType, EntityType, Language};
use cloak::engine::pipeline::PipelineOptions;
use cloak::engine::Engine;
use cloak::recognizers::builtin;
use std::io::Write;

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn full_config_file_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "cloak.toml",
        r#"
        [engine]
        max_input_bytes = 500000
        context_window = 40
        filtering_enabled = false

        [ml]
        enabled = true
        endpoint = "http://localhost:8500/classify"
        max_attempts = 5

        [audit]
        enabled = true
        log_path = "./audit/test.jsonl"

        [logging]
        level = "debug"
        "#,
    );

    let config = load_config(&path).unwrap();
    assert_eq!(config.engine.max_input_bytes, 500_000);
    assert_eq!(config.engine.context_window, 40);
    assert!(!config.engine.filtering_enabled);
    assert!(config.ml.enabled);
    assert_eq!(config.ml.max_attempts, 5);
    assert!(config.audit.enabled);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn env_override_wins_over_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "cloak.toml",
        "[audit]\nlog_path = \"./from-file.jsonl\"\n",
    );

    std::env::set_var("CLOAK_AUDIT_LOG_PATH", "/tmp/from-env.jsonl");
    let config = load_config(&path).unwrap();
    std::env::remove_var("CLOAK_AUDIT_LOG_PATH");

    assert_eq!(config.audit.log_path.to_str().unwrap(), "/tmp/from-env.jsonl");
}

#[tokio::test]
async fn external_recognizer_overrides_builtin_by_priority() {
    let dir = tempfile::tempdir().unwrap();
    // A jurisdiction file that claims EMAIL at higher priority with a
    // stricter pattern (corporate domain only)
    let recognizer_path = write_file(
        &dir,
        "recognizers.toml",
        r#"
        [[recognizers]]
        name = "email_corporate_only"
        entity_type = "EMAIL"
        priority = 50
        specificity = "regional"
        confidence = 0.9
        patterns = ['[A-Za-z0-9._%+-]+@firma\.ch']
        validator = "email"
        "#,
    );

    let mut config = CloakConfig::default();
    config.engine.recognizer_file = Some(recognizer_path);
    let engine = Engine::new(&config).unwrap();

    let options = PipelineOptions {
        language: Language::De,
        document_type: DocumentType::Letter,
        ..PipelineOptions::default()
    };

    // the corporate pattern matches
    let detection = engine
        .detect("Kontakt: hans@firma.ch", &options)
        .await
        .unwrap();
    let email = detection
        .entities
        .iter()
        .find(|e| e.entity_type == EntityType::Email)
        .expect("email entity");
    assert_eq!(email.recognizer.as_deref(), Some("email_corporate_only"));

    // the replaced builtin pattern no longer does
    let detection = engine
        .detect("Kontakt: hans@elsewhere.com", &options)
        .await
        .unwrap();
    assert!(detection
        .entities
        .iter()
        .all(|e| e.entity_type != EntityType::Email));
}

#[tokio::test]
async fn invalid_recognizer_entries_are_rejected_individually() {
    let dir = tempfile::tempdir().unwrap();
    let recognizer_path = write_file(
        &dir,
        "recognizers.toml",
        r#"
        [[recognizers]]
        name = "broken_pattern"
        entity_type = "PHONE"
        priority = 99
        patterns = ['([unclosed']

        [[recognizers]]
        name = "valid_entry"
        entity_type = "EMAIL"
        priority = 50
        confidence = 0.9
        patterns = ['[A-Za-z0-9._%+-]+@firma\.ch']
        "#,
    );

    let (registry, rejected) =
        builtin::build_registry_with_overrides(&recognizer_path).unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].name, "broken_pattern");

    // the valid entry replaced the builtin; the builtin phone survives
    assert_eq!(
        registry.get(&EntityType::Email).unwrap().name,
        "valid_entry"
    );
    assert_eq!(registry.get(&EntityType::Phone).unwrap().name, "phone_ch_eu");
}

#[tokio::test]
async fn unreadable_recognizer_file_falls_back_to_builtins() {
    let mut config = CloakConfig::default();
    config.engine.recognizer_file = Some("/nonexistent/recognizers.toml".into());

    // the engine still builds, using embedded defaults
    let engine = Engine::new(&config).unwrap();
    let detection = engine
        .detect(
            "Kontakt: hans@example.ch",
            &PipelineOptions::default(),
        )
        .await
        .unwrap();
    assert!(detection
        .entities
        .iter()
        .any(|e| e.entity_type == EntityType::Email));
}

#[test]
fn audit_trail_receives_entries_from_engine() {
    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("audit").join("cloak.jsonl");

    let mut config = CloakConfig::default();
    config.audit.enabled = true;
    config.audit.log_path = audit_path.clone();

    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        let engine = Engine::new(&config).unwrap();
        engine
            .anonymize("Kontakt: anna@example.ch", &PipelineOptions::default())
            .await
            .unwrap();
    });

    let content = std::fs::read_to_string(&audit_path).unwrap();
    assert!(!content.contains("anna@example.ch"));
    let entry: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(entry["entity_count"], 1);
}
