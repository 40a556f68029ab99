//! Integration tests for language model snapshots
//!
//! Tests the flow: language-model request -> asset loader -> one
//! `app.language-model-response` event keyed by locale.

use debug_bridge::{DebuggerConfig, InboundCommand, OutboundEvent};
use serde_json::json;
use tempfile::TempDir;

use super::common::{enabled_config, harness, wait_until};

fn language_models(events: &[OutboundEvent]) -> Vec<serde_json::Value> {
    events
        .iter()
        .filter_map(|event| match event {
            OutboundEvent::LanguageModel(models) => serde_json::to_value(models).ok(),
            _ => None,
        })
        .collect()
}

/// Test that locale files are sent keyed by locale, skipping broken ones
#[tokio::test]
async fn test_language_model_request_sends_snapshot() {
    let models = TempDir::new().unwrap();
    std::fs::write(
        models.path().join("en.json"),
        r#"{"invocation": "my test app"}"#,
    )
    .unwrap();
    std::fs::write(
        models.path().join("de.json"),
        r#"{"invocation": "meine test app"}"#,
    )
    .unwrap();
    std::fs::write(models.path().join("fr.json"), "{ broken").unwrap();
    std::fs::write(models.path().join("README.md"), "# models").unwrap();

    let h = harness(DebuggerConfig {
        language_model_path: Some(models.path().to_path_buf()),
        ..enabled_config()
    });
    h.commands.send(InboundCommand::LanguageModelRequest).unwrap();
    assert!(wait_until(|| !language_models(&h.recording.events()).is_empty()).await);

    let sent = language_models(&h.recording.events());
    assert_eq!(
        sent[0],
        json!({
            "de": {"invocation": "meine test app"},
            "en": {"invocation": "my test app"}
        })
    );

    let frame = &h.recording.frames()[0];
    assert_eq!(frame[0], "app.language-model-response");
}

/// Test that a disabled feature sends nothing and keeps dispatching
#[tokio::test]
async fn test_language_model_disabled_sends_nothing() {
    let models = TempDir::new().unwrap();
    std::fs::write(models.path().join("en.json"), "{}").unwrap();

    let h = harness(DebuggerConfig {
        language_model_enabled: false,
        language_model_path: Some(models.path().to_path_buf()),
        ..enabled_config()
    });
    h.commands.send(InboundCommand::LanguageModelRequest).unwrap();
    h.commands.send(InboundCommand::DebuggingAvailable).unwrap();
    assert!(wait_until(|| h.debugger.interceptor().is_armed()).await);

    assert!(language_models(&h.recording.events()).is_empty());
}

/// Test that a missing model directory is logged without crashing dispatch
#[tokio::test]
async fn test_missing_model_directory_keeps_dispatching() {
    let root = TempDir::new().unwrap();
    let h = harness(DebuggerConfig {
        language_model_path: Some(root.path().join("models")),
        ..enabled_config()
    });
    h.commands.send(InboundCommand::LanguageModelRequest).unwrap();
    h.commands.send(InboundCommand::DebuggingAvailable).unwrap();
    assert!(wait_until(|| h.debugger.interceptor().is_armed()).await);

    assert!(language_models(&h.recording.events()).is_empty());
}
