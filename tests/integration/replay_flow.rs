//! Integration tests for commands sent by the debugger
//!
//! Tests the flow: inbound command -> dispatch task -> replay / arming /
//! emission, observed through the recording transport.

use debug_bridge::{InboundCommand, InboundRequest, OutboundEvent, DEBUGGER_PLATFORM};
use serde_json::json;

use super::common::{enabled_config, event_names, harness, has_response, wait_until};

/// Test that a replayed request runs through the debugger platform and is observed
#[tokio::test]
async fn test_replay_is_observed_like_live_traffic() {
    let h = harness(enabled_config());

    h.commands
        .send(InboundCommand::DebuggerRequest(
            json!({"platform": DEBUGGER_PLATFORM, "type": "LAUNCH"}),
        ))
        .unwrap();
    assert!(wait_until(|| has_response(&h.recording)).await);

    assert_eq!(*h.handler.platforms.lock(), vec![DEBUGGER_PLATFORM.to_string()]);
    let paths: Vec<String> = h
        .recording
        .updates()
        .into_iter()
        .map(|update| update.data.path)
        .collect();
    assert!(paths.contains(&"$session.data.count".to_string()));
    assert!(paths.contains(&"$response".to_string()));
}

/// Test that replay and live handling produce the same event sequence
#[tokio::test]
async fn test_replay_matches_live_sequence() {
    let payload = json!({"platform": "core", "type": "LAUNCH"});

    let live = harness(enabled_config());
    live.app
        .handle(InboundRequest::Live(payload.clone()))
        .await
        .unwrap();

    let replayed = harness(enabled_config());
    replayed
        .commands
        .send(InboundCommand::DebuggerRequest(payload))
        .unwrap();
    assert!(wait_until(|| has_response(&replayed.recording)).await);

    assert_eq!(event_names(&live.recording), event_names(&replayed.recording));
}

/// Test that a failing replay is logged and later commands still run
#[tokio::test]
async fn test_failed_replay_does_not_stop_dispatch() {
    let h = harness(enabled_config());

    h.commands
        .send(InboundCommand::DebuggerRequest(json!({"platform": "unknown"})))
        .unwrap();
    h.commands
        .send(InboundCommand::DebuggerRequest(json!({"platform": "core"})))
        .unwrap();
    assert!(wait_until(|| has_response(&h.recording)).await);
    assert_eq!(*h.handler.platforms.lock(), vec!["core".to_string()]);
}

/// Test that debugging.available arms console forwarding once
#[tokio::test]
async fn test_debugging_available_arms_interceptor() {
    let h = harness(enabled_config());
    assert!(!h.debugger.interceptor().is_armed());

    h.commands.send(InboundCommand::DebuggingAvailable).unwrap();
    h.commands.send(InboundCommand::DebuggingAvailable).unwrap();
    assert!(wait_until(|| h.debugger.interceptor().is_armed()).await);
}

/// Test that debugging.unavailable leaves forwarding untouched
#[tokio::test]
async fn test_debugging_unavailable_is_ignored() {
    let h = harness(enabled_config());
    h.commands.send(InboundCommand::DebuggingUnavailable).unwrap();
    h.commands
        .send(InboundCommand::DebuggerRequest(json!({"platform": "core"})))
        .unwrap();
    assert!(wait_until(|| has_response(&h.recording)).await);

    assert!(!h.debugger.interceptor().is_armed());
    assert!(!h
        .recording
        .events()
        .iter()
        .any(|event| matches!(event, OutboundEvent::ConsoleLog { .. })));
}
