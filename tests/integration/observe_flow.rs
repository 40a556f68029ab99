//! Integration tests for live request observation
//!
//! Tests the flow: live request -> correlation -> initial sweep -> observed
//! handler writes -> lifecycle events, all over one recording transport.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use debug_bridge::{
    App, ConnectionState, CorePlatform, Debugger, InboundRequest, LogInterceptor, OutboundEvent,
    PipelineError, RecordingTransport, RequestContext, RequestHandler, Session, Value,
};
use serde_json::json;
use tokio::sync::mpsc;

use super::common::{enabled_config, event_names, harness};

/// Test that a live request produces sweep, request, update and response events in order
#[tokio::test]
async fn test_live_request_event_order() {
    let h = harness(enabled_config());

    let response = h
        .app
        .handle(InboundRequest::Live(json!({"platform": "core", "type": "LAUNCH"})))
        .await
        .expect("request should succeed");
    assert_eq!(response, json!({"text": "hi"}));

    assert_eq!(
        event_names(&h.recording),
        vec![
            "app.jovo-update",
            "app.jovo-update",
            "app.jovo-update",
            "app.jovo-update",
            "app.request",
            "app.jovo-update",
            "app.jovo-update",
            "app.jovo-update",
            "app.jovo-update",
            "app.response",
        ]
    );

    let paths: Vec<String> = h
        .recording
        .updates()
        .into_iter()
        .map(|update| update.data.path)
        .collect();
    assert_eq!(
        paths,
        vec![
            "$input",
            "$request",
            "$session",
            "$user",
            "$session.data",
            "$session.data.count",
            "$user.data",
            "$response",
        ]
    );
}

/// Test that every event of one request carries the same request id
#[tokio::test]
async fn test_events_share_one_request_id() {
    let h = harness(enabled_config());
    h.app
        .handle(InboundRequest::Live(json!({"platform": "core"})))
        .await
        .unwrap();

    let frames = h.recording.frames();
    let first = frames[0][1]["requestId"].clone();
    assert!(first.is_string());
    for frame in &frames {
        assert_eq!(frame[1]["requestId"], first);
    }
}

/// Test that two requests get distinct request ids
#[tokio::test]
async fn test_requests_are_correlated_separately() {
    let h = harness(enabled_config());
    for _ in 0..2 {
        h.app
            .handle(InboundRequest::Live(json!({"platform": "core"})))
            .await
            .unwrap();
    }

    let ids: Vec<_> = h
        .recording
        .events()
        .into_iter()
        .filter_map(|event| match event {
            OutboundEvent::Request(payload) => Some(payload.request_id),
            _ => None,
        })
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

/// Test that the request event carries the session's request payload
#[tokio::test]
async fn test_request_event_carries_payload() {
    let h = harness(enabled_config());
    let payload = json!({"platform": "core", "type": "INTENT", "intent": "HelloIntent"});
    h.app
        .handle(InboundRequest::Live(payload.clone()))
        .await
        .unwrap();

    let request = h
        .recording
        .events()
        .into_iter()
        .find_map(|event| match event {
            OutboundEvent::Request(payload) => Some(payload.data),
            _ => None,
        })
        .expect("request event");
    assert_eq!(request, payload);
}

/// Test that a dropped connection silences updates but fails the request
#[tokio::test]
async fn test_disconnected_transport_fails_lifecycle_only() {
    let h = harness(enabled_config());
    h.recording.set_state(ConnectionState::Disconnected);

    let result = h
        .app
        .handle(InboundRequest::Live(json!({"platform": "core"})))
        .await;
    assert!(matches!(result, Err(PipelineError::Hook(_))));
    assert!(h.recording.events().is_empty());
}

/// Handler that writes its request type to the same paths, yielding between
/// writes so concurrent requests interleave.
struct TaggingHandler;

#[async_trait]
impl RequestHandler for TaggingHandler {
    async fn handle(&self, ctx: &RequestContext, session: &Session) -> Result<(), PipelineError> {
        let tag = ctx.request["type"].as_str().unwrap_or_default().to_string();
        let user = session
            .get("$user")
            .into_container()
            .ok_or_else(|| PipelineError::Handler("missing $user".into()))?;
        for step in 0..3 {
            user.set("data", Value::from_json(json!({"who": tag, "step": step})));
            tokio::task::yield_now().await;
        }
        session.set("$response", Value::from_json(json!({"who": tag})));
        Ok(())
    }
}

/// Test that concurrently handled requests never carry each other's request id
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_do_not_cross_emit() {
    let debugger = Arc::new(Debugger::new(enabled_config(), LogInterceptor::new()));
    let mut builder =
        App::builder(Arc::new(TaggingHandler)).with_platform(Arc::new(CorePlatform::new("core")));
    debugger.install(&mut builder);
    let app = Arc::new(builder.build());
    let recording = Arc::new(RecordingTransport::new());
    let (_commands, rx) = mpsc::unbounded_channel();
    let _session = debugger
        .attach(app.clone(), recording.clone(), rx)
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let app = app.clone();
        let tag = if i % 2 == 0 { "A" } else { "B" };
        tasks.push(tokio::spawn(async move {
            app.handle(InboundRequest::Live(json!({"platform": "core", "type": tag})))
                .await
        }));
    }
    for task in tasks {
        let response = task.await.unwrap().unwrap();
        assert!(response["who"].is_string());
    }

    let events = recording.events();
    let tags: HashMap<_, _> = events
        .iter()
        .filter_map(|event| match event {
            OutboundEvent::Request(payload) => Some((
                payload.request_id,
                payload.data["type"].as_str().unwrap_or_default().to_string(),
            )),
            _ => None,
        })
        .collect();
    assert_eq!(tags.len(), 16);

    let mut user_writes: HashMap<_, usize> = HashMap::new();
    for update in recording.updates() {
        let tag = tags
            .get(&update.request_id)
            .expect("update carries a known request id");
        let value = &update.data.value;
        match update.data.path.as_str() {
            "$request" => assert_eq!(value["type"], json!(tag)),
            "$user.data" => {
                assert_eq!(value["who"], json!(tag));
                *user_writes.entry(update.request_id).or_default() += 1;
            }
            "$response" => assert_eq!(value["who"], json!(tag)),
            _ => {}
        }
    }
    assert_eq!(user_writes.len(), 16);
    assert!(user_writes.values().all(|count| *count == 3));

    for (id, tag) in &tags {
        let response = events
            .iter()
            .find_map(|event| match event {
                OutboundEvent::Response(payload) if payload.request_id == *id => {
                    Some(payload.data.clone())
                }
                _ => None,
            })
            .expect("response for every request");
        assert_eq!(response, json!({"who": tag}));
    }
}
