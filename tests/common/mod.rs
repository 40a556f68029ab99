//! Shared test utilities
//!
//! - An app with the debugger attached to a [`RecordingTransport`]
//! - A handler that mutates the usual session fields
//! - Polling helper for events produced by the dispatch task

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use debug_bridge::{
    App, CorePlatform, Debugger, DebuggerConfig, InboundCommand, LogInterceptor, OutboundEvent,
    PipelineError, RecordingTransport, RequestContext, RequestHandler, Session, TransportSession,
    Value,
};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::mpsc;

/// Handler that writes session state the way a typical app does.
#[derive(Default)]
pub struct StateHandler {
    pub platforms: Mutex<Vec<String>>,
}

fn child(session: &Session, path: &[&str]) -> Result<Session, PipelineError> {
    let mut current = session.clone();
    for key in path {
        current = current
            .get(key)
            .into_container()
            .ok_or_else(|| PipelineError::Handler(format!("missing {key}")))?;
    }
    Ok(current)
}

#[async_trait]
impl RequestHandler for StateHandler {
    async fn handle(&self, ctx: &RequestContext, session: &Session) -> Result<(), PipelineError> {
        if let Some(platform) = &ctx.platform {
            self.platforms.lock().push(platform.clone());
        }

        // `data` starts empty, so it is replaced wholesale before nested writes
        // can be observed.
        let state = child(session, &["$session"])?;
        state.set("data", Value::from_json(json!({"count": 1})));
        state.set("data", Value::from_json(json!({"count": 1})));
        child(session, &["$session", "data"])?.set("count", Value::from(2));

        child(session, &["$user"])?.set("data", Value::from_json(json!({"name": "Ada"})));
        session.set("$app", Value::Opaque("Replaced".into()));
        session.set("$response", Value::from_json(json!({"text": "hi"})));
        Ok(())
    }
}

pub struct Harness {
    pub debugger: Arc<Debugger>,
    pub app: Arc<App>,
    pub handler: Arc<StateHandler>,
    pub recording: Arc<RecordingTransport>,
    pub commands: mpsc::UnboundedSender<InboundCommand>,
    pub session: TransportSession,
}

pub fn enabled_config() -> DebuggerConfig {
    DebuggerConfig {
        enabled: true,
        ..DebuggerConfig::default()
    }
}

/// App with a `core` platform and the debugger attached. Needs a runtime.
pub fn harness(config: DebuggerConfig) -> Harness {
    let handler = Arc::new(StateHandler::default());
    let debugger = Arc::new(Debugger::new(config, LogInterceptor::new()));

    let mut builder =
        App::builder(handler.clone()).with_platform(Arc::new(CorePlatform::new("core")));
    debugger.install(&mut builder);
    let app = Arc::new(builder.build());

    let recording = Arc::new(RecordingTransport::new());
    let (commands, rx) = mpsc::unbounded_channel();
    let session = debugger
        .attach(app.clone(), recording.clone(), rx)
        .expect("attach recording transport");

    Harness {
        debugger,
        app,
        handler,
        recording,
        commands,
        session,
    }
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn wait_until(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Event names in emission order.
pub fn event_names(recording: &RecordingTransport) -> Vec<&'static str> {
    recording
        .events()
        .iter()
        .map(|event| event.event().as_str())
        .collect()
}

pub fn has_response(recording: &RecordingTransport) -> bool {
    recording
        .events()
        .iter()
        .any(|event| matches!(event, OutboundEvent::Response(_)))
}
