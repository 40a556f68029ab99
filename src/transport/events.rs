//! Wire events exchanged with the debugger service.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::{socketio, TransportError};
use crate::correlate::CorrelationId;

/// Every event name that travels over the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebuggerEvent {
    DebuggingAvailable,
    DebuggingUnavailable,
    DebuggerRequest,
    DebuggerLanguageModelRequest,
    AppRequest,
    AppResponse,
    AppJovoUpdate,
    AppConsoleLog,
    AppLanguageModelResponse,
}

impl DebuggerEvent {
    pub const ALL: [DebuggerEvent; 9] = [
        DebuggerEvent::DebuggingAvailable,
        DebuggerEvent::DebuggingUnavailable,
        DebuggerEvent::DebuggerRequest,
        DebuggerEvent::DebuggerLanguageModelRequest,
        DebuggerEvent::AppRequest,
        DebuggerEvent::AppResponse,
        DebuggerEvent::AppJovoUpdate,
        DebuggerEvent::AppConsoleLog,
        DebuggerEvent::AppLanguageModelResponse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DebuggerEvent::DebuggingAvailable => "debugging.available",
            DebuggerEvent::DebuggingUnavailable => "debugging.unavailable",
            DebuggerEvent::DebuggerRequest => "debugger.request",
            DebuggerEvent::DebuggerLanguageModelRequest => "debugger.language-model-request",
            DebuggerEvent::AppRequest => "app.request",
            DebuggerEvent::AppResponse => "app.response",
            DebuggerEvent::AppJovoUpdate => "app.jovo-update",
            DebuggerEvent::AppConsoleLog => "app.console-log",
            DebuggerEvent::AppLanguageModelResponse => "app.language-model-response",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == name)
    }
}

impl fmt::Display for DebuggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload shape shared by request, response and update events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebuggerPayload<T> {
    pub request_id: CorrelationId,
    pub data: T,
}

/// A single observed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateData {
    pub key: String,
    pub value: Json,
    pub path: String,
}

/// Events sent by the app.
#[derive(Debug, Clone)]
pub enum OutboundEvent {
    Request(DebuggerPayload<Json>),
    Response(DebuggerPayload<Json>),
    Update(DebuggerPayload<UpdateData>),
    ConsoleLog { text: String, stack: String },
    LanguageModel(BTreeMap<String, Json>),
}

impl OutboundEvent {
    pub fn event(&self) -> DebuggerEvent {
        match self {
            OutboundEvent::Request(_) => DebuggerEvent::AppRequest,
            OutboundEvent::Response(_) => DebuggerEvent::AppResponse,
            OutboundEvent::Update(_) => DebuggerEvent::AppJovoUpdate,
            OutboundEvent::ConsoleLog { .. } => DebuggerEvent::AppConsoleLog,
            OutboundEvent::LanguageModel(_) => DebuggerEvent::AppLanguageModelResponse,
        }
    }

    /// Event arguments. Console logs carry the text and the stack as two
    /// separate arguments; everything else carries one payload.
    pub fn args(&self) -> Result<Vec<Json>, TransportError> {
        let args = match self {
            OutboundEvent::Request(payload) | OutboundEvent::Response(payload) => {
                vec![serde_json::to_value(payload)?]
            }
            OutboundEvent::Update(payload) => vec![serde_json::to_value(payload)?],
            OutboundEvent::ConsoleLog { text, stack } => {
                vec![Json::String(text.clone()), Json::String(stack.clone())]
            }
            OutboundEvent::LanguageModel(models) => vec![serde_json::to_value(models)?],
        };
        Ok(args)
    }

    /// Encode as a Socket.IO event frame.
    pub fn to_frame(&self) -> Result<String, TransportError> {
        socketio::encode_event(self.event().as_str(), self.args()?)
    }
}

/// Commands received from the debugger service.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundCommand {
    DebuggingAvailable,
    DebuggingUnavailable,
    LanguageModelRequest,
    /// Replay of a raw request payload.
    DebuggerRequest(Json),
}

impl InboundCommand {
    pub fn event(&self) -> DebuggerEvent {
        match self {
            InboundCommand::DebuggingAvailable => DebuggerEvent::DebuggingAvailable,
            InboundCommand::DebuggingUnavailable => DebuggerEvent::DebuggingUnavailable,
            InboundCommand::LanguageModelRequest => DebuggerEvent::DebuggerLanguageModelRequest,
            InboundCommand::DebuggerRequest(_) => DebuggerEvent::DebuggerRequest,
        }
    }

    /// Decode a received event. App-side event names are rejected.
    pub fn from_event(name: &str, args: Vec<Json>) -> Result<Self, TransportError> {
        match DebuggerEvent::parse(name) {
            Some(DebuggerEvent::DebuggingAvailable) => Ok(InboundCommand::DebuggingAvailable),
            Some(DebuggerEvent::DebuggingUnavailable) => Ok(InboundCommand::DebuggingUnavailable),
            Some(DebuggerEvent::DebuggerLanguageModelRequest) => {
                Ok(InboundCommand::LanguageModelRequest)
            }
            Some(DebuggerEvent::DebuggerRequest) => Ok(InboundCommand::DebuggerRequest(
                args.into_iter().next().unwrap_or(Json::Null),
            )),
            _ => Err(TransportError::InvalidFrame(format!(
                "unexpected event '{name}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn event_names_round_trip() {
        for event in DebuggerEvent::ALL {
            assert_eq!(DebuggerEvent::parse(event.as_str()), Some(event));
        }
        assert_eq!(DebuggerEvent::parse("app.unknown"), None);
    }

    #[test]
    fn update_frame_uses_camel_case_request_id() {
        let event = OutboundEvent::Update(DebuggerPayload {
            request_id: CorrelationId::from_uuid(Uuid::nil()),
            data: UpdateData {
                key: "count".into(),
                value: json!(1),
                path: "$session.data.count".into(),
            },
        });
        let frame = event.to_frame().unwrap();
        assert!(frame.starts_with("42[\"app.jovo-update\","));
        let (name, args) = socketio::decode_event(&frame).unwrap();
        assert_eq!(name, "app.jovo-update");
        assert_eq!(
            args,
            vec![json!({
                "requestId": "00000000-0000-0000-0000-000000000000",
                "data": {"key": "count", "value": 1, "path": "$session.data.count"}
            })]
        );
    }

    #[test]
    fn console_log_sends_text_and_stack_as_two_arguments() {
        let event = OutboundEvent::ConsoleLog {
            text: "hello\n".into(),
            stack: "at main".into(),
        };
        assert_eq!(event.args().unwrap(), vec![json!("hello\n"), json!("at main")]);
        assert_eq!(event.event(), DebuggerEvent::AppConsoleLog);
    }

    #[test]
    fn inbound_events_decode_to_commands() {
        assert_eq!(
            InboundCommand::from_event("debugging.available", vec![]).unwrap(),
            InboundCommand::DebuggingAvailable
        );
        assert_eq!(
            InboundCommand::from_event("debugger.language-model-request", vec![]).unwrap(),
            InboundCommand::LanguageModelRequest
        );
        assert_eq!(
            InboundCommand::from_event("debugger.request", vec![json!({"type": "LAUNCH"})])
                .unwrap(),
            InboundCommand::DebuggerRequest(json!({"type": "LAUNCH"}))
        );
        assert_eq!(
            InboundCommand::from_event("debugger.request", vec![]).unwrap(),
            InboundCommand::DebuggerRequest(Json::Null)
        );
    }

    #[test]
    fn outbound_names_are_rejected() {
        assert!(matches!(
            InboundCommand::from_event("app.request", vec![json!({})]),
            Err(TransportError::InvalidFrame(_))
        ));
        assert!(matches!(
            InboundCommand::from_event("something.else", vec![]),
            Err(TransportError::InvalidFrame(_))
        ));
    }
}
