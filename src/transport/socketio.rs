//! Socket.IO framing over a websocket.
//!
//! The debugger service speaks Socket.IO v2 on Engine.IO protocol 3. Every
//! websocket text frame is one Engine.IO packet: a type digit followed by an
//! optional payload. Message packets carry a Socket.IO packet, itself a type
//! digit, an optional namespace and ack id, then JSON. Events are JSON arrays
//! whose first element is the event name.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value as Json;

use super::TransportError;

/// Engine.IO protocol revision requested in the handshake.
pub const ENGINE_IO_PROTOCOL: &str = "3";

/// Path the Socket.IO server is mounted on.
pub const SOCKET_IO_PATH: &str = "/socket.io/";

/// Open packet payload sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    /// Milliseconds between client pings.
    pub ping_interval: u64,
    /// Milliseconds the server waits for a ping before dropping us.
    pub ping_timeout: u64,
}

impl Handshake {
    /// Ping period, never shorter than one second.
    pub fn ping_every(&self) -> Duration {
        Duration::from_millis(self.ping_interval.max(1000))
    }
}

/// One Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(text: &str) -> Result<Self, TransportError> {
        let mut chars = text.chars();
        let kind = chars
            .next()
            .ok_or_else(|| TransportError::InvalidFrame("empty packet".into()))?;
        let payload = chars.as_str();
        let packet = match kind {
            '0' => EnginePacket::Open(
                serde_json::from_str(payload)
                    .map_err(|e| TransportError::InvalidFrame(format!("bad open packet: {e}")))?,
            ),
            '1' => EnginePacket::Close,
            '2' => EnginePacket::Ping(payload.to_string()),
            '3' => EnginePacket::Pong(payload.to_string()),
            '4' => EnginePacket::Message(payload.to_string()),
            '5' => EnginePacket::Upgrade,
            '6' => EnginePacket::Noop,
            other => {
                return Err(TransportError::InvalidFrame(format!(
                    "unknown engine packet type '{other}'"
                )))
            }
        };
        Ok(packet)
    }

    /// Encode a client-side packet. `Open` is server-only and encodes as its
    /// type digit alone.
    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(_) => "0".to_string(),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(payload) => format!("2{payload}"),
            EnginePacket::Pong(payload) => format!("3{payload}"),
            EnginePacket::Message(payload) => format!("4{payload}"),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

/// One Socket.IO packet on the default namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect,
    Disconnect,
    Event { name: String, args: Vec<Json> },
    Error(Json),
    /// Acks and binary packets. The debugger protocol uses neither.
    Unsupported(char),
}

impl SocketPacket {
    /// Decode the payload of an Engine.IO message packet.
    pub fn decode(payload: &str) -> Result<Self, TransportError> {
        let mut chars = payload.chars();
        let kind = chars
            .next()
            .ok_or_else(|| TransportError::InvalidFrame("empty socket packet".into()))?;
        let mut rest = chars.as_str();

        if rest.starts_with('/') {
            let (namespace, tail) = rest.split_once(',').unwrap_or((rest, ""));
            if namespace != "/" {
                return Err(TransportError::InvalidFrame(format!(
                    "unexpected namespace '{namespace}'"
                )));
            }
            rest = tail;
        }
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());

        let packet = match kind {
            '0' => SocketPacket::Connect,
            '1' => SocketPacket::Disconnect,
            '2' => {
                let mut items = match serde_json::from_str::<Json>(rest) {
                    Ok(Json::Array(items)) => items,
                    Ok(_) => {
                        return Err(TransportError::InvalidFrame(
                            "event payload is not an array".into(),
                        ))
                    }
                    Err(e) => return Err(TransportError::InvalidFrame(e.to_string())),
                };
                if items.is_empty() {
                    return Err(TransportError::InvalidFrame("event without a name".into()));
                }
                let name = match items.remove(0) {
                    Json::String(name) => name,
                    other => {
                        return Err(TransportError::InvalidFrame(format!(
                            "event name is not a string: {other}"
                        )))
                    }
                };
                SocketPacket::Event { name, args: items }
            }
            '4' => SocketPacket::Error(serde_json::from_str(rest).unwrap_or(Json::Null)),
            other if other.is_ascii_digit() => SocketPacket::Unsupported(other),
            other => {
                return Err(TransportError::InvalidFrame(format!(
                    "unknown socket packet type '{other}'"
                )))
            }
        };
        Ok(packet)
    }
}

/// Encode an event as a complete websocket text frame (`42[...]`).
pub fn encode_event(name: &str, args: Vec<Json>) -> Result<String, TransportError> {
    let mut items = Vec::with_capacity(args.len() + 1);
    items.push(Json::String(name.to_string()));
    items.extend(args);
    let body = serde_json::to_string(&Json::Array(items))?;
    Ok(EnginePacket::Message(format!("2{body}")).encode())
}

/// Decode a complete websocket text frame into an event, if it is one.
pub fn decode_event(frame: &str) -> Option<(String, Vec<Json>)> {
    match EnginePacket::decode(frame).ok()? {
        EnginePacket::Message(payload) => match SocketPacket::decode(&payload).ok()? {
            SocketPacket::Event { name, args } => Some((name, args)),
            _ => None,
        },
        _ => None,
    }
}
