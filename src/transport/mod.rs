//! Connection to the remote debugger service.
//!
//! Outbound traffic goes through the [`Transport`] trait so the rest of the
//! crate never depends on the concrete Socket.IO client. Inbound traffic is
//! decoded into [`InboundCommand`]s and dispatched by [`TransportSession`].

mod events;
mod recording;
mod session;
mod socketio;
mod websocket;

use std::fmt;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

pub use events::{DebuggerEvent, DebuggerPayload, InboundCommand, OutboundEvent, UpdateData};
pub use recording::RecordingTransport;
pub use session::{spawn_dispatch, CommandHandler, TransportSession};
pub use socketio::{
    decode_event, encode_event, EnginePacket, Handshake, SocketPacket, ENGINE_IO_PROTOCOL,
    SOCKET_IO_PATH,
};
pub use websocket::{handshake_url, WebSocketTransport};

/// Role marker sent with the handshake.
pub const CLIENT_ROLE: &str = "app";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport is not connected")]
    NotConnected,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Connection closed")]
    Closed,
}

/// Outbound half of a debugger connection.
///
/// `emit` must not block and must not log through `tracing`: it is called
/// from inside the log sink.
pub trait Transport: Send + Sync {
    fn state(&self) -> ConnectionState;

    fn emit(&self, event: OutboundEvent) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

/// Process-wide slot holding the transport once it exists.
///
/// Cloned into every component that emits; filled once by the debugger after
/// connecting.
#[derive(Clone, Default)]
pub struct SharedTransport {
    slot: Arc<OnceLock<Arc<dyn Transport>>>,
}

impl SharedTransport {
    /// Store the transport. Returns `false` if one was already attached.
    pub fn attach(&self, transport: Arc<dyn Transport>) -> bool {
        self.slot.set(transport).is_ok()
    }

    pub fn get(&self) -> Option<Arc<dyn Transport>> {
        self.slot.get().cloned()
    }
}

impl fmt::Debug for SharedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedTransport")
            .field("state", &self.get().map(|t| t.state()))
            .finish()
    }
}
