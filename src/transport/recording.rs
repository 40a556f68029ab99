//! In-memory transport for tests.
//!
//! Captures every outbound event in emission order. The connection state can
//! be flipped to exercise the not-connected paths.

use parking_lot::Mutex;

use super::{
    socketio, ConnectionState, DebuggerPayload, OutboundEvent, Transport, TransportError, UpdateData,
};

pub struct RecordingTransport {
    state: Mutex<ConnectionState>,
    events: Mutex<Vec<OutboundEvent>>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingTransport {
    /// A connected, empty recorder.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ConnectionState::Connected),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn set_state(&self, state: ConnectionState) {
        *self.state.lock() = state;
    }

    pub fn events(&self) -> Vec<OutboundEvent> {
        self.events.lock().clone()
    }

    /// Only the `app.jovo-update` payloads, in order.
    pub fn updates(&self) -> Vec<DebuggerPayload<UpdateData>> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                OutboundEvent::Update(payload) => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every captured event encoded as it would go over the wire, then
    /// decoded back into its `[name, ...args]` array.
    pub fn frames(&self) -> Vec<serde_json::Value> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| event.to_frame().ok())
            .filter_map(|frame| socketio::decode_event(&frame))
            .map(|(name, args)| {
                let mut items = vec![serde_json::Value::String(name)];
                items.extend(args);
                serde_json::Value::Array(items)
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Transport for RecordingTransport {
    fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    fn emit(&self, event: OutboundEvent) -> Result<(), TransportError> {
        if self.state() != ConnectionState::Connected {
            return Err(TransportError::NotConnected);
        }
        self.events.lock().push(event);
        Ok(())
    }
}
