//! Socket.IO client transport over a websocket.
//!
//! One connection per process. A writer task drains an unbounded channel so
//! emission never waits on the network, a pinger keeps the Engine.IO session
//! alive, and a reader task decodes events into [`InboundCommand`]s for the
//! dispatch loop.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use url::Url;

use super::socketio::{EnginePacket, Handshake, SocketPacket, ENGINE_IO_PROTOCOL, SOCKET_IO_PATH};
use super::{ConnectionState, InboundCommand, OutboundEvent, Transport, TransportError, CLIENT_ROLE};

/// Build the handshake URL: the Socket.IO websocket endpoint of `endpoint`,
/// tagged with the identity token and the role marker. `http(s)` endpoints
/// are mapped to `ws(s)`.
pub fn handshake_url(endpoint: &str, webhook_id: &str) -> Result<Url, TransportError> {
    let mut url = Url::parse(endpoint)?;
    let scheme = match url.scheme() {
        "http" => Some("ws"),
        "https" => Some("wss"),
        _ => None,
    };
    if let Some(scheme) = scheme {
        url.set_scheme(scheme)
            .map_err(|_| TransportError::Connect(format!("cannot use scheme for {endpoint}")))?;
    }
    url.set_path(SOCKET_IO_PATH);
    url.set_query(None);
    url.query_pairs_mut()
        .append_pair("EIO", ENGINE_IO_PROTOCOL)
        .append_pair("transport", "websocket")
        .append_pair("id", webhook_id)
        .append_pair("type", CLIENT_ROLE);
    Ok(url)
}

/// How long the server has to send its open packet.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(20);

fn text(packet: EnginePacket) -> Message {
    Message::Text(packet.encode().into())
}

pub struct WebSocketTransport {
    outbound: mpsc::UnboundedSender<Message>,
    state: Arc<Mutex<ConnectionState>>,
}

impl WebSocketTransport {
    /// Open the connection, wait for the Engine.IO open packet and start the
    /// reader, writer and pinger tasks.
    ///
    /// The returned receiver yields decoded inbound commands until the
    /// connection ends.
    pub async fn connect(
        endpoint: &str,
        webhook_id: &str,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<InboundCommand>), TransportError> {
        let url = handshake_url(endpoint, webhook_id)?;
        let state = Arc::new(Mutex::new(ConnectionState::Connecting));

        tracing::info!(endpoint = %endpoint, "Connecting to debugger service");
        let (stream, _response) = match connect_async(url.as_str()).await {
            Ok(connected) => connected,
            Err(e) => {
                *state.lock() = ConnectionState::Error;
                return Err(TransportError::Connect(e.to_string()));
            }
        };
        let (mut sink, mut source) = stream.split();

        let opened = tokio::time::timeout(HANDSHAKE_TIMEOUT, await_open(&mut source))
            .await
            .unwrap_or_else(|_| Err(TransportError::Connect("handshake timed out".into())));
        let handshake = match opened {
            Ok(handshake) => handshake,
            Err(e) => {
                *state.lock() = ConnectionState::Error;
                return Err(e);
            }
        };
        *state.lock() = ConnectionState::Connected;
        tracing::info!(endpoint = %endpoint, sid = %handshake.sid, "Connected to debugger service");

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let writer_state = state.clone();
        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if let Err(e) = sink.send(message).await {
                    *writer_state.lock() = ConnectionState::Error;
                    tracing::warn!(error = %e, "Failed to send frame to debugger service");
                    break;
                }
            }
        });

        let ping_tx = outbound_tx.clone();
        let ping_every = handshake.ping_every();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(ping_every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if ping_tx.send(text(EnginePacket::Ping(String::new()))).is_err() {
                    break;
                }
            }
        });

        let reader_state = state.clone();
        let reply_tx = outbound_tx.clone();
        tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(frame)) => match handle_packet(&frame, &reply_tx, &command_tx) {
                        PacketFlow::Continue => {}
                        PacketFlow::Closed => {
                            *reader_state.lock() = ConnectionState::Disconnected;
                            tracing::info!("Debugger service ended the session");
                            break;
                        }
                        PacketFlow::Stop => break,
                    },
                    Ok(Message::Ping(data)) => {
                        let _ = reply_tx.send(Message::Pong(data));
                    }
                    Ok(Message::Close(_)) => {
                        *reader_state.lock() = ConnectionState::Disconnected;
                        tracing::info!("Debugger service closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        *reader_state.lock() = ConnectionState::Error;
                        tracing::warn!(error = %e, "Debugger connection error");
                        break;
                    }
                }
            }
            let mut state = reader_state.lock();
            if *state == ConnectionState::Connected {
                *state = ConnectionState::Disconnected;
            }
        });

        let transport = Arc::new(Self {
            outbound: outbound_tx,
            state,
        });
        Ok((transport, command_rx))
    }
}

/// Read frames until the server's open packet arrives.
async fn await_open<S>(source: &mut S) -> Result<Handshake, TransportError>
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(frame) = source.next().await {
        match frame {
            Ok(Message::Text(frame)) => match EnginePacket::decode(&frame)? {
                EnginePacket::Open(handshake) => return Ok(handshake),
                other => {
                    tracing::debug!(packet = ?other, "Ignoring packet before handshake");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => return Err(TransportError::Connect(e.to_string())),
        }
    }
    Err(TransportError::Connect(
        "connection closed before the handshake".into(),
    ))
}

enum PacketFlow {
    Continue,
    /// The server ended the Socket.IO session.
    Closed,
    /// Nobody is listening for commands any more.
    Stop,
}

fn handle_packet(
    frame: &str,
    replies: &mpsc::UnboundedSender<Message>,
    commands: &mpsc::UnboundedSender<InboundCommand>,
) -> PacketFlow {
    let packet = match EnginePacket::decode(frame) {
        Ok(packet) => packet,
        Err(e) => {
            tracing::debug!(error = %e, "Dropping undecodable frame");
            return PacketFlow::Continue;
        }
    };

    let payload = match packet {
        EnginePacket::Message(payload) => payload,
        EnginePacket::Ping(payload) => {
            let _ = replies.send(text(EnginePacket::Pong(payload)));
            return PacketFlow::Continue;
        }
        EnginePacket::Close => return PacketFlow::Closed,
        _ => return PacketFlow::Continue,
    };

    match SocketPacket::decode(&payload) {
        Ok(SocketPacket::Event { name, args }) => match InboundCommand::from_event(&name, args) {
            Ok(command) => {
                if commands.send(command).is_err() {
                    return PacketFlow::Stop;
                }
            }
            Err(e) => tracing::debug!(error = %e, "Dropping unexpected event"),
        },
        Ok(SocketPacket::Connect) => tracing::debug!("Joined debugger namespace"),
        Ok(SocketPacket::Disconnect) => return PacketFlow::Closed,
        Ok(SocketPacket::Error(error)) => {
            tracing::warn!(error = %error, "Debugger service rejected the connection");
        }
        Ok(SocketPacket::Unsupported(kind)) => {
            tracing::debug!(kind = %kind, "Ignoring unsupported socket packet");
        }
        Err(e) => tracing::debug!(error = %e, "Dropping undecodable frame"),
    }
    PacketFlow::Continue
}

impl Transport for WebSocketTransport {
    fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    fn emit(&self, event: OutboundEvent) -> Result<(), TransportError> {
        if self.state() != ConnectionState::Connected {
            return Err(TransportError::NotConnected);
        }
        let frame = event.to_frame()?;
        self.outbound
            .send(Message::Text(frame.into()))
            .map_err(|_| TransportError::Closed)
    }
}
