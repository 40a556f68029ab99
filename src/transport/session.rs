//! Inbound command dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{ConnectionState, InboundCommand, Transport};

/// Reacts to commands sent by the debugger service.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    async fn handle(&self, command: InboundCommand) -> anyhow::Result<()>;
}

/// Drive `handler` with every command from `commands`, in arrival order.
///
/// A failing command is logged and the loop continues. The task ends when the
/// command channel closes.
pub fn spawn_dispatch(
    mut commands: mpsc::UnboundedReceiver<InboundCommand>,
    handler: Arc<dyn CommandHandler>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            let event = command.event();
            tracing::debug!(event = %event, "Received debugger command");
            if let Err(e) = handler.handle(command).await {
                tracing::error!(event = %event, error = %e, "Debugger command failed");
            }
        }
        tracing::debug!("Debugger command stream ended");
    })
}

/// A live connection plus its dispatch loop.
pub struct TransportSession {
    transport: Arc<dyn Transport>,
    dispatch: JoinHandle<()>,
}

impl TransportSession {
    pub fn start(
        transport: Arc<dyn Transport>,
        commands: mpsc::UnboundedReceiver<InboundCommand>,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        Self {
            transport,
            dispatch: spawn_dispatch(commands, handler),
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub fn is_finished(&self) -> bool {
        self.dispatch.is_finished()
    }

    /// Wait for the command stream to end.
    pub async fn join(self) {
        if let Err(e) = self.dispatch.await {
            tracing::warn!(error = %e, "Debugger dispatch task ended abnormally");
        }
    }

    pub fn abort(&self) {
        self.dispatch.abort();
    }
}
