//! Debugger error types.

use crate::assets::AssetError;
use crate::config::IdentityError;
use crate::pipeline::PipelineError;
use crate::transport::TransportError;

/// Error type for debugger setup and emission.
#[derive(Debug, thiserror::Error)]
pub enum DebuggerError {
    /// The debugger was not enabled by config or launch flags.
    #[error("Debugger is disabled")]
    Disabled,

    /// The webhook id could not be resolved.
    #[error("Cannot resolve webhook id: {0}")]
    Identity(#[from] IdentityError),

    /// Connecting or sending failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A transport is already attached to this debugger.
    #[error("Debugger transport already attached")]
    AlreadyAttached,

    /// Lifecycle emission without any transport.
    #[error("Debugger transport is not available")]
    NoTransport,

    /// Lifecycle emission while the transport is down.
    #[error("Debugger transport is {0}")]
    NotConnected(crate::transport::ConnectionState),

    /// The request never passed through the correlator.
    #[error("Request has no debugger request id")]
    Uncorrelated,

    /// Language model snapshot failed.
    #[error("Language model error: {0}")]
    Asset(#[from] AssetError),

    /// A replayed request failed.
    #[error("Replay failed: {0}")]
    Replay(#[from] PipelineError),
}

impl From<DebuggerError> for PipelineError {
    fn from(err: DebuggerError) -> Self {
        match err {
            DebuggerError::Replay(inner) => inner,
            other => PipelineError::Hook(other.to_string()),
        }
    }
}
