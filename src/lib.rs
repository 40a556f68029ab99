pub mod assets;
pub mod config;
pub mod correlate;
pub mod debugger;
pub mod graph;
pub mod logs;
pub mod observe;
pub mod pipeline;
pub mod replay;
pub mod transport;
pub mod util;

pub use assets::{AssetError, AssetLoader, ModuleLoader, SourceModuleLoader};
pub use config::{ConfigError, DebuggerConfig, IdentityError};
pub use correlate::{initial_sweep, CorrelationId, ObservingPlatform, RequestCorrelator};
pub use debugger::{Debugger, DebuggerError, LifecycleEmitter, DEBUGGER_PLATFORM};
pub use graph::{Node, NodeKind, Value};
pub use logs::LogInterceptor;
pub use observe::{Entry, ObservableContainer, ObservePolicy, ObservedView, Observer, UpdateEmitter};
pub use pipeline::{
    App, AppBuilder, CorePlatform, InboundRequest, LifecycleHook, Platform, PipelineError,
    RequestContext, RequestHandler, RequestSetup, Session,
};
pub use replay::replay;
pub use transport::{
    ConnectionState, DebuggerEvent, InboundCommand, OutboundEvent, RecordingTransport,
    SharedTransport, Transport, TransportError, TransportSession, WebSocketTransport,
};
