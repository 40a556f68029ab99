use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use debug_bridge::{
    App, CorePlatform, Debugger, DebuggerConfig, LogInterceptor, PipelineError, RequestContext,
    RequestHandler, Session, Value,
};
use debug_bridge::config::{DEFAULT_CONFIG_FILE, DISABLE_FLAG};
use serde_json::json;
use tracing_subscriber::fmt::writer::MakeWriterExt;

#[derive(Parser, Debug)]
#[clap(
    name = "debug-bridge",
    version = env!("CARGO_PKG_VERSION"),
    about = "Runs an echo app with the live debugger attached"
)]
struct Cli {
    /// Connect to the debugger service
    #[clap(long)]
    webhook: bool,

    /// Same as --webhook
    #[clap(long)]
    jovo_webhook: bool,

    /// Never connect, even if --webhook is given
    #[clap(long)]
    disable_jovo_debugger: bool,

    /// TOML config file with a [debugger] table. Defaults to
    /// ./debug-bridge.toml when present.
    #[clap(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    /// The debugger flags that were given, spelled as on the command line.
    fn launch_flags(&self) -> impl Iterator<Item = &'static str> {
        [
            (self.webhook, "--webhook"),
            (self.jovo_webhook, "--jovo-webhook"),
            (self.disable_jovo_debugger, DISABLE_FLAG),
        ]
        .into_iter()
        .filter_map(|(given, flag)| given.then_some(flag))
    }
}

/// Answers every request with its own type and keeps it in session data.
struct EchoHandler;

#[async_trait]
impl RequestHandler for EchoHandler {
    async fn handle(&self, ctx: &RequestContext, session: &Session) -> Result<(), PipelineError> {
        let kind = ctx
            .request
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or("UNKNOWN")
            .to_string();

        if let Some(state) = session.get("$session").into_container() {
            state.set("data", Value::from_json(json!({ "lastType": kind })));
        }
        session.set(
            "$response",
            Value::from_json(json!({ "text": format!("You sent {kind}") })),
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let interceptor = LogInterceptor::new();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(
            interceptor
                .stderr()
                .with_max_level(tracing::Level::WARN)
                .or_else(interceptor.stdout()),
        )
        .with_ansi(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => DebuggerConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DebuggerConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE))
            .with_context(|| format!("Failed to load {DEFAULT_CONFIG_FILE}"))?,
    };
    config.apply_args(cli.launch_flags());

    let debugger = Arc::new(Debugger::new(config, interceptor));
    let mut builder =
        App::builder(Arc::new(EchoHandler)).with_platform(Arc::new(CorePlatform::new("core")));
    debugger.install(&mut builder);
    let app = Arc::new(builder.build());

    let session = if debugger.config().enabled {
        let session = debugger
            .initialize(app.clone())
            .await
            .context("Failed to start debugger")?;
        tracing::info!(endpoint = %debugger.config().webhook_url, "Debugger ready");
        Some(session)
    } else {
        tracing::info!("Debugger disabled, pass --webhook to enable");
        None
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    tracing::info!("Shutting down");

    if let Some(session) = session {
        session.abort();
    }
    Ok(())
}
