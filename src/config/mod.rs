mod identity;
mod settings;

use std::path::PathBuf;

use thiserror::Error;

pub use identity::{resolve_webhook_id, IdentityError};
pub use settings::{
    enabled_from_args, DebuggerConfig, TomlConfig, TomlDebuggerConfig, DEFAULT_CONFIG_FILE,
    DEFAULT_WEBHOOK_URL, DISABLE_FLAG, ENABLE_FLAGS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}
