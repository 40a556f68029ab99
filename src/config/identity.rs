//! Identity token for the debugger service.
//!
//! The token is the webhook uuid stored in the user's framework config file
//! (`~/.jovo/configv4`, JSON, `webhook.uuid`).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::util::paths::user_config_path_in;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Home directory could not be determined")]
    NoHome,

    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No webhook uuid in {}", path.display())]
    MissingId { path: PathBuf },
}

#[derive(Debug, Default, Deserialize)]
struct UserConfigFile {
    #[serde(default)]
    webhook: Option<WebhookSection>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookSection {
    #[serde(default)]
    uuid: Option<String>,
}

/// Read the webhook uuid from the user config below `home`.
pub async fn resolve_webhook_id(home: &Path) -> Result<String, IdentityError> {
    let path = user_config_path_in(home);
    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| IdentityError::Read {
            path: path.clone(),
            source,
        })?;
    let file: UserConfigFile =
        serde_json::from_str(&contents).map_err(|source| IdentityError::Parse {
            path: path.clone(),
            source,
        })?;

    file.webhook
        .and_then(|webhook| webhook.uuid)
        .filter(|uuid| !uuid.trim().is_empty())
        .ok_or(IdentityError::MissingId { path })
}
