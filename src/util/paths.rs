//! Path utilities

use std::path::{Path, PathBuf};

/// Framework config directory below the home directory
pub const USER_CONFIG_DIR: &str = ".jovo";

/// Framework config file inside [`USER_CONFIG_DIR`]
pub const USER_CONFIG_FILE: &str = "configv4";

pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Get the user config path below `home` (`<home>/.jovo/configv4`)
pub fn user_config_path_in(home: &Path) -> PathBuf {
    home.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE)
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve_in(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Resolve `path` against the current working directory.
pub fn resolve_from_cwd(path: &Path) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_in(&cwd, path)
}
