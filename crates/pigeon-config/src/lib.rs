pub mod config;

pub use config::{
    Config, ConfigError, ConfigResult, GatewayConfig, LogLevel, LoggingConfig, PushConfig,
    ServerConfig,
};

use std::path::PathBuf;

/// Pigeon configuration directory
pub fn pigeon_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".pigeon"))
}

/// Default config file path (~/.pigeon/config.json)
pub fn default_config_path() -> Option<PathBuf> {
    pigeon_dir().map(|dir| dir.join("config.json"))
}

/// Expand a leading ~ to the user's home directory
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir().map(|home| home.join(rest))
    } else {
        Some(PathBuf::from(path))
    }
}
