//! Settings resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG path → defaults.
//! Circuit and observation files are always named explicitly, so only the
//! settings file goes through discovery.

use std::path::{Path, PathBuf};

/// Discovered configuration file paths.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path to settings.json (None when using built-in defaults).
    pub settings: Option<PathBuf>,

    /// Where the settings path came from.
    pub settings_source: ConfigSource,
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    CliArgument,
    Environment,
    XdgConfig,
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable naming a settings file directly.
pub const ENV_SETTINGS_PATH: &str = "FAULTDX_SETTINGS";
/// Environment variable naming a directory holding settings.json.
pub const ENV_CONFIG_DIR: &str = "FAULTDX_CONFIG_DIR";

const SETTINGS_FILENAME: &str = "settings.json";

/// Application name for XDG directories.
const APP_NAME: &str = "faultdx";

/// Resolve the settings file path.
///
/// Resolution order:
/// 1. Explicit CLI path (returned even if missing, so loading reports it)
/// 2. FAULTDX_SETTINGS
/// 3. FAULTDX_CONFIG_DIR + settings.json
/// 4. XDG config directory (~/.config/faultdx/settings.json)
/// 5. Built-in defaults (None)
pub fn resolve_settings(cli_settings: Option<&Path>) -> ConfigPaths {
    if let Some(path) = cli_settings {
        return ConfigPaths {
            settings: Some(path.to_path_buf()),
            settings_source: ConfigSource::CliArgument,
        };
    }

    if let Ok(env_path) = std::env::var(ENV_SETTINGS_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return ConfigPaths {
                settings: Some(path),
                settings_source: ConfigSource::Environment,
            };
        }
    }

    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(dir).join(SETTINGS_FILENAME);
        if path.exists() {
            return ConfigPaths {
                settings: Some(path),
                settings_source: ConfigSource::Environment,
            };
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(SETTINGS_FILENAME);
        if path.exists() {
            return ConfigPaths {
                settings: Some(path),
                settings_source: ConfigSource::XdgConfig,
            };
        }
    }

    ConfigPaths::default()
}

/// Get the XDG config directory for faultdx.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}
