//! Bootstrap configuration loading and root folder resolution
//!
//! The TOML file only carries bootstrap concerns (paths, listen address,
//! secrets, limits). Every field is optional; callers layer command-line
//! arguments and environment variables on top and fall back to built-in
//! defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "COLORHUNT_CONFIG";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "COLORHUNT_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "colorhunt.db";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the database (and anything else the service persists)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Explicit database file path; defaults to `<root_folder>/colorhunt.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Listen address
    #[serde(default)]
    pub bind_address: Option<String>,

    /// Listen port
    #[serde(default)]
    pub port: Option<u16>,

    /// Secret used to verify bearer tokens
    #[serde(default)]
    pub token_secret: Option<String>,

    /// Upper bound on a single image fetch
    #[serde(default)]
    pub image_fetch_timeout_ms: Option<u64>,

    /// Largest image body accepted from the image source
    #[serde(default)]
    pub max_image_bytes: Option<usize>,

    /// Total retry budget for a conflicting store transaction
    #[serde(default)]
    pub transaction_max_wait_ms: Option<u64>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Parse TOML config from a string
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load TOML config from a file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    parse_toml_config(&content)
}

/// Locate and load the bootstrap config
///
/// Priority:
/// 1. Explicit path (command line)
/// 2. `COLORHUNT_CONFIG` environment variable
/// 3. Platform config file (`~/.config/colorhunt/config.toml`, then `/etc/colorhunt/config.toml`)
///
/// An explicit path that cannot be read is an error. A missing platform
/// file is not: defaults apply.
pub fn load_bootstrap_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return load_toml_config(path);
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return load_toml_config(Path::new(&path));
    }

    match default_config_file() {
        Some(path) => load_toml_config(&path),
        None => Ok(TomlConfig::default()),
    }
}

/// First existing platform config file, if any
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("colorhunt").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/colorhunt/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Root folder resolution priority:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Database path: explicit TOML value, else inside the root folder
pub fn resolve_database_path(root_folder: &Path, toml_config: &TomlConfig) -> PathBuf {
    toml_config
        .database_path
        .clone()
        .unwrap_or_else(|| root_folder.join(DATABASE_FILE_NAME))
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/colorhunt (or /var/lib/colorhunt for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("colorhunt"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/colorhunt"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("colorhunt"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/colorhunt"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("colorhunt"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\colorhunt"))
    } else {
        PathBuf::from("./colorhunt_data")
    }
}

/// Write config back to disk (used by tooling and tests)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;
    Ok(())
}
