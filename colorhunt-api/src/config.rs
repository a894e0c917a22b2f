//! Service configuration
//!
//! Every field resolves command line / environment first, then the TOML
//! bootstrap file, then the compiled default.

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use colorhunt_common::config::{resolve_database_path, resolve_root_folder, TomlConfig};
use colorhunt_common::{Error, Result};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5740;
pub const DEFAULT_IMAGE_FETCH_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_TRANSACTION_MAX_WAIT_MS: u64 = 5_000;

/// Command-line arguments for colorhunt-api
#[derive(Parser, Debug, Default)]
#[command(name = "colorhunt-api")]
#[command(about = "Color Hunt photo verification and social service")]
#[command(version)]
pub struct Args {
    /// Bootstrap TOML config file
    #[arg(short, long, env = "COLORHUNT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root folder holding the database
    #[arg(short, long, env = "COLORHUNT_ROOT_FOLDER")]
    pub root_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "COLORHUNT_PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "COLORHUNT_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Secret used to verify bearer tokens
    #[arg(long, env = "COLORHUNT_TOKEN_SECRET", hide_env_values = true)]
    pub token_secret: Option<String>,

    /// Log filter directive (overrides logging.level)
    #[arg(long, env = "COLORHUNT_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub listen_addr: SocketAddr,
    pub token_secret: String,
    pub image_fetch_timeout: Duration,
    pub max_image_bytes: usize,
    pub transaction_max_wait_ms: u64,
    pub log_level: String,
}

impl ServiceConfig {
    pub fn resolve(args: &Args, toml: &TomlConfig) -> Result<Self> {
        let root_folder = resolve_root_folder(args.root_folder.as_deref(), toml);
        let database_path = resolve_database_path(&root_folder, toml);

        let bind_address = args
            .bind_address
            .clone()
            .or_else(|| toml.bind_address.clone())
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let ip: IpAddr = bind_address
            .parse()
            .map_err(|e| Error::Config(format!("Invalid bind_address '{}': {}", bind_address, e)))?;
        let port = args.port.or(toml.port).unwrap_or(DEFAULT_PORT);

        let token_secret = args
            .token_secret
            .clone()
            .or_else(|| toml.token_secret.clone())
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "token_secret is not configured (set COLORHUNT_TOKEN_SECRET, --token-secret, or token_secret in the TOML config)"
                        .to_string(),
                )
            })?;

        let max_image_bytes = toml.max_image_bytes.unwrap_or(DEFAULT_MAX_IMAGE_BYTES);
        if max_image_bytes == 0 {
            return Err(Error::Config("max_image_bytes must be positive".to_string()));
        }

        Ok(Self {
            root_folder,
            database_path,
            listen_addr: SocketAddr::new(ip, port),
            token_secret,
            image_fetch_timeout: Duration::from_millis(
                toml.image_fetch_timeout_ms
                    .unwrap_or(DEFAULT_IMAGE_FETCH_TIMEOUT_MS),
            ),
            max_image_bytes,
            transaction_max_wait_ms: toml
                .transaction_max_wait_ms
                .unwrap_or(DEFAULT_TRANSACTION_MAX_WAIT_MS),
            log_level: args
                .log_level
                .clone()
                .unwrap_or_else(|| toml.logging.level.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_with_secret() -> Args {
        Args {
            root_folder: Some(PathBuf::from("/tmp/colorhunt-test")),
            token_secret: Some("s3cret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_apply() {
        let config = ServiceConfig::resolve(&args_with_secret(), &TomlConfig::default()).unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:5740".parse().unwrap());
        assert_eq!(config.image_fetch_timeout, Duration::from_millis(10_000));
        assert_eq!(config.max_image_bytes, 20 * 1024 * 1024);
        assert_eq!(config.transaction_max_wait_ms, 5_000);
        assert_eq!(config.log_level, "info");
        assert_eq!(
            config.database_path,
            PathBuf::from("/tmp/colorhunt-test/colorhunt.db")
        );
    }

    #[test]
    fn test_cli_beats_toml() {
        let toml = TomlConfig {
            port: Some(9000),
            bind_address: Some("0.0.0.0".to_string()),
            token_secret: Some("from-toml".to_string()),
            ..Default::default()
        };
        let mut args = args_with_secret();
        args.port = Some(9100);

        let config = ServiceConfig::resolve(&args, &toml).unwrap();
        assert_eq!(config.listen_addr.port(), 9100);
        assert_eq!(config.listen_addr.ip().to_string(), "0.0.0.0");
        assert_eq!(config.token_secret, "s3cret");
    }

    #[test]
    fn test_missing_secret_is_config_error() {
        let args = Args {
            root_folder: Some(PathBuf::from("/tmp/colorhunt-test")),
            ..Default::default()
        };
        assert!(matches!(
            ServiceConfig::resolve(&args, &TomlConfig::default()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_bad_bind_address_rejected() {
        let mut args = args_with_secret();
        args.bind_address = Some("not-an-ip".to_string());
        assert!(ServiceConfig::resolve(&args, &TomlConfig::default()).is_err());
    }
}
