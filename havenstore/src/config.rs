//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The configuration file path defaults to `config.yaml` but can be
//! specified via `-f` flag or `HAVENSTORE_CONFIG` environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources
//! override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `HAVENSTORE_`
//!    override YAML values; use double underscores for nested fields, e.g.
//!    `HAVENSTORE_STORAGE__BASE_URL=/media`
//! 3. **Well-known storage variables** - Special case: `LOCAL_STORAGE_DIR`,
//!    `PUBLIC_STORAGE_DIR`, and `STORAGE_BASE_URL` override the corresponding
//!    `storage.*` fields if set. Cloud deployment templates configure the
//!    storage shim through these names.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::{Error, Result};

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "HAVENSTORE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults defined in the `Default` implementation, so the
/// service starts with no config file at all.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Origins allowed by the CORS layer. Empty means same-origin only.
    pub cors_allowed_origins: Vec<String>,
    /// Object storage configuration
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_allowed_origins: Vec::new(),
            storage: StorageConfig::default(),
        }
    }
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Root directory for all stored content. Relative paths resolve against
    /// the process working directory.
    pub root_dir: PathBuf,
    /// Root directory for publicly addressable content.
    /// Defaults to `<root_dir>/public` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_dir: Option<PathBuf>,
    /// URL prefix used when constructing object URLs
    pub base_url: String,
    /// `Cache-Control: max-age` applied to served objects, in seconds
    pub cache_ttl_secs: u64,
    /// Maximum accepted direct-upload payload, in bytes
    pub max_upload_size: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("storage"),
            public_dir: None,
            base_url: "/storage".to_string(),
            cache_ttl_secs: 3600,
            max_upload_size: 25 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(args: &Args) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(&args.config))
            // HAVENSTORE_CONFIG belongs to Args, not to the Config shape.
            .merge(Env::prefixed("HAVENSTORE_").ignore(&["config"]).split("__"));

        let mut config: Config = figment.extract().map_err(|e| Error::BadRequest {
            message: format!("Invalid configuration: {e}"),
        })?;

        // Well-known storage variables take precedence over everything else.
        if let Ok(dir) = std::env::var("LOCAL_STORAGE_DIR") {
            config.storage.root_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("PUBLIC_STORAGE_DIR") {
            config.storage.public_dir = Some(PathBuf::from(dir));
        }
        if let Ok(url) = std::env::var("STORAGE_BASE_URL") {
            config.storage.base_url = url;
        }

        config.normalize_and_validate()?;
        Ok(config)
    }

    /// Canonicalize derived fields and reject configurations the router
    /// cannot mount.
    fn normalize_and_validate(&mut self) -> Result<()> {
        while self.storage.base_url.len() > 1 && self.storage.base_url.ends_with('/') {
            self.storage.base_url.pop();
        }
        if !self.storage.base_url.starts_with('/') || self.storage.base_url.len() < 2 {
            return Err(Error::BadRequest {
                message: format!(
                    "storage.base_url must be a non-root absolute path, got {:?}",
                    self.storage.base_url
                ),
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
