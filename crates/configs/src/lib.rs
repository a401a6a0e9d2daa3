//! # configs
//!
//! Layered application configuration:
//!
//! 1. built-in defaults
//! 2. optional TOML file
//! 3. environment variables, `VISTAGRAM_` prefix, `__` between nesting levels
//!    (e.g. `VISTAGRAM_STORAGE=postgres`, `VISTAGRAM_DATABASE__URL=postgres://…`,
//!    `VISTAGRAM_MEDIA__S3__BUCKET=photos`)
//!
//! A `.env` file can be read into the environment first with [`load_env_file`].

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "VISTAGRAM";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which `PostRepository` to build at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

/// Which `BlobStore` to build at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaBackend {
    Local,
    S3,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<SecretString>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalMediaConfig {
    pub root: PathBuf,
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3MediaConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    #[serde(default = "default_s3_prefix")]
    pub prefix: String,
    pub public_base_url: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<SecretString>,
}

fn default_s3_prefix() -> String {
    "vistagram-posts".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub backend: MediaBackend,
    pub max_upload_bytes: usize,
    pub max_dimension: u32,
    pub local: LocalMediaConfig,
    pub s3: Option<S3MediaConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub default_page_size: u32,
    /// Base of generated share links.
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. "info,storage_adapters=debug". `RUST_LOG` wins when set.
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
    pub feed: FeedConfig,
    pub log: LogConfig,
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("storage", "memory")?
        .set_default("database.max_connections", 10)?
        .set_default("media.backend", "local")?
        .set_default("media.max_upload_bytes", 10 * 1024 * 1024)?
        .set_default("media.max_dimension", 1080)?
        .set_default("media.local.root", "./data/uploads")?
        .set_default("media.local.public_base_url", "http://localhost:5000/uploads")?
        .set_default("feed.default_page_size", 20)?
        .set_default("feed.public_base_url", "http://localhost:5000")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)
}

impl AppConfig {
    /// Loads defaults, then `path` (must exist when given), then the environment.
    ///
    /// Call [`load_env_file`] first if a `.env` file should feed the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with a TOML document. No environment, no `.env`.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage == StorageBackend::Postgres {
            let has_url = self
                .database
                .url
                .as_ref()
                .is_some_and(|url| !url.expose_secret().trim().is_empty());
            if !has_url {
                return Err(ConfigError::Invalid(
                    "database.url is required when storage = \"postgres\"".into(),
                ));
            }
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be greater than 0".into()));
        }
        if self.media.max_upload_bytes == 0 || self.media.max_dimension == 0 {
            return Err(ConfigError::Invalid(
                "media.max_upload_bytes and media.max_dimension must be greater than 0".into(),
            ));
        }
        match (self.media.backend, &self.media.s3) {
            (MediaBackend::S3, None) => {
                return Err(ConfigError::Invalid("media.s3 section is required when media.backend = \"s3\"".into()));
            }
            (MediaBackend::S3, Some(s3)) => require_absolute("media.s3.public_base_url", &s3.public_base_url)?,
            (MediaBackend::Local, _) => {
                require_absolute("media.local.public_base_url", &self.media.local.public_base_url)?
            }
        }
        if self.feed.default_page_size == 0 {
            return Err(ConfigError::Invalid("feed.default_page_size must be greater than 0".into()));
        }
        require_absolute("feed.public_base_url", &self.feed.public_base_url)
    }
}

/// Reads `path`, or the nearest `.env` when `None`, into the process
/// environment. Returns the file that was read.
///
/// Runs before logging is set up, so it logs nothing itself.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .map_err(|e| ConfigError::Invalid(format!("cannot read {}: {e}", path.display())))?;
            Ok(Some(path.to_path_buf()))
        }
        None => Ok(dotenvy::dotenv().ok()),
    }
}

fn require_absolute(key: &str, value: &str) -> Result<(), ConfigError> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ConfigError::Invalid(format!(
            "{key} must be an absolute http(s) URL, got {value:?}"
        ))),
    }
}
