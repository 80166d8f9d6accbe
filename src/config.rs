//! Layered runtime configuration.
//!
//! Settings are resolved from built-in defaults, then an optional TOML file,
//! then `TASKLISTS__*` environment variables (`__` separates nested keys, so
//! `TASKLISTS__STORE__BACKEND=postgres` selects the relational backend).

use crate::task_list::adapters::FlushPolicy;
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "TASKLISTS";

const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_POOL_SIZE: u32 = 8;

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Backing store selection.
    pub store: StoreSettings,
    /// Flush timeout in seconds.
    pub flush_timeout_secs: u64,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

/// Backing store selection, tagged by `backend`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreSettings {
    /// Relational store reached through a Diesel r2d2 pool.
    Postgres {
        /// Connection URL.
        database_url: String,
        /// Maximum pooled connections.
        #[serde(default = "default_pool_size")]
        pool_size: u32,
    },
    /// Embedded document store; in memory when `path` is unset.
    Document {
        /// Directory holding the committed documents.
        #[serde(default)]
        path: Option<Utf8PathBuf>,
    },
}

const fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

impl Settings {
    /// Loads settings from defaults, the optional TOML file at `path`, and
    /// the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or a value does
    /// not deserialize.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        let file = path.map(|file_path| {
            File::with_name(file_path.as_str())
                .format(FileFormat::Toml)
                .required(true)
        });
        Self::build(file, environment())
    }

    /// Loads settings from defaults and an inline TOML document, ignoring
    /// the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the document does not parse or a value
    /// does not deserialize.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Self::build(
            Some(File::from_str(contents, FileFormat::Toml)),
            environment().source(Some(config::Map::new())),
        )
    }

    fn build<S>(file: Option<S>, env: Environment) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let mut builder = Config::builder()
            .set_default("store.backend", "document")?
            .set_default(
                "flush_timeout_secs",
                FlushPolicy::DEFAULT_TIMEOUT.as_secs(),
            )?
            .set_default("log_filter", DEFAULT_LOG_FILTER)?;
        if let Some(source) = file {
            builder = builder.add_source(source);
        }
        builder.add_source(env).build()?.try_deserialize()
    }

    /// Returns the flush policy derived from `flush_timeout_secs`.
    #[must_use]
    pub const fn flush_policy(&self) -> FlushPolicy {
        FlushPolicy::new(Duration::from_secs(self.flush_timeout_secs))
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
