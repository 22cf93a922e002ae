//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! The `[lancedb]` section describes where the database lives and how reads
//! observe concurrent writes. Paths support `~` and `${VAR}` expansion.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_DB_URI: &str = "./.ctxdb/lancedb";

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment })
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    /// The `[lancedb]` section, or defaults when the section is absent.
    pub fn lancedb(&self) -> Result<LanceDbConfig> {
        if !self.figment.contains("lancedb") {
            return Ok(LanceDbConfig::default());
        }
        self.get("lancedb")
    }
}

/// How reads observe writes made through other handles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consistency {
    /// Every read checks for newer table versions.
    Strong,
    /// Reads refresh on `read_consistency_secs`, or never when unset.
    #[default]
    Eventual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanceDbConfig {
    pub uri: String,
    pub consistency: Consistency,
    pub read_consistency_secs: Option<u64>,
}

impl Default for LanceDbConfig {
    fn default() -> Self {
        Self { uri: DEFAULT_DB_URI.to_string(), consistency: Consistency::default(), read_consistency_secs: None }
    }
}

impl LanceDbConfig {
    pub fn with_uri(uri: impl Into<String>) -> Self {
        Self { uri: uri.into(), ..Self::default() }
    }

    /// `None` leaves the engine default (no background refresh).
    pub fn read_consistency_interval(&self) -> Option<Duration> {
        match self.consistency {
            Consistency::Strong => Some(Duration::ZERO),
            Consistency::Eventual => self.read_consistency_secs.map(Duration::from_secs),
        }
    }

    /// Storage directory after `~`/env expansion, relative to the current directory.
    pub fn resolved_path(&self) -> PathBuf {
        let base = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        resolve_with_base(&base, &self.uri)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
