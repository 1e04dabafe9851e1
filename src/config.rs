//! Client configuration.
//!
//! Loads configuration from TOML files; every field has a default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Engine hostname.
    #[serde(default = "default_host")]
    pub host: String,

    /// Engine port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Rows per column sampled for CSV type inference.
    #[serde(default = "default_sample_rows")]
    pub csv_sample_rows: usize,

    /// Append a per-call token to temporary artifact names.
    #[serde(default = "default_unique_names")]
    pub unique_artifact_names: bool,

    /// Suffix of the unkeyed copies a join works on.
    #[serde(default = "default_artifact_suffix")]
    pub artifact_suffix: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_sample_rows() -> usize {
    5
}

fn default_unique_names() -> bool {
    true
}

fn default_artifact_suffix() -> String {
    "_unkeyed".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            csv_sample_rows: default_sample_rows(),
            unique_artifact_names: default_unique_names(),
            artifact_suffix: default_artifact_suffix(),
        }
    }
}

impl ClientConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn csv_sample_rows(mut self, rows: usize) -> Self {
        self.csv_sample_rows = rows;
        self
    }

    pub fn unique_artifact_names(mut self, unique: bool) -> Self {
        self.unique_artifact_names = unique;
        self
    }

    pub fn artifact_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.artifact_suffix = suffix.into();
        self
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::Config("host must not be empty".into()));
        }
        if self.csv_sample_rows == 0 {
            return Err(Error::Config("csv_sample_rows must be at least 1".into()));
        }
        crate::query::validate_identifier(&format!("t{}", self.artifact_suffix), "artifact suffix")
            .map_err(|_| Error::Config(format!("invalid artifact suffix `{}`", self.artifact_suffix)))
    }
}
