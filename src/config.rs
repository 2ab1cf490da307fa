//! Layered application configuration.
//!
//! Compiled-in defaults overlaid by an optional TOML file: tables merge
//! recursively, scalars from the override win, and override keys with no
//! default counterpart are ignored with a warning. The merged document must
//! deserialize into [`AppConfig`].

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use toml::Value;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub debug: bool,
    pub host: String,
    pub port: u16,
    /// Directory served under `/static/`, if any.
    pub static_dir: Option<PathBuf>,
    /// Directory templates are loaded from, if any.
    pub template_dir: Option<PathBuf>,
    pub db: DbConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debug: true,
            host: "127.0.0.1".to_string(),
            port: 9000,
            static_dir: None,
            template_dir: None,
            db: DbConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults overlaid by the TOML file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Defaults overlaid by a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let override_doc: Value = text.parse()?;
        let mut base = Value::try_from(AppConfig::default())
            .expect("default config serializes to TOML");
        merge(&mut base, &override_doc)?;
        Ok(base.try_into()?)
    }

    /// Socket address string for the HTTP server.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db: String,
    pub charset: String,
    pub autocommit: bool,
    pub minsize: usize,
    pub maxsize: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            user: String::new(),
            password: String::new(),
            db: String::new(),
            charset: "utf8".to_string(),
            autocommit: true,
            minsize: 1,
            maxsize: 10,
        }
    }
}

/// Recursively overlay `override_doc` onto `base`.
///
/// Keys absent from the defaults are skipped so typos do not silently
/// become configuration.
fn merge(base: &mut Value, override_doc: &Value) -> Result<(), ConfigError> {
    let Value::Table(base_table) = base else {
        return Err(ConfigError::NotATable);
    };
    let Value::Table(override_table) = override_doc else {
        return Err(ConfigError::NotATable);
    };
    for (key, value) in override_table {
        match base_table.get_mut(key) {
            Some(slot) => {
                if slot.is_table() && value.is_table() {
                    merge(slot, value)?;
                } else {
                    *slot = value.clone();
                }
            }
            None => {
                // Option fields serialize as absent; accept the documented ones.
                if key == "static_dir" || key == "template_dir" {
                    base_table.insert(key.clone(), value.clone());
                } else {
                    warn!(key = %key, "Unknown config key ignored");
                }
            }
        }
    }
    Ok(())
}
