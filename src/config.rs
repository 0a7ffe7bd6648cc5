//! Configuration loaded from `istatus.toml`.
//!
//! [`IstatusConfig`] holds every tunable of a run. Missing keys use sensible
//! defaults, and the `ISTATUS_ORDER` environment variable takes precedence
//! over `order_path` from the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::inference::{DEFAULT_FALLBACK, FieldMap, SignalOverrides};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "istatus.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IstatusConfig {
    /// Stage every job starts at, when present in the status order.
    #[serde(default = "default_fallback_status")]
    pub fallback_status: String,

    /// Name of the column appended to the output.
    #[serde(default = "default_output_column")]
    pub output_column: String,

    /// Column of the status order file holding the stage names.
    #[serde(default = "default_order_column")]
    pub order_column: String,

    /// Status order file.
    #[serde(default)]
    pub order_path: Option<PathBuf>,

    /// Inline status order, used when no order file is given.
    #[serde(default)]
    pub statuses: Vec<String>,

    /// Input column names.
    #[serde(default)]
    pub fields: FieldMap,

    /// Replacement keyword and role tables.
    #[serde(default)]
    pub signals: SignalOverrides,
}

// Default fallback stage: "Estimating".
fn default_fallback_status() -> String {
    DEFAULT_FALLBACK.to_string()
}

// Default appended column: "iStatus".
fn default_output_column() -> String {
    "iStatus".to_string()
}

// Default order file column: "status".
fn default_order_column() -> String {
    "status".to_string()
}

impl Default for IstatusConfig {
    fn default() -> Self {
        Self {
            fallback_status: default_fallback_status(),
            output_column: default_output_column(),
            order_column: default_order_column(),
            order_path: None,
            statuses: Vec::new(),
            fields: FieldMap::default(),
            signals: SignalOverrides::default(),
        }
    }
}

impl IstatusConfig {
    /// Loads `path`, or [`DEFAULT_CONFIG_FILE`] when `None`.
    /// Falls back to defaults if the default file does not exist; an
    /// explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };

        // The environment takes precedence over the config file for the order path.
        if let Ok(order) = std::env::var("ISTATUS_ORDER")
            && !order.is_empty()
        {
            config.order_path = Some(PathBuf::from(order));
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = toml::from_str::<IstatusConfig>(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }
}
