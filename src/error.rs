use thiserror::Error;

#[derive(Debug, Error)]
pub enum IstatusError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// Problems detected before any row is processed. All of them are fatal.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("canonical status order is empty")]
    EmptyStatusOrder,

    #[error("status order file has no `{column}` column")]
    MissingOrderColumn { column: String },

    #[error("no status order given: pass --order, set ISTATUS_ORDER, or list `statuses` in the config")]
    MissingOrderSource,

    #[error("role affinity `{pattern}` has weight {weight}, must exceed a keyword match (1.0)")]
    WeakRoleWeight { pattern: String, weight: f64 },
}

pub type Result<T> = std::result::Result<T, IstatusError>;
