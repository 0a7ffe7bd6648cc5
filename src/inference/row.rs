use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Names of the input columns the engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMap {
    pub job: String,
    pub status: String,
    pub date: String,
    pub sequence: String,
    pub role: String,
    pub description: String,
    pub notes: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            job: "job_number".to_string(),
            status: "status".to_string(),
            date: "date".to_string(),
            sequence: "dwr_number".to_string(),
            role: "role".to_string(),
            description: "description".to_string(),
            notes: "notes".to_string(),
        }
    }
}

/// One input record. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    position: usize,
    fields: HashMap<String, String>,
}

impl Row {
    /// Builds a row from header/value pairs. A repeated header keeps its
    /// last value.
    pub fn from_pairs<I, K, V>(position: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { position, fields }
    }

    /// Position of the row in the input file, zero-based.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Value of `field`, or `""` when absent.
    pub fn get(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    /// True when every field is blank. Such rows carry no information and
    /// never receive a status.
    pub fn is_empty(&self) -> bool {
        self.fields.values().all(|v| v.trim().is_empty())
    }

    /// Lower-cased text the keyword table is matched against: explicit
    /// status, role, description and notes, in that order.
    pub fn signal_text(&self, fields: &FieldMap) -> String {
        [
            &fields.status,
            &fields.role,
            &fields.description,
            &fields.notes,
        ]
        .into_iter()
        .map(|name| self.get(name).trim())
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    }
}
