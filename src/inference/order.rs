use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::ConfigError;

/// Status used as the starting point of every job when the order contains it.
pub const DEFAULT_FALLBACK: &str = "Estimating";

/// Canonical lifecycle stages, earliest first.
///
/// Holds both directions of the index so that `rank(status_at(i)) == Some(i)`
/// for every valid rank.
#[derive(Debug, Clone)]
pub struct StatusOrder {
    names: Vec<String>,
    ranks: HashMap<String, usize>,
    fallback: usize,
}

impl StatusOrder {
    /// Builds the order using [`DEFAULT_FALLBACK`] as the preferred fallback.
    #[cfg(test)]
    pub fn new<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_fallback(names, DEFAULT_FALLBACK)
    }

    /// Builds the order. Blank names are skipped and duplicates keep their
    /// first position. If `preferred` is not part of the order, the first
    /// stage becomes the fallback.
    pub fn with_fallback<I, S>(names: I, preferred: &str) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordered = Vec::new();
        let mut ranks = HashMap::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || ranks.contains_key(name) {
                continue;
            }
            ranks.insert(name.to_string(), ordered.len());
            ordered.push(name.to_string());
        }

        if ordered.is_empty() {
            return Err(ConfigError::EmptyStatusOrder);
        }

        let fallback = ranks.get(preferred).copied().unwrap_or(0);
        Ok(Self {
            names: ordered,
            ranks,
            fallback,
        })
    }

    pub fn rank(&self, status: &str) -> Option<usize> {
        self.ranks.get(status).copied()
    }

    pub fn status_at(&self, rank: usize) -> Option<&str> {
        self.names.get(rank).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Rank of the last (terminal) stage.
    pub fn last_rank(&self) -> usize {
        self.names.len() - 1
    }

    pub fn fallback_rank(&self) -> usize {
        self.fallback
    }

    pub fn fallback(&self) -> &str {
        &self.names[self.fallback]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().map(String::as_str).enumerate()
    }

    /// Membership set of every stage, guaranteed to contain the fallback.
    pub fn status_set(&self) -> HashSet<&str> {
        let mut set: HashSet<&str> = self.names.iter().map(String::as_str).collect();
        set.insert(self.fallback());
        set
    }
}

impl fmt::Display for StatusOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names.join(" → "))
    }
}
