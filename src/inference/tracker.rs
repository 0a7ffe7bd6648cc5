use std::fmt;

use serde::{Deserialize, Serialize};

use super::order::StatusOrder;
use super::row::{FieldMap, Row};
use super::signals::{SignalTables, StatusScores};

/// What moved the cursor on a committed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    /// Nothing applied; the previous status carried forward.
    Carried,
    /// The row's own status column named a later stage.
    Explicit,
    /// Keyword and role scores picked a later stage.
    Signal,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Source::Carried => "carried",
            Source::Explicit => "explicit",
            Source::Signal => "signal",
        };
        f.pad(name)
    }
}

/// The outcome of feeding one row to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Blank row: assigned `""`, cursor untouched.
    Empty,
    /// A status was committed at `rank`. `capped` is set when a role cap
    /// held back a later stage the row would otherwise have reached.
    Committed {
        rank: usize,
        source: Source,
        capped: bool,
    },
}

/// Cursor carried across the rows of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub rank: usize,
    pub status: String,
}

/// Everything known about one processed row.
#[derive(Debug, Clone)]
pub struct Step {
    pub position: usize,
    pub status: String,
    pub decision: Decision,
    pub cap: Option<usize>,
    pub scores: Option<StatusScores>,
}

/// Drives the rows of one job through the status order.
///
/// The cursor never moves backwards: explicit statuses and scored signals
/// can only advance it, and role caps can only stop it from advancing.
pub struct ProgressionTracker<'a> {
    order: &'a StatusOrder,
    signals: &'a SignalTables,
    fields: &'a FieldMap,
}

impl<'a> ProgressionTracker<'a> {
    pub fn new(order: &'a StatusOrder, signals: &'a SignalTables, fields: &'a FieldMap) -> Self {
        Self {
            order,
            signals,
            fields,
        }
    }

    /// Cursor at the fallback stage.
    pub fn start(&self) -> Progress {
        Progress {
            rank: self.order.fallback_rank(),
            status: self.order.fallback().to_string(),
        }
    }

    /// Applies one row to `progress` and returns the new cursor with the
    /// row's step.
    ///
    /// 1. Blank rows are assigned `""` and leave the cursor alone.
    /// 2. The row's role cap is computed with the cursor as floor.
    /// 3. A recognized explicit status advances the cursor, up to the cap.
    /// 4. The best signal in `[cursor, cap]` advances it further.
    pub fn step(&self, progress: Progress, row: &Row) -> (Progress, Step) {
        if row.is_empty() {
            let step = Step {
                position: row.position(),
                status: String::new(),
                decision: Decision::Empty,
                cap: None,
                scores: None,
            };
            return (progress, step);
        }

        let mut rank = progress.rank;
        let mut source = Source::Carried;
        let mut capped = false;
        let cap = self.signals.cap_rank(row, self.order, self.fields, rank);

        if let Some(explicit) = self.order.rank(row.get(&self.fields.status).trim()) {
            let target = rank.max(explicit);
            capped |= target > cap;
            let next = target.min(cap);
            if next > rank {
                source = Source::Explicit;
            }
            rank = next;
        }

        let scores = self.signals.score(row, self.order, self.fields);
        if let Some(signal) = scores.pick(rank, cap) {
            let next = rank.max(signal).min(cap);
            if next > rank {
                source = Source::Signal;
            }
            rank = next;
        }
        if cap < self.order.last_rank() {
            capped |= scores
                .pick(rank, self.order.last_rank())
                .is_some_and(|best| best > cap);
        }

        let status = self
            .order
            .status_at(rank)
            .map(str::to_string)
            .unwrap_or_else(|| progress.status.clone());

        tracing::trace!(
            position = row.position(),
            %status,
            %source,
            cap,
            capped,
            "row committed"
        );

        let step = Step {
            position: row.position(),
            status: status.clone(),
            decision: Decision::Committed {
                rank,
                source,
                capped,
            },
            cap: Some(cap),
            scores: Some(scores),
        };
        (Progress { rank, status }, step)
    }

    /// Folds the rows of one job, already in canonical order.
    pub fn track(&self, rows: &[&Row]) -> Vec<Step> {
        let (_, steps) = rows.iter().fold(
            (self.start(), Vec::with_capacity(rows.len())),
            |(progress, mut steps), row| {
                let (next, step) = self.step(progress, row);
                steps.push(step);
                (next, steps)
            },
        );
        steps
    }
}
