use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::inference::{Decision, Inference, Source, StatusOrder};

/// Summary record produced at the end of an `infer` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub rows: usize,
    pub jobs: usize,
    pub empty_rows: usize,
    pub capped_rows: usize,
    /// Rows per assigned status, in status order.
    pub statuses: Vec<StatusCount>,
    /// Rows per deciding source.
    pub sources: BTreeMap<Source, usize>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub rows: usize,
}

impl RunReport {
    /// Builds the report from a finished inference pass.
    pub fn from_inference(
        inference: &Inference<'_>,
        order: &StatusOrder,
        started_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        let duration = now - started_at;

        let mut per_rank = vec![0usize; order.len()];
        let mut sources = BTreeMap::new();
        let mut empty_rows = 0;
        let mut capped_rows = 0;
        for step in inference.jobs.iter().flat_map(|job| &job.steps) {
            match step.decision {
                Decision::Empty => empty_rows += 1,
                Decision::Committed {
                    rank,
                    source,
                    capped,
                } => {
                    if let Some(count) = per_rank.get_mut(rank) {
                        *count += 1;
                    }
                    *sources.entry(source).or_insert(0) += 1;
                    if capped {
                        capped_rows += 1;
                    }
                }
            }
        }

        let statuses = order
            .iter()
            .zip(per_rank)
            .filter(|&(_, rows)| rows > 0)
            .map(|((_, status), rows)| StatusCount {
                status: status.to_string(),
                rows,
            })
            .collect();

        Self {
            input: None,
            output: None,
            rows: inference.assignments.len(),
            jobs: inference.jobs.len(),
            empty_rows,
            capped_rows,
            statuses,
            sources,
            started_at,
            completed_at: now,
            duration_ms: duration.num_milliseconds(),
        }
    }

    pub fn with_paths(mut self, input: Option<PathBuf>, output: Option<PathBuf>) -> Self {
        self.input = input;
        self.output = output;
        self
    }
}
