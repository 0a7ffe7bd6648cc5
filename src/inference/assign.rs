use std::collections::BTreeMap;

use super::grouping::group_by_job;
use super::order::StatusOrder;
use super::row::{FieldMap, Row};
use super::signals::SignalTables;
use super::tracker::{ProgressionTracker, Step};

/// Row position → inferred status (`""` for blank rows).
pub type AssignmentMap = BTreeMap<usize, String>;

/// Steps of one job, in canonical order.
#[derive(Debug, Clone)]
pub struct JobTrace<'a> {
    pub job: &'a str,
    pub steps: Vec<Step>,
}

/// Result of one inference pass.
#[derive(Debug, Clone, Default)]
pub struct Inference<'a> {
    pub assignments: AssignmentMap,
    pub jobs: Vec<JobTrace<'a>>,
}

/// Groups, orders and tracks every row. Each input row gets exactly one
/// assignment.
pub fn infer<'a>(
    rows: &'a [Row],
    order: &StatusOrder,
    signals: &SignalTables,
    fields: &FieldMap,
) -> Inference<'a> {
    infer_with(rows, order, signals, fields, |_| {})
}

/// Same as [`infer`], calling `on_job` after each job is tracked.
pub fn infer_with<'a, F>(
    rows: &'a [Row],
    order: &StatusOrder,
    signals: &SignalTables,
    fields: &FieldMap,
    mut on_job: F,
) -> Inference<'a>
where
    F: FnMut(&JobTrace<'a>),
{
    let tracker = ProgressionTracker::new(order, signals, fields);
    let mut inference = Inference::default();

    for group in group_by_job(rows, fields) {
        let steps = tracker.track(&group.rows);
        for step in &steps {
            inference
                .assignments
                .insert(step.position, step.status.clone());
        }

        let trace = JobTrace {
            job: group.job,
            steps,
        };
        tracing::debug!(
            job = trace.job,
            rows = trace.steps.len(),
            last = trace.steps.last().map(|s| s.status.as_str()).unwrap_or(""),
            "job tracked"
        );
        on_job(&trace);
        inference.jobs.push(trace);
    }

    inference
}
