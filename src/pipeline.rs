use std::io::{self, BufWriter};
use std::path::Path;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::IstatusConfig;
use crate::error::{ConfigError, Result};
use crate::inference::{JobTrace, SignalTables, StatusOrder, infer, infer_with};
use crate::report::RunReport;
use crate::table::{self, Table};
use crate::ui::RunProgress;

/// Everything resolved before the first row is read: the status order and
/// the compiled signal tables. Building it is where configuration errors
/// surface.
pub struct Session {
    pub config: IstatusConfig,
    pub order: StatusOrder,
    pub signals: SignalTables,
}

impl Session {
    /// Resolves the status order (CLI path, then `ISTATUS_ORDER` or
    /// `order_path`, then inline `statuses`) and compiles the signal tables.
    pub fn prepare(config: IstatusConfig, order_path: Option<&Path>) -> Result<Self> {
        let names = match order_path.or(config.order_path.as_deref()) {
            Some(path) => {
                info!(path = %path.display(), "loading status order");
                table::read_status_order_path(path, &config.order_column)?
            }
            None if !config.statuses.is_empty() => config.statuses.clone(),
            None => return Err(ConfigError::MissingOrderSource.into()),
        };

        let order = StatusOrder::with_fallback(names, &config.fallback_status)?;
        if order.fallback() != config.fallback_status {
            warn!(
                wanted = %config.fallback_status,
                using = order.fallback(),
                "fallback status not in order; starting jobs at the first stage"
            );
        }

        let signals = SignalTables::with_overrides(&config.signals)?;
        for status in signals.unknown_statuses(&order.status_set()) {
            warn!(status, "signal tables name a status missing from the order; ignored");
        }

        info!(stages = order.len(), order = %order, "status order ready");
        Ok(Self {
            config,
            order,
            signals,
        })
    }

    /// Reads `input`, infers every row and writes the result to `output`
    /// (stdout when `None`).
    pub fn infer_file(
        &self,
        input: &Path,
        output: Option<&Path>,
        column: Option<&str>,
    ) -> Result<RunReport> {
        let started_at = Utc::now();
        let table = table::read_table_path(input)?;
        info!(rows = table.len(), input = %input.display(), "input read");

        let progress = RunProgress::start(table.len());
        let inference = infer_with(
            &table.rows,
            &self.order,
            &self.signals,
            &self.config.fields,
            |trace| progress.job_done(trace),
        );
        progress.finish();

        let column = column.unwrap_or(&self.config.output_column);
        match output {
            Some(path) => table::write_table_path(path, &table, column, &inference.assignments)?,
            None => {
                let stdout = io::stdout();
                table::write_table(
                    BufWriter::new(stdout.lock()),
                    &table,
                    column,
                    &inference.assignments,
                )?
            }
        }

        let report = RunReport::from_inference(&inference, &self.order, started_at).with_paths(
            Some(input.to_path_buf()),
            output.map(Path::to_path_buf),
        );
        info!(
            rows = report.rows,
            jobs = report.jobs,
            duration_ms = report.duration_ms,
            "inference complete"
        );
        Ok(report)
    }

    /// Infers `table` and returns the trace of `job` alone.
    pub fn explain<'t>(&self, table: &'t Table, job: &str) -> Option<JobTrace<'t>> {
        let inference = infer(&table.rows, &self.order, &self.signals, &self.config.fields);
        inference.jobs.into_iter().find(|trace| trace.job == job.trim())
    }
}
