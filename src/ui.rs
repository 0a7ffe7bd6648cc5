//! Terminal output: progress bar and colored summaries.
//!
//! Uses `indicatif` for the per-job progress bar and `console` for styling.
//! Everything goes to stderr so the CSV on stdout stays clean.

use console::{Style, Term};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::inference::{Decision, JobTrace, Row, StatusOrder};
use crate::report::RunReport;

/// Progress over the jobs of one run. Hidden when stderr is not a terminal.
pub struct RunProgress {
    // indicatif bar, one tick per job.
    pb: ProgressBar,
}

impl RunProgress {
    pub fn start(rows: usize) -> Self {
        let pb = ProgressBar::new(rows as u64);
        if !Term::stderr().is_term() {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30}] {pos}/{len} rows {msg}")
        {
            pb.set_style(style);
        }
        Self { pb }
    }

    /// Advances by the rows of a finished job.
    pub fn job_done(&self, trace: &JobTrace<'_>) {
        self.pb.set_message(trace.job.to_string());
        self.pb.inc(trace.steps.len() as u64);
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

/// Colors used by the summaries.
pub struct Palette {
    green: Style,
    yellow: Style,
    dim: Style,
    bold: Style,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            green: Style::new().green().bold(),
            yellow: Style::new().yellow(),
            dim: Style::new().dim(),
            bold: Style::new().bold(),
        }
    }
}

impl Palette {
    /// Prints the run summary, or the JSON record when `json` is set.
    pub fn print_report(&self, report: &RunReport, json: bool) {
        if json {
            eprintln!(
                "{}",
                serde_json::to_string_pretty(report).unwrap_or_default()
            );
            return;
        }

        eprintln!(
            "  {} {} rows across {} jobs in {}ms",
            self.green.apply_to("✓"),
            report.rows,
            report.jobs,
            report.duration_ms
        );
        for count in &report.statuses {
            eprintln!("    {:>6}  {}", count.rows, count.status);
        }
        if report.empty_rows > 0 {
            eprintln!(
                "    {:>6}  {}",
                report.empty_rows,
                self.dim.apply_to("(blank rows)")
            );
        }
        if report.capped_rows > 0 {
            eprintln!(
                "  {} {} rows held back by role caps",
                self.yellow.apply_to("↧"),
                report.capped_rows
            );
        }
    }

    /// Prints the canonical order with ranks, marking the fallback.
    pub fn print_order(&self, order: &StatusOrder) {
        for (rank, status) in order.iter() {
            if rank == order.fallback_rank() {
                println!(
                    "{rank:>3}  {}  {}",
                    self.bold.apply_to(status),
                    self.dim.apply_to("(start)")
                );
            } else {
                println!("{rank:>3}  {status}");
            }
        }
    }

    /// Prints every step of one job with its scores and cap.
    pub fn print_trace(
        &self,
        trace: &JobTrace<'_>,
        rows: &[Row],
        order: &StatusOrder,
        date_field: &str,
    ) {
        println!("{}", self.bold.apply_to(format!("job {:?}", trace.job)));
        for step in &trace.steps {
            let date = rows
                .iter()
                .find(|r| r.position() == step.position)
                .map(|r| r.get(date_field))
                .unwrap_or("");
            match step.decision {
                Decision::Empty => {
                    println!(
                        "  #{:<5} {:<12} {}",
                        step.position,
                        date,
                        self.dim.apply_to("(blank)")
                    );
                }
                Decision::Committed { source, capped, .. } => {
                    let cap = step
                        .cap
                        .filter(|&cap| cap < order.last_rank())
                        .and_then(|cap| order.status_at(cap))
                        .map(|s| format!(" cap={s}"))
                        .unwrap_or_default();
                    let scores = step
                        .scores
                        .as_ref()
                        .map(|scores| {
                            order
                                .iter()
                                .filter(|&(rank, _)| scores.get(rank) > 0.0)
                                .map(|(rank, status)| format!("{status}={}", scores.get(rank)))
                                .collect::<Vec<_>>()
                                .join(", ")
                        })
                        .unwrap_or_default();
                    let marker = if capped {
                        self.yellow.apply_to("↧").to_string()
                    } else {
                        " ".to_string()
                    };
                    println!(
                        "  #{:<5} {:<12} {} {:<24} {:<9}{} {}",
                        step.position,
                        date,
                        marker,
                        self.green.apply_to(&step.status),
                        source,
                        cap,
                        self.dim.apply_to(format!("[{scores}]")),
                    );
                }
            }
        }
    }
}
