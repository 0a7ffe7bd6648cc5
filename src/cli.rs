//! Command-line interface.
//!
//! Defines [`Cli`] with the [`Command`] subcommands (infer, order, explain)
//! and the global flags (--config, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// istatus — infers a monotone job status column for daily work reports.
#[derive(Debug, Parser)]
#[command(name = "istatus", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (defaults to ./istatus.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enables debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Infers a status for every row and writes the CSV with the new column.
    Infer {
        /// Input CSV of daily work report rows.
        input: PathBuf,

        /// CSV holding the canonical status order.
        #[arg(long, value_name = "PATH")]
        order: Option<PathBuf>,

        /// Output path; stdout when omitted.
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Name of the appended column.
        #[arg(long, value_name = "NAME")]
        column: Option<String>,

        /// Prints the run summary as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Prints the canonical status order with ranks.
    Order {
        /// CSV holding the canonical status order.
        #[arg(long, value_name = "PATH")]
        order: Option<PathBuf>,
    },

    /// Shows how each row of one job got its status.
    Explain {
        /// Input CSV of daily work report rows.
        input: PathBuf,

        /// Job number to trace.
        #[arg(long)]
        job: String,

        /// CSV holding the canonical status order.
        #[arg(long, value_name = "PATH")]
        order: Option<PathBuf>,
    },
}
