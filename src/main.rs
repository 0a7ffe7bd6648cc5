mod cli;
mod config;
mod error;
mod inference;
mod logging;
mod pipeline;
mod report;
mod table;
mod ui;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Command};
use config::IstatusConfig;
use pipeline::Session;
use ui::Palette;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let config = IstatusConfig::load(cli.config.as_deref())?;
    let palette = Palette::default();

    match cli.command {
        Command::Infer {
            input,
            order,
            output,
            column,
            json,
        } => {
            let session = Session::prepare(config, order.as_deref())?;
            let report = session.infer_file(&input, output.as_deref(), column.as_deref())?;
            palette.print_report(&report, json);
        }
        Command::Order { order } => {
            let session = Session::prepare(config, order.as_deref())?;
            palette.print_order(&session.order);
        }
        Command::Explain { input, job, order } => {
            let session = Session::prepare(config, order.as_deref())?;
            let table = table::read_table_path(&input)?;
            let Some(trace) = session.explain(&table, &job) else {
                bail!("job {job:?} not found in {}", input.display());
            };
            palette.print_trace(&trace, &table.rows, &session.order, &session.config.fields.date);
        }
    }

    Ok(())
}
