use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `ISTATUS_LOG=debug`.
pub const LOG_ENV: &str = "ISTATUS_LOG";

/// Installs the stderr subscriber. `ISTATUS_LOG` wins over `--verbose`;
/// without either only warnings are shown.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "istatus=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
