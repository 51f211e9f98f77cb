use crate::cli::args::Cli;
use crate::plugin::{self, Failure};
use std::io;
use tracing_subscriber::EnvFilter;

fn log_filter(cli: &Cli) -> &'static str {
    match (cli.verbose, cli.debug) {
        (0, false) => "esa_cert_rotator=info", // Default: progress and errors
        (0, true) | (1, _) => "esa_cert_rotator=debug", // PLUGIN_DEBUG or -v
        _ => "esa_cert_rotator=trace",                // -vv+: signing details
    }
}

fn init_logging(cli: &Cli) {
    // RUST_LOG wins over the flags
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter(cli)));

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Run the plugin once. Every failure is logged here; the caller only
/// decides the exit code.
pub async fn handle_command(cli: Cli) -> Result<(), Failure> {
    init_logging(&cli);

    match plugin::run(&cli).await {
        Ok(report) => {
            tracing::debug!("Rotation finished: {report:?}");
            Ok(())
        }
        Err(failure) => {
            tracing::error!("{failure}");
            Err(failure)
        }
    }
}
