//! ARQ Simulator - Stop-and-Wait and Go-Back-N over a noisy channel
//!
//! Runs the configured protocol repeatedly and prints aggregate statistics.

use arq_cli::{display_aggregate_stats, run_simulation, Args, DriverConfig};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = &args.write_example {
        DriverConfig::example().to_file(path)?;
        tracing::info!("Example configuration written to {}", path.display());
        return Ok(());
    }

    tracing::info!("ARQ simulator starting...");
    let config = args.resolve()?;
    let stats = run_simulation(&config)?;
    display_aggregate_stats(&stats, &config);

    if stats.aborted_runs > 0 {
        tracing::warn!(
            "{} of {} runs hit the step limit",
            stats.aborted_runs,
            config.runs
        );
    }

    Ok(())
}
