//! Repeated simulation runs
//!
//! The driver builds one engine from a [`DriverConfig`] and calls
//! [`Protocol::run_once`] for every run, so a seeded configuration yields a
//! reproducible series rather than the same run repeated.

use crate::config::{DriverConfig, DriverConfigError};
use crate::sink::FileTrace;
use crate::stats::AggregateStats;
use arq_protocol::{ConfigError, SimulationError, TraceSink, TracingSink};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Driver errors
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Configuration error: {0}")]
    Config(#[from] DriverConfigError),

    #[error("Cannot build protocol: {0}")]
    Protocol(#[from] ConfigError),

    #[error("Simulation failed: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Trace file error: {0}")]
    Trace(#[from] io::Error),
}

/// Run the configured simulation, tracing to `config.trace_file` if set
///
/// Without a trace file, `config.log_trace` sends the trace lines to the log
/// instead.
pub fn run_simulation(config: &DriverConfig) -> Result<AggregateStats, DriverError> {
    let Some(path) = &config.trace_file else {
        return if config.log_trace {
            run_with_sink(config, Some(TracingSink))
        } else {
            run_with_sink(config, None::<TracingSink>)
        };
    };

    tracing::info!("Writing trace to {}", path.display());
    let trace = Arc::new(Mutex::new(FileTrace::create(path)?));
    let stats = run_with_sink(config, Some(trace.clone()))?;
    trace.lock().finish()?;
    Ok(stats)
}

/// Run the configured simulation with an explicit trace sink
pub fn run_simulation_with_trace<S: TraceSink + 'static>(
    config: &DriverConfig,
    sink: S,
) -> Result<AggregateStats, DriverError> {
    run_with_sink(config, Some(sink))
}

fn run_with_sink<S: TraceSink + 'static>(
    config: &DriverConfig,
    sink: Option<S>,
) -> Result<AggregateStats, DriverError> {
    config.validate()?;
    let mut protocol = config.build_protocol()?;
    if let Some(sink) = sink {
        protocol.transfer_mut().set_trace_sink(sink);
    }

    tracing::info!(
        protocol = protocol.name(),
        code = %config.code,
        packets = protocol.transfer().sequence_count(),
        runs = config.runs,
        "Starting simulation"
    );

    let mut stats = AggregateStats::default();
    for run in 1..=config.runs {
        protocol
            .transfer_mut()
            .annotate(&format!("Run {}/{}", run, config.runs));

        match protocol.run_once() {
            Ok(report) => {
                tracing::debug!(run, ?report, "Run completed");
                stats.record(&report);
            }
            Err(SimulationError::StepLimitExceeded { limit }) => {
                tracing::warn!(run, limit, "Run aborted at the step limit");
                stats.record_aborted();
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(
        completed = stats.completed_runs,
        aborted = stats.aborted_runs,
        "Simulation finished"
    );
    Ok(stats)
}
