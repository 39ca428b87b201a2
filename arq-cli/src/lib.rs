//! ARQ simulator driver library
//!
//! Configuration, argument parsing, repeated runs and statistics display for
//! the `arq-sim` binary.

pub mod args;
pub mod config;
pub mod driver;
pub mod sink;
pub mod stats;

pub use args::Args;
pub use config::{DriverConfig, DriverConfigError, ProtocolKind};
pub use driver::{run_simulation, run_simulation_with_trace, DriverError};
pub use sink::{FileTrace, WriterTrace};
pub use stats::{display_aggregate_stats, format_mean, format_percent, AggregateStats};
