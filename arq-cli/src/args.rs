//! Command-line arguments
//!
//! Every simulation flag is optional and overrides the matching value from
//! the configuration file, or from the defaults when no file is given.

use crate::config::{DriverConfig, DriverConfigError, ProtocolKind};
use arq_protocol::{CodeKind, Probability};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "arq-sim")]
#[command(about = "Simulate Stop-and-Wait and Go-Back-N ARQ over a noisy channel", long_about = None)]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Protocol engine
    #[arg(short, long, value_enum)]
    pub protocol: Option<ProtocolKind>,

    /// Error-detecting code (parity, bit-sum, crc8, crc16, crc32)
    #[arg(long)]
    pub code: Option<CodeKind>,

    /// Payload size in bytes
    #[arg(short, long)]
    pub bytes: Option<usize>,

    /// Bytes per packet
    #[arg(long)]
    pub packet_size: Option<usize>,

    /// Go-Back-N window size
    #[arg(short, long)]
    pub window: Option<usize>,

    /// Per-bit flip probability
    #[arg(long)]
    pub flip: Option<f64>,

    /// Packet loss probability
    #[arg(long)]
    pub packet_loss: Option<f64>,

    /// Acknowledgement loss probability
    #[arg(long)]
    pub ack_loss: Option<f64>,

    /// Number of runs to aggregate
    #[arg(short, long)]
    pub runs: Option<u32>,

    /// RNG seed for a reproducible series of runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Abort a run after this many sender steps
    #[arg(long)]
    pub step_limit: Option<u64>,

    /// Write every run's trace to this file
    #[arg(short, long)]
    pub trace: Option<PathBuf>,

    /// Verbose output; without --trace, trace lines also go to the log
    #[arg(short, long)]
    pub verbose: bool,

    /// Write an example configuration to this file and exit
    #[arg(long)]
    pub write_example: Option<PathBuf>,
}

impl Args {
    /// Load the configuration file (if any), apply flag overrides and validate
    pub fn resolve(&self) -> Result<DriverConfig, DriverConfigError> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                DriverConfig::from_file(path)?
            }
            None => DriverConfig::default(),
        };

        if let Some(protocol) = self.protocol {
            config.protocol = protocol;
        }
        if let Some(code) = self.code {
            config.code = code;
        }
        if let Some(window) = self.window {
            config.window_size = window;
        }
        if let Some(runs) = self.runs {
            config.runs = runs;
        }
        if let Some(trace) = &self.trace {
            config.trace_file = Some(trace.clone());
        }
        if self.verbose && config.trace_file.is_none() {
            config.log_trace = true;
        }

        let simulation = &mut config.simulation;
        if let Some(bytes) = self.bytes {
            simulation.byte_count = bytes;
        }
        if let Some(packet_size) = self.packet_size {
            simulation.packet_size = packet_size;
        }
        if let Some(flip) = self.flip {
            simulation.flip_probability = Probability::new(flip)?;
        }
        if let Some(loss) = self.packet_loss {
            simulation.packet_loss_probability = Probability::new(loss)?;
        }
        if let Some(loss) = self.ack_loss {
            simulation.ack_loss_probability = Probability::new(loss)?;
        }
        if self.seed.is_some() {
            simulation.seed = self.seed;
        }
        if self.step_limit.is_some() {
            simulation.step_limit = self.step_limit;
        }

        config.validate()?;
        Ok(config)
    }
}
