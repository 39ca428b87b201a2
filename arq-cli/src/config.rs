//! Configuration file support for the simulation driver

use arq_protocol::{
    CodeKind, ConfigError, GoBackN, Probability, Protocol, SimulationConfig, StopAndWait,
    Transfer,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which ARQ engine to simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolKind {
    /// One packet outstanding at a time
    StopAndWait,
    /// Sliding window, whole window resent on timeout
    #[default]
    GoBackN,
}

/// Driver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Engine to run
    #[serde(default)]
    pub protocol: ProtocolKind,
    /// Error-detecting code
    #[serde(default)]
    pub code: CodeKind,
    /// Window size (Go-Back-N only)
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Number of simulation runs to aggregate
    #[serde(default = "default_runs")]
    pub runs: u32,
    /// File receiving every run's trace lines
    #[serde(default)]
    pub trace_file: Option<PathBuf>,
    /// Forward trace lines to the log when no trace file is set
    #[serde(default)]
    pub log_trace: bool,
    /// Payload and channel parameters
    #[serde(default)]
    pub simulation: SimulationConfig,
}

fn default_window_size() -> usize {
    8
}

fn default_runs() -> u32 {
    1
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            protocol: ProtocolKind::default(),
            code: CodeKind::default(),
            window_size: default_window_size(),
            runs: default_runs(),
            trace_file: None,
            log_trace: false,
            simulation: SimulationConfig::default(),
        }
    }
}

impl DriverConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DriverConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: DriverConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DriverConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Create example configuration: 57 bytes in 4-byte packets over a
    /// Go-Back-N window of 8, protected by a parity bit
    pub fn example() -> Self {
        DriverConfig {
            protocol: ProtocolKind::GoBackN,
            code: CodeKind::Parity,
            window_size: 8,
            runs: 100,
            trace_file: Some(PathBuf::from("result.txt")),
            log_trace: false,
            simulation: SimulationConfig {
                byte_count: 57,
                packet_size: 4,
                flip_probability: Probability::new_unchecked(0.001),
                packet_loss_probability: Probability::new_unchecked(0.005),
                ack_loss_probability: Probability::new_unchecked(0.005),
                seed: None,
                step_limit: Some(1_000_000),
            },
        }
    }

    /// Check driver-level values and the simulation sizes
    pub fn validate(&self) -> Result<(), DriverConfigError> {
        if self.runs == 0 {
            return Err(DriverConfigError::Invalid(
                "runs must be at least 1".to_string(),
            ));
        }
        self.simulation.validate()?;
        Ok(())
    }

    /// Build the configured engine over a freshly generated payload
    pub fn build_protocol(&self) -> Result<Box<dyn Protocol>, ConfigError> {
        let transfer = Transfer::generate(&self.simulation, self.code)?;
        Ok(match self.protocol {
            ProtocolKind::StopAndWait => Box::new(StopAndWait::new(transfer)),
            ProtocolKind::GoBackN => Box::new(GoBackN::new(transfer, self.window_size)?),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum DriverConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Simulation error: {0}")]
    Simulation(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
