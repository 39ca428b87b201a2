//! Common interface of the protocol engines

use crate::config::ConfigError;
use crate::stats::{Counters, RunReport};
use crate::transfer::Transfer;
use thiserror::Error;

/// Simulation errors
///
/// Channel events are never errors; they are counted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Run exceeded the step limit of {limit}")]
    StepLimitExceeded { limit: u64 },
}

/// Outcome of a sender step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SenderStep {
    /// A receiver step follows
    Continue,
    /// The last packet was acknowledged
    Finished,
}

/// ARQ engine that runs complete simulated transfers
pub trait Protocol {
    /// Short protocol name
    fn name(&self) -> &'static str;

    /// Reset per-run state and transfer the whole payload once
    fn run_once(&mut self) -> Result<RunReport, SimulationError>;

    /// Shared transfer state
    fn transfer(&self) -> &Transfer;

    /// Shared transfer state, mutably (e.g. to attach a trace sink)
    fn transfer_mut(&mut self) -> &mut Transfer;

    /// Counters of the most recent run
    fn counters(&self) -> Counters {
        self.transfer().counters()
    }
}
