//! Simulation configuration
//!
//! Every knob a run depends on lives here, validated once at construction.
//! Invalid values are configuration errors: they fail fast and are never
//! clamped into range.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("Byte count must be at least 1, got {0}")]
    InvalidByteCount(usize),

    #[error("Packet size {packet_size} must be between 1 and the byte count {byte_count}")]
    InvalidPacketSize { packet_size: usize, byte_count: usize },

    #[error(
        "Window size {window_size} must be at least 1 and smaller than the sequence count {sequence_count}"
    )]
    InvalidWindowSize {
        window_size: usize,
        sequence_count: usize,
    },
}

/// Probability validated to lie in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Probability(f64);

impl Probability {
    /// Never happens
    pub const ZERO: Probability = Probability(0.0);

    /// Always happens
    pub const ONE: Probability = Probability(1.0);

    /// Validate and wrap a probability
    pub fn new(value: f64) -> Result<Self, ConfigError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Probability(value))
        } else {
            Err(ConfigError::InvalidProbability(value))
        }
    }

    /// Wrap a probability without range checking
    ///
    /// For literals known to lie in `[0, 1]`; anything read at runtime goes
    /// through [`Probability::new`].
    #[inline]
    pub const fn new_unchecked(value: f64) -> Self {
        Probability(value)
    }

    /// Get the raw value
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Check if this event happens on every draw
    #[inline]
    pub fn is_certain(self) -> bool {
        self.0 >= 1.0
    }
}

impl TryFrom<f64> for Probability {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Probability::new(value)
    }
}

impl From<Probability> for f64 {
    fn from(probability: Probability) -> f64 {
        probability.0
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters shared by every protocol engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Total payload size in bytes
    #[serde(default = "default_byte_count")]
    pub byte_count: usize,
    /// Bytes per packet (the last packet may be shorter)
    #[serde(default = "default_packet_size")]
    pub packet_size: usize,
    /// Per-bit flip probability of the medium
    #[serde(default = "default_flip_probability")]
    pub flip_probability: Probability,
    /// Probability that a packet never reaches the receiver
    #[serde(default = "default_loss_probability")]
    pub packet_loss_probability: Probability,
    /// Probability that an acknowledgement never reaches the sender
    #[serde(default = "default_loss_probability")]
    pub ack_loss_probability: Probability,
    /// Seed for the payload and the channel; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Maximum sender steps per run; unbounded when absent
    #[serde(default)]
    pub step_limit: Option<u64>,
}

fn default_byte_count() -> usize {
    57
}

fn default_packet_size() -> usize {
    4
}

fn default_flip_probability() -> Probability {
    Probability::new_unchecked(0.01)
}

fn default_loss_probability() -> Probability {
    Probability::new_unchecked(0.005)
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            byte_count: default_byte_count(),
            packet_size: default_packet_size(),
            flip_probability: default_flip_probability(),
            packet_loss_probability: default_loss_probability(),
            ack_loss_probability: default_loss_probability(),
            seed: None,
            step_limit: None,
        }
    }
}

impl SimulationConfig {
    /// Create a configuration with an unimpaired medium
    pub fn perfect(byte_count: usize, packet_size: usize) -> Self {
        SimulationConfig {
            byte_count,
            packet_size,
            flip_probability: Probability::ZERO,
            packet_loss_probability: Probability::ZERO,
            ack_loss_probability: Probability::ZERO,
            seed: None,
            step_limit: None,
        }
    }

    /// Set all three channel probabilities, validating each
    pub fn with_probabilities(
        mut self,
        flip: f64,
        packet_loss: f64,
        ack_loss: f64,
    ) -> Result<Self, ConfigError> {
        self.flip_probability = Probability::new(flip)?;
        self.packet_loss_probability = Probability::new(packet_loss)?;
        self.ack_loss_probability = Probability::new(ack_loss)?;
        Ok(self)
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the step limit
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// Number of packets the payload is segmented into
    pub fn sequence_count(&self) -> usize {
        if self.packet_size == 0 {
            return 0;
        }
        self.byte_count.div_ceil(self.packet_size)
    }

    /// Check sizes for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.byte_count < 1 {
            return Err(ConfigError::InvalidByteCount(self.byte_count));
        }
        if self.packet_size < 1 || self.packet_size > self.byte_count {
            return Err(ConfigError::InvalidPacketSize {
                packet_size: self.packet_size,
                byte_count: self.byte_count,
            });
        }
        Ok(())
    }

    /// Check if every packet or every acknowledgement is lost
    pub fn has_certain_loss(&self) -> bool {
        self.packet_loss_probability.is_certain() || self.ack_loss_probability.is_certain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_bounds() {
        assert!(Probability::new(0.0).is_ok());
        assert!(Probability::new(1.0).is_ok());
        assert_eq!(
            Probability::new(1.5),
            Err(ConfigError::InvalidProbability(1.5))
        );
        assert!(Probability::new(-0.01).is_err());
        assert!(Probability::new(f64::NAN).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.byte_count, 57);
        assert_eq!(config.packet_size, 4);
        assert_eq!(config.sequence_count(), 15);
        assert_eq!(config.flip_probability.value(), 0.01);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_byte_count() {
        let config = SimulationConfig::perfect(0, 1);
        assert_eq!(config.validate(), Err(ConfigError::InvalidByteCount(0)));
    }

    #[test]
    fn test_validate_packet_size() {
        assert!(SimulationConfig::perfect(8, 0).validate().is_err());
        assert!(SimulationConfig::perfect(8, 9).validate().is_err());
        assert!(SimulationConfig::perfect(8, 8).validate().is_ok());
    }

    #[test]
    fn test_sequence_count_rounds_up() {
        assert_eq!(SimulationConfig::perfect(8, 1).sequence_count(), 8);
        assert_eq!(SimulationConfig::perfect(9, 4).sequence_count(), 3);
        assert_eq!(SimulationConfig::perfect(8, 8).sequence_count(), 1);
    }

    #[test]
    fn test_with_probabilities_rejects_out_of_range() {
        let result = SimulationConfig::default().with_probabilities(0.1, 2.0, 0.0);
        assert_eq!(result, Err(ConfigError::InvalidProbability(2.0)));
    }

    #[test]
    fn test_certain_loss() {
        let config = SimulationConfig::perfect(8, 1)
            .with_probabilities(0.0, 1.0, 0.0)
            .unwrap();
        assert!(config.has_certain_loss());
        assert!(!SimulationConfig::default().has_certain_loss());

        // flips are the channel's business, not a loss
        let flips_only = SimulationConfig::perfect(8, 1)
            .with_probabilities(1.0, 0.0, 0.0)
            .unwrap();
        assert!(!flips_only.has_certain_loss());
    }
}
