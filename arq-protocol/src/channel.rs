//! Simulated transmission medium
//!
//! The medium flips bits independently with a configured probability and
//! answers yes/no questions such as "is this packet lost?" with Bernoulli
//! draws. All randomness comes from a ChaCha8 RNG owned by the channel, so a
//! seeded channel replays the same impairments for the same inputs.

use crate::bits::BitBuffer;
use crate::config::{ConfigError, Probability};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of channel impairments
///
/// Protocol engines only talk to the medium through this trait, which lets
/// tests script exact corruption and loss patterns.
pub trait Channel {
    /// Pass a buffer through the medium, returning the possibly corrupted copy
    fn apply_noise(&mut self, bits: &BitBuffer) -> BitBuffer;

    /// Draw `true` with the given probability
    fn decide(&mut self, probability: Probability) -> bool;

    /// Draw `true` with the channel's own flip probability
    fn decide_default(&mut self) -> bool;
}

/// Uniform noise channel
///
/// Every bit is flipped independently with `flip_probability`.
#[derive(Debug, Clone)]
pub struct ChannelModel {
    flip_probability: Probability,
    rng: ChaCha8Rng,
}

impl ChannelModel {
    /// Create a channel, seeded when `seed` is given and from OS entropy otherwise
    pub fn new(flip_probability: Probability, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(flip_probability, rng)
    }

    /// Create a channel drawing from an existing generator
    pub fn with_rng(flip_probability: Probability, rng: ChaCha8Rng) -> Self {
        ChannelModel {
            flip_probability,
            rng,
        }
    }

    /// Get the per-bit flip probability
    pub fn flip_probability(&self) -> Probability {
        self.flip_probability
    }

    /// Change the per-bit flip probability
    pub fn set_flip_probability(&mut self, value: f64) -> Result<(), ConfigError> {
        self.flip_probability = Probability::new(value)?;
        Ok(())
    }
}

impl Channel for ChannelModel {
    fn apply_noise(&mut self, bits: &BitBuffer) -> BitBuffer {
        let mut noisy = bits.clone();
        if self.flip_probability == Probability::ZERO {
            return noisy;
        }
        for index in 0..noisy.len() {
            if self.decide_default() {
                noisy.flip(index);
            }
        }
        noisy
    }

    fn decide(&mut self, probability: Probability) -> bool {
        // gen::<f64>() is in [0, 1): zero never fires, one always does
        self.rng.gen::<f64>() < probability.value()
    }

    fn decide_default(&mut self) -> bool {
        self.decide(self.flip_probability)
    }
}
