//! Shared fixtures for the ARQ integration tests
//!
//! [`ScriptedChannel`] replaces the random medium with a script, so tests
//! can force a specific corruption, packet loss or acknowledgement loss and
//! assert the exact engine behaviour that follows.

use arq_protocol::{BitBuffer, Channel, ErrorCode, Probability, SimulationConfig, Transfer};
use bytes::Bytes;
use std::collections::{HashMap, HashSet};

/// Loss probability the scripted channel reads as "packet loss draw"
pub const PACKET_LOSS_TAG: f64 = 0.25;

/// Loss probability the scripted channel reads as "ack loss draw"
pub const ACK_LOSS_TAG: f64 = 0.5;

/// Deterministic channel driven by a script
///
/// Draws are told apart by the probability the transfer passes in: a
/// configuration built by [`scripted_config`] uses [`PACKET_LOSS_TAG`] for
/// packet loss and [`ACK_LOSS_TAG`] for acknowledgement loss. Anything not
/// scripted passes through untouched.
#[derive(Debug, Default, Clone)]
pub struct ScriptedChannel {
    /// Noise call number -> bit positions to flip
    flips: HashMap<u64, Vec<usize>>,
    /// Packet-loss draw numbers that lose the packet
    lost_packets: HashSet<u64>,
    /// Ack-loss draw numbers that lose the acknowledgement
    lost_acks: HashSet<u64>,
    noise_calls: u64,
    packet_draws: u64,
    ack_draws: u64,
}

impl ScriptedChannel {
    /// Channel that never interferes
    pub fn perfect() -> Self {
        Self::default()
    }

    /// Flip `positions` on the `call`-th transmission (0-based)
    pub fn flip_on(mut self, call: u64, positions: &[usize]) -> Self {
        self.flips.insert(call, positions.to_vec());
        self
    }

    /// Lose the packet on the `draw`-th packet-loss draw (0-based)
    pub fn lose_packet_on(mut self, draw: u64) -> Self {
        self.lost_packets.insert(draw);
        self
    }

    /// Lose the acknowledgement on the `draw`-th ack-loss draw (0-based)
    pub fn lose_ack_on(mut self, draw: u64) -> Self {
        self.lost_acks.insert(draw);
        self
    }
}

impl Channel for ScriptedChannel {
    fn apply_noise(&mut self, bits: &BitBuffer) -> BitBuffer {
        let mut noisy = bits.clone();
        if let Some(positions) = self.flips.get(&self.noise_calls) {
            for &position in positions {
                noisy.flip(position);
            }
        }
        self.noise_calls += 1;
        noisy
    }

    fn decide(&mut self, probability: Probability) -> bool {
        if probability.value() == PACKET_LOSS_TAG {
            let draw = self.packet_draws;
            self.packet_draws += 1;
            self.lost_packets.contains(&draw)
        } else if probability.value() == ACK_LOSS_TAG {
            let draw = self.ack_draws;
            self.ack_draws += 1;
            self.lost_acks.contains(&draw)
        } else {
            probability.is_certain()
        }
    }

    fn decide_default(&mut self) -> bool {
        false
    }
}

/// Configuration whose loss probabilities carry the scripted-channel tags
///
/// The values 0.25 and 0.5 are reserved: [`ScriptedChannel`] routes draws
/// by comparing against them, so a test that sets either loss probability
/// to one of these values by hand gets scripted behaviour instead of a
/// random draw, and two equal tags would merge the packet and ack scripts.
pub fn scripted_config(byte_count: usize, packet_size: usize) -> SimulationConfig {
    SimulationConfig::perfect(byte_count, packet_size)
        .with_probabilities(0.0, PACKET_LOSS_TAG, ACK_LOSS_TAG)
        .expect("tag probabilities are valid")
}

/// Transfer of `payload` over a scripted channel
pub fn scripted_transfer(
    payload: &[u8],
    packet_size: usize,
    code: Box<dyn ErrorCode>,
    channel: ScriptedChannel,
) -> Transfer {
    Transfer::with_parts(
        Bytes::copy_from_slice(payload),
        &scripted_config(payload.len(), packet_size),
        code,
        Box::new(channel),
    )
    .expect("valid scripted transfer")
}

/// Payload of `len` bytes counting up from 1
pub fn counting_payload(len: usize) -> Vec<u8> {
    (1..=len).map(|i| i as u8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_route_to_separate_scripts() {
        assert_ne!(PACKET_LOSS_TAG, ACK_LOSS_TAG);
        let config = scripted_config(4, 1);
        assert_eq!(config.packet_loss_probability.value(), PACKET_LOSS_TAG);
        assert_eq!(config.ack_loss_probability.value(), ACK_LOSS_TAG);

        let mut channel = ScriptedChannel::perfect().lose_packet_on(1).lose_ack_on(0);
        let packet = config.packet_loss_probability;
        let ack = config.ack_loss_probability;
        assert!(channel.decide(ack));
        assert!(!channel.decide(packet));
        assert!(channel.decide(packet));
        assert!(!channel.decide(ack));
    }

    #[test]
    fn test_untagged_probabilities_pass_through() {
        let mut channel = ScriptedChannel::perfect().lose_packet_on(0).lose_ack_on(0);
        assert!(!channel.decide(Probability::new(0.75).unwrap()));
        assert!(channel.decide(Probability::ONE));
        // untagged draws do not consume scripted ones
        assert!(channel.decide(Probability::new(PACKET_LOSS_TAG).unwrap()));
    }
}
