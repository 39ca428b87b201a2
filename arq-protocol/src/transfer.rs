//! Shared transfer state
//!
//! Both engines own a [`Transfer`]: the segmented payload, the error code,
//! the channel, the loss probabilities, the trace sink and the counters. The
//! engines differ only in how they schedule sends; the mechanics of a single
//! send and a single receive live here.
//!
//! # Receive rules
//!
//! 1. With duplicate suppression on, an already accepted index is
//!    acknowledged again without side effects.
//! 2. A lost packet counts as `lost_packets` and times out.
//! 3. A packet failing verification counts as `corrupted` and times out.
//! 4. A packet passing verification with altered bits counts as `misjudged`
//!    and is still accepted.
//! 5. Accepted packets are acknowledged unless the acknowledgement is lost,
//!    which the sender observes as a timeout.

use crate::bits::BitBuffer;
use crate::channel::{Channel, ChannelModel};
use crate::code::{CodeKind, ErrorCode};
use crate::config::{ConfigError, Probability, SimulationConfig};
use crate::engine::SimulationError;
use crate::packet::{AckSignal, Packet};
use crate::stats::{Counters, RunReport};
use crate::trace::{Trace, TraceSink};
use bytes::Bytes;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::fmt;

/// Payload, code, channel and per-run bookkeeping
pub struct Transfer {
    payload: Bytes,
    segments: Vec<BitBuffer>,
    code: Box<dyn ErrorCode>,
    channel: Box<dyn Channel>,
    packet_loss_probability: Probability,
    ack_loss_probability: Probability,
    step_limit: Option<u64>,
    trace: Trace,
    counters: Counters,
    /// Accepted index -> pristine bits of the accepted packet
    accepted: BTreeMap<usize, BitBuffer>,
    packets_sent: u64,
}

impl Transfer {
    /// Generate a random payload and a [`ChannelModel`] from a configuration
    ///
    /// With a seed, the payload and every channel decision are reproducible.
    pub fn generate(config: &SimulationConfig, code: CodeKind) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut payload = vec![0u8; config.byte_count];
        rng.fill_bytes(&mut payload);

        if config.flip_probability.is_certain() && config.step_limit.is_none() {
            // each resend arrives as the same inverted packet
            tracing::warn!("every bit is flipped without a step limit; runs may not terminate");
        }
        let channel = ChannelModel::with_rng(config.flip_probability, rng);
        Self::with_parts(
            Bytes::from(payload),
            config,
            code.build(config.packet_size),
            Box::new(channel),
        )
    }

    /// Assemble a transfer from explicit parts
    ///
    /// The payload length takes the place of `config.byte_count`; the
    /// channel's own flip probability takes the place of
    /// `config.flip_probability`.
    pub fn with_parts(
        payload: Bytes,
        config: &SimulationConfig,
        code: Box<dyn ErrorCode>,
        channel: Box<dyn Channel>,
    ) -> Result<Self, ConfigError> {
        let config = SimulationConfig {
            byte_count: payload.len(),
            ..config.clone()
        };
        config.validate()?;

        // the channel brings its own noise, so only the loss terms apply here
        if config.has_certain_loss() && config.step_limit.is_none() {
            tracing::warn!(
                packet_loss = %config.packet_loss_probability,
                ack_loss = %config.ack_loss_probability,
                "certain loss without a step limit; runs will not terminate"
            );
        }

        let segments = payload
            .chunks(config.packet_size)
            .map(BitBuffer::from_bytes)
            .collect();

        Ok(Transfer {
            payload,
            segments,
            code,
            channel,
            packet_loss_probability: config.packet_loss_probability,
            ack_loss_probability: config.ack_loss_probability,
            step_limit: config.step_limit,
            trace: Trace::default(),
            counters: Counters::default(),
            accepted: BTreeMap::new(),
            packets_sent: 0,
        })
    }

    /// Attach a trace sink, replacing any previous one
    pub fn set_trace_sink<S: TraceSink + 'static>(&mut self, sink: S) {
        self.trace.set(Some(Box::new(sink)));
    }

    /// Write a caller-supplied line to the trace sink, if any
    pub fn annotate(&mut self, line: &str) {
        self.trace.emit(|| line.to_string());
    }

    /// Check if a trace sink is attached
    pub fn is_tracing(&self) -> bool {
        self.trace.is_enabled()
    }

    /// The full payload
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Number of packets the payload is segmented into
    pub fn sequence_count(&self) -> usize {
        self.segments.len()
    }

    /// The error-detecting code in use
    pub fn code(&self) -> &dyn ErrorCode {
        self.code.as_ref()
    }

    /// Counters of the current or most recent run
    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Transmissions in the current or most recent run
    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    /// Indices accepted by the receiver, ascending
    pub fn accepted_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.accepted.keys().copied()
    }

    /// Check if the receiver accepted `index`
    pub fn is_accepted(&self, index: usize) -> bool {
        self.accepted.contains_key(&index)
    }

    /// Reassemble the payload from accepted packets
    ///
    /// Returns `None` until every index has been accepted.
    pub fn delivered_payload(&self) -> Option<Bytes> {
        let width = self.code.field_width();
        let mut delivered = Vec::with_capacity(self.payload.len());
        for index in 0..self.sequence_count() {
            let bits = self.accepted.get(&index)?;
            let (data, _) = bits.split_at(bits.len().saturating_sub(width));
            delivered.extend(data.to_bytes());
        }
        Some(Bytes::from(delivered))
    }

    /// Clear counters and per-run bookkeeping
    pub(crate) fn reset(&mut self) {
        self.counters = Counters::default();
        self.accepted.clear();
        self.packets_sent = 0;
    }

    pub(crate) fn trace<F: FnOnce() -> String>(&mut self, line: F) {
        self.trace.emit(line);
    }

    pub(crate) fn count_timeout(&mut self) {
        self.counters.lost_acks += 1;
    }

    pub(crate) fn check_step(&self, steps: u64) -> Result<(), SimulationError> {
        match self.step_limit {
            Some(limit) if steps > limit => {
                tracing::warn!(limit, "step limit exceeded");
                Err(SimulationError::StepLimitExceeded { limit })
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn report(&self, steps: u64) -> RunReport {
        RunReport {
            counters: self.counters,
            packets_sent: self.packets_sent,
            steps,
            sequence_count: self.sequence_count(),
        }
    }

    /// Encode packet `index`, pass it through the channel and roll for loss
    pub(crate) fn send(&mut self, index: usize) -> Packet {
        let reference = self.code.encode(&self.segments[index]);
        self.trace(|| format!("Packet #{} sent: {}", index, reference));

        let noisy = self.channel.apply_noise(&reference);
        let lost = self.channel.decide(self.packet_loss_probability);
        self.packets_sent += 1;
        tracing::trace!(index, lost, "packet sent");

        if lost {
            Packet::lost(index, reference)
        } else {
            Packet::delivered(index, noisy, reference)
        }
    }

    /// Evaluate one packet at the receiver
    pub(crate) fn receive(&mut self, packet: Packet, suppress_duplicates: bool) -> AckSignal {
        let index = packet.index();
        if suppress_duplicates && self.accepted.contains_key(&index) {
            return AckSignal::Acknowledged;
        }

        let Some(data) = packet.data() else {
            self.trace(|| format!("Packet #{} was lost.", index));
            self.counters.lost_packets += 1;
            return AckSignal::Timeout;
        };

        let correct = self.code.verify(data);
        self.trace(|| {
            let verdict = if correct { "correct" } else { "incorrect" };
            format!("Packet #{} received as {}: {}", index, verdict, data)
        });
        if !correct {
            self.counters.corrupted += 1;
            return AckSignal::Timeout;
        }

        if packet.is_altered() {
            self.counters.misjudged += 1;
            tracing::debug!(
                index,
                flipped = packet.altered_bits(),
                "checksum passed an altered packet"
            );
        }

        let accepted = packet.reference().clone();
        self.accepted.insert(index, accepted);

        if self.channel.decide(self.ack_loss_probability) {
            tracing::trace!(index, "acknowledgement lost");
            AckSignal::Timeout
        } else {
            AckSignal::Acknowledged
        }
    }
}

impl fmt::Debug for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transfer")
            .field("bytes", &self.payload.len())
            .field("packets", &self.segments.len())
            .field("code", &self.code.to_string())
            .field("counters", &self.counters)
            .field("packets_sent", &self.packets_sent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{BitSum, Parity};

    fn perfect_transfer(payload: &[u8], packet_size: usize) -> Transfer {
        let config = SimulationConfig::perfect(payload.len(), packet_size).with_seed(1);
        Transfer::with_parts(
            Bytes::copy_from_slice(payload),
            &config,
            Box::new(Parity),
            Box::new(ChannelModel::new(Probability::ZERO, Some(1))),
        )
        .unwrap()
    }

    #[test]
    fn test_segmentation_last_packet_shorter() {
        let transfer = perfect_transfer(&[1, 2, 3, 4, 5], 2);
        assert_eq!(transfer.sequence_count(), 3);
        assert_eq!(transfer.segments[2].len(), 8);
        assert_eq!(transfer.segments[0].len(), 16);
    }

    #[test]
    fn test_generate_is_seeded() {
        let config = SimulationConfig::perfect(32, 4).with_seed(99);
        let a = Transfer::generate(&config, CodeKind::Crc8).unwrap();
        let b = Transfer::generate(&config, CodeKind::Crc8).unwrap();
        assert_eq!(a.payload(), b.payload());
        assert_eq!(a.payload().len(), 32);
        assert_eq!(a.code().field_width(), 8);
    }

    #[test]
    fn test_generate_rejects_bad_sizes() {
        let config = SimulationConfig::perfect(4, 5);
        assert!(matches!(
            Transfer::generate(&config, CodeKind::Parity),
            Err(ConfigError::InvalidPacketSize { .. })
        ));
    }

    #[test]
    fn test_with_parts_rejects_empty_payload() {
        let config = SimulationConfig::perfect(1, 1);
        let result = Transfer::with_parts(
            Bytes::new(),
            &config,
            Box::new(Parity),
            Box::new(ChannelModel::new(Probability::ZERO, None)),
        );
        assert_eq!(result.err(), Some(ConfigError::InvalidByteCount(0)));
    }

    #[test]
    fn test_receive_lost_packet() {
        let mut transfer = perfect_transfer(&[0xAA, 0xBB], 1);
        let packet = Packet::lost(0, BitBuffer::zeroed(9));
        assert_eq!(transfer.receive(packet, true), AckSignal::Timeout);
        assert_eq!(transfer.counters().lost_packets, 1);
        assert!(!transfer.is_accepted(0));
    }

    #[test]
    fn test_receive_corrupted_packet() {
        let mut transfer = perfect_transfer(&[0xAA, 0xBB], 1);
        let reference = Parity.encode(&BitBuffer::from_bytes(&[0xAA]));
        let mut data = reference.clone();
        data.flip(2);
        let signal = transfer.receive(Packet::delivered(0, data, reference), true);
        assert_eq!(signal, AckSignal::Timeout);
        assert_eq!(transfer.counters().corrupted, 1);
        assert!(!transfer.is_accepted(0));
    }

    #[test]
    fn test_receive_misjudged_packet_is_accepted() {
        let config = SimulationConfig::perfect(2, 1);
        let code = BitSum::new(1);
        let mut transfer = Transfer::with_parts(
            Bytes::from_static(&[0x01, 0x02]),
            &config,
            Box::new(code),
            Box::new(ChannelModel::new(Probability::ZERO, Some(1))),
        )
        .unwrap();

        let reference = code.encode(&BitBuffer::from_bytes(&[0x01]));
        let mut data = reference.clone();
        data.flip(0);
        data.flip(1);
        let signal = transfer.receive(Packet::delivered(0, data, reference), true);

        assert_eq!(signal, AckSignal::Acknowledged);
        assert_eq!(transfer.counters().misjudged, 1);
        assert_eq!(transfer.counters().corrupted, 0);
        assert!(transfer.is_accepted(0));
    }

    #[test]
    fn test_duplicate_is_reacknowledged_without_side_effects() {
        let mut transfer = perfect_transfer(&[0xAA, 0xBB], 1);
        let first = transfer.send(0);
        assert_eq!(transfer.receive(first, true), AckSignal::Acknowledged);

        let duplicate = Packet::lost(0, BitBuffer::zeroed(9));
        assert_eq!(transfer.receive(duplicate, true), AckSignal::Acknowledged);
        assert!(transfer.counters().is_clean());
    }

    #[test]
    fn test_delivered_payload() {
        let mut transfer = perfect_transfer(&[1, 2, 3], 2);
        assert!(transfer.delivered_payload().is_none());
        for index in 0..transfer.sequence_count() {
            let packet = transfer.send(index);
            transfer.receive(packet, false);
        }
        assert_eq!(transfer.packets_sent(), 2);
        assert_eq!(
            transfer.delivered_payload(),
            Some(Bytes::from_static(&[1, 2, 3]))
        );

        transfer.reset();
        assert_eq!(transfer.packets_sent(), 0);
        assert_eq!(transfer.accepted_indices().count(), 0);
    }

    #[test]
    fn test_trace_lines() {
        let mut transfer = perfect_transfer(&[0x01, 0x02], 1);
        let trace = crate::trace::SharedTrace::new();
        transfer.set_trace_sink(trace.clone());
        assert!(transfer.is_tracing());

        let packet = transfer.send(0);
        transfer.receive(packet, false);
        assert_eq!(
            trace.lines(),
            vec![
                "Packet #0 sent: 100000001".to_string(),
                "Packet #0 received as correct: 100000001".to_string(),
            ]
        );
    }

    #[test]
    fn test_step_limit() {
        let config = SimulationConfig::perfect(2, 1).with_step_limit(3);
        let transfer = Transfer::with_parts(
            Bytes::from_static(&[0, 0]),
            &config,
            Box::new(Parity),
            Box::new(ChannelModel::new(Probability::ZERO, None)),
        )
        .unwrap();
        assert!(transfer.check_step(3).is_ok());
        assert_eq!(
            transfer.check_step(4),
            Err(SimulationError::StepLimitExceeded { limit: 3 })
        );
    }
}
