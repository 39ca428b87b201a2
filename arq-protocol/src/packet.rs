//! Packets and acknowledgement signals
//!
//! A packet is created once by the sender and consumed once by the receiver.
//! It carries both what arrived (possibly nothing) and the pristine encoding
//! that left the sender, so the receiver can tell when a checksum passed bits
//! the channel altered.

use crate::bits::BitBuffer;

/// One unit of transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Sequence index
    index: usize,
    /// Bits as received (`None` = lost in transit)
    data: Option<BitBuffer>,
    /// Encoded bits before channel noise
    reference: BitBuffer,
}

impl Packet {
    /// Create a packet that arrived
    pub fn delivered(index: usize, data: BitBuffer, reference: BitBuffer) -> Self {
        Packet {
            index,
            data: Some(data),
            reference,
        }
    }

    /// Create a packet that was lost in transit
    pub fn lost(index: usize, reference: BitBuffer) -> Self {
        Packet {
            index,
            data: None,
            reference,
        }
    }

    /// Get the sequence index
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Get the received bits, if the packet arrived
    #[inline]
    pub fn data(&self) -> Option<&BitBuffer> {
        self.data.as_ref()
    }

    /// Get the pristine encoded bits
    #[inline]
    pub fn reference(&self) -> &BitBuffer {
        &self.reference
    }

    /// Check if the packet was lost in transit
    #[inline]
    pub fn is_lost(&self) -> bool {
        self.data.is_none()
    }

    /// Number of bits the channel changed, zero for a lost packet
    pub fn altered_bits(&self) -> usize {
        self.data
            .as_ref()
            .map_or(0, |data| data.differing_bits(&self.reference))
    }

    /// Check if the received bits differ from the pristine encoding
    pub fn is_altered(&self) -> bool {
        self.data
            .as_ref()
            .is_some_and(|data| *data != self.reference)
    }
}

/// Outcome of one receiver step, consumed by the next sender step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AckSignal {
    /// The run just started; nothing has been sent yet
    #[default]
    Initial,
    /// No acknowledgement arrived: loss, corruption or a lost ACK
    Timeout,
    /// The packet was accepted and its acknowledgement arrived
    Acknowledged,
}
