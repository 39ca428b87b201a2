//! Per-run counters and reports

use std::ops::AddAssign;

/// Channel outcomes counted during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Counters {
    /// Packets the checksum correctly rejected
    pub corrupted: u64,
    /// Packets the checksum passed although their bits were altered
    pub misjudged: u64,
    /// Packets lost in transit
    pub lost_packets: u64,
    /// Timeouts the sender observed
    pub lost_acks: u64,
}

impl Counters {
    /// Check if no impairment was observed
    pub fn is_clean(&self) -> bool {
        *self == Counters::default()
    }
}

impl AddAssign for Counters {
    fn add_assign(&mut self, rhs: Counters) {
        self.corrupted += rhs.corrupted;
        self.misjudged += rhs.misjudged;
        self.lost_packets += rhs.lost_packets;
        self.lost_acks += rhs.lost_acks;
    }
}

/// Result of one simulation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Final counters
    pub counters: Counters,
    /// Transmissions, including retransmissions
    pub packets_sent: u64,
    /// Sender steps taken
    pub steps: u64,
    /// Packets the payload was segmented into
    pub sequence_count: usize,
}

impl RunReport {
    /// Transmissions beyond the first one per packet
    pub fn retransmissions(&self) -> u64 {
        self.packets_sent.saturating_sub(self.sequence_count as u64)
    }
}
