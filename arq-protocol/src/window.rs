//! Go-Back-N sender window
//!
//! Holds the packets currently in flight, oldest first, and the sequence
//! cursor. The cursor always runs exactly `size` positions ahead of the
//! oldest unacknowledged index, including at the tail of the transfer where
//! fewer than `size` packets remain to be sent.

use crate::packet::Packet;
use std::collections::VecDeque;

/// Sliding window state
#[derive(Debug, Clone)]
pub struct Window {
    /// Maximum packets in flight
    size: usize,
    /// In-flight packets in sequence order
    in_flight: VecDeque<Packet>,
    /// Next sequence index the sender would transmit
    cursor: usize,
}

impl Window {
    /// Create an empty window
    pub fn new(size: usize) -> Self {
        Window {
            size,
            in_flight: VecDeque::with_capacity(size),
            cursor: 0,
        }
    }

    /// Get the window size
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the sequence cursor
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Index of the oldest unacknowledged packet
    ///
    /// Only meaningful once the first window has been sent.
    #[inline]
    pub fn base(&self) -> usize {
        self.cursor.saturating_sub(self.size)
    }

    /// Number of packets in flight
    #[inline]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Check if nothing is in flight
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Enqueue a packet at the trailing edge and advance the cursor
    pub fn push(&mut self, packet: Packet) {
        debug_assert!(
            self.in_flight.len() < self.size,
            "window of {} overfilled",
            self.size
        );
        self.in_flight.push_back(packet);
        self.cursor += 1;
    }

    /// Advance the cursor without sending
    pub fn advance(&mut self, count: usize) {
        self.cursor += count;
    }

    /// Take the oldest in-flight packet
    pub fn pop_front(&mut self) -> Option<Packet> {
        self.in_flight.pop_front()
    }

    /// Discard everything in flight and step the cursor back one window
    ///
    /// Returns the index transmission restarts from.
    pub fn rewind(&mut self) -> usize {
        self.in_flight.clear();
        self.cursor -= self.size;
        self.cursor
    }

    /// Return to the state before the first send
    pub fn reset(&mut self) {
        self.in_flight.clear();
        self.cursor = 0;
    }
}
