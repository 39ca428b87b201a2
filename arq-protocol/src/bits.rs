//! Fixed-length bit buffers
//!
//! Packets travel through the simulated medium as raw bit strings. Bit `i` of
//! a buffer is bit `i % 8` of byte `i / 8` (least-significant bit first), which
//! is the layout a byte payload gets when it is segmented into packets.
//!
//! A buffer never grows or shrinks in place: appending a verification field or
//! stripping one produces a new buffer.

use bitvec::prelude::*;
use std::fmt;
use std::ops::Index;

/// Fixed-length sequence of bits
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct BitBuffer(BitVec<u8, Lsb0>);

impl BitBuffer {
    /// Create a buffer holding every bit of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Self {
        BitBuffer(BitVec::from_slice(bytes))
    }

    /// Create a buffer of `len` cleared bits
    pub fn zeroed(len: usize) -> Self {
        BitBuffer(BitVec::repeat(false, len))
    }

    /// Create a buffer from individual bits, in order
    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        BitBuffer(bits.into_iter().collect())
    }

    /// Number of bits
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the buffer holds no bits
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read a bit, or `None` past the end
    #[inline]
    pub fn get(&self, index: usize) -> Option<bool> {
        self.0.get(index).map(|bit| *bit)
    }

    /// Write a bit
    ///
    /// # Panics
    /// Panics if `index` is out of bounds
    #[inline]
    pub fn set(&mut self, index: usize, value: bool) {
        self.0.set(index, value);
    }

    /// Invert a bit
    ///
    /// # Panics
    /// Panics if `index` is out of bounds
    #[inline]
    pub fn flip(&mut self, index: usize) {
        let current = self.0[index];
        self.0.set(index, !current);
    }

    /// Number of set bits
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.0.count_ones()
    }

    /// Iterate over the bits in order
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().by_vals()
    }

    /// Build a new buffer holding `self` followed by `other`
    pub fn concat(&self, other: &BitBuffer) -> BitBuffer {
        let mut joined = BitVec::with_capacity(self.len() + other.len());
        joined.extend_from_bitslice(&self.0);
        joined.extend_from_bitslice(&other.0);
        BitBuffer(joined)
    }

    /// Split into the first `mid` bits and the rest
    ///
    /// # Panics
    /// Panics if `mid > len`
    pub fn split_at(&self, mid: usize) -> (BitBuffer, BitBuffer) {
        let (head, tail) = self.0.split_at(mid);
        (BitBuffer(head.to_bitvec()), BitBuffer(tail.to_bitvec()))
    }

    /// Number of positions where the two buffers differ
    ///
    /// Bits present in only one of the buffers count as differing.
    pub fn differing_bits(&self, other: &BitBuffer) -> usize {
        let overlap = self
            .iter()
            .zip(other.iter())
            .filter(|(a, b)| a != b)
            .count();
        overlap + self.len().abs_diff(other.len())
    }

    /// Pack the bits into bytes
    ///
    /// A trailing partial byte is zero-padded in its high bits.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .by_vals()
                    .enumerate()
                    .fold(0u8, |byte, (shift, bit)| byte | (u8::from(bit) << shift))
            })
            .collect()
    }
}

impl Index<usize> for BitBuffer {
    type Output = bool;

    fn index(&self, index: usize) -> &bool {
        &self.0[index]
    }
}

impl FromIterator<bool> for BitBuffer {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        BitBuffer::from_bits(iter)
    }
}

/// Digit string, e.g. `10110000`
///
/// The alternate form (`{:#}`) separates each byte with a space.
impl fmt::Display for BitBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, bit) in self.iter().enumerate() {
            if f.alternate() && i > 0 && i % 8 == 0 {
                f.write_str(" ")?;
            }
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitBuffer({}: {:#})", self.len(), self)
    }
}
