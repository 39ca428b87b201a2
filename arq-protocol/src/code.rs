//! Error-detecting codes
//!
//! Each code appends a verification field to a packet before it enters the
//! medium and checks that field on arrival. Codes only detect; they never
//! correct. A corrupted packet that happens to satisfy its field passes
//! `verify`, and it is up to the caller to count that as a misjudgment.

use crate::bits::BitBuffer;
use crc::{Crc, CRC_16_ARC, CRC_32_ISO_HDLC, CRC_8_SMBUS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Verification-field code
pub trait ErrorCode: fmt::Display {
    /// Width in bits of the appended field
    fn field_width(&self) -> usize;

    /// Append the verification field, returning payload + field
    fn encode(&self, payload: &BitBuffer) -> BitBuffer;

    /// Recompute the field over the data portion and compare to the trailing field
    ///
    /// Inputs too short to hold the field never verify.
    fn verify(&self, received: &BitBuffer) -> bool;
}

/// Split a received buffer into data and trailing field
fn split_field(received: &BitBuffer, width: usize) -> Option<(BitBuffer, BitBuffer)> {
    if received.len() < width {
        return None;
    }
    Some(received.split_at(received.len() - width))
}

/// Single even-parity bit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Parity;

impl Parity {
    fn parity_of(bits: &BitBuffer) -> bool {
        bits.count_ones() % 2 == 1
    }
}

impl ErrorCode for Parity {
    fn field_width(&self) -> usize {
        1
    }

    fn encode(&self, payload: &BitBuffer) -> BitBuffer {
        payload.concat(&BitBuffer::from_bits([Self::parity_of(payload)]))
    }

    fn verify(&self, received: &BitBuffer) -> bool {
        match split_field(received, 1) {
            Some((data, field)) => Self::parity_of(&data) == field[0],
            None => false,
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("bit parity checksum")
    }
}

/// Count of set bits, written in binary
///
/// The field is wide enough to hold the largest count a full packet can
/// produce: `floor(log2(8 * packet_size)) + 1` bits, most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSum {
    width: usize,
}

impl BitSum {
    /// Create a bit-sum code sized for packets of `packet_size` bytes
    pub fn new(packet_size: usize) -> Self {
        let max_count = packet_size.max(1) * 8;
        BitSum {
            width: (usize::BITS - max_count.leading_zeros()) as usize,
        }
    }

    fn field_for(&self, count: usize) -> BitBuffer {
        (0..self.width)
            .rev()
            .map(|shift| (count >> shift) & 1 == 1)
            .collect()
    }
}

impl ErrorCode for BitSum {
    fn field_width(&self) -> usize {
        self.width
    }

    fn encode(&self, payload: &BitBuffer) -> BitBuffer {
        payload.concat(&self.field_for(payload.count_ones()))
    }

    fn verify(&self, received: &BitBuffer) -> bool {
        match split_field(received, self.width) {
            Some((data, field)) => self.field_for(data.count_ones()) == field,
            None => false,
        }
    }
}

impl fmt::Display for BitSum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bit '1' sum with length: {}", self.width)
    }
}

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Named CRC polynomial profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrcProfile {
    /// CRC-8/SMBUS (poly 0x07)
    Crc8,
    /// CRC-16/ARC (poly 0x8005, reflected)
    Crc16,
    /// CRC-32/ISO-HDLC (poly 0x04C11DB7, reflected)
    Crc32,
}

impl CrcProfile {
    /// Checksum width in bits
    pub fn width(self) -> usize {
        match self {
            CrcProfile::Crc8 => 8,
            CrcProfile::Crc16 => 16,
            CrcProfile::Crc32 => 32,
        }
    }

    /// Compute the checksum over `bytes`
    pub fn checksum(self, bytes: &[u8]) -> u64 {
        match self {
            CrcProfile::Crc8 => u64::from(CRC8.checksum(bytes)),
            CrcProfile::Crc16 => u64::from(CRC16.checksum(bytes)),
            CrcProfile::Crc32 => u64::from(CRC32.checksum(bytes)),
        }
    }
}

/// Cyclic redundancy check over the byte-aligned payload
///
/// The checksum is appended little-endian, least significant bit first, so
/// its bytes land in the buffer the same way payload bytes do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclicRedundancy {
    profile: CrcProfile,
}

impl CyclicRedundancy {
    /// Create a CRC code for the given profile
    pub fn new(profile: CrcProfile) -> Self {
        CyclicRedundancy { profile }
    }

    fn field_for(&self, data: &BitBuffer) -> BitBuffer {
        let hash = self.profile.checksum(&data.to_bytes());
        (0..self.profile.width())
            .map(|shift| (hash >> shift) & 1 == 1)
            .collect()
    }
}

impl ErrorCode for CyclicRedundancy {
    fn field_width(&self) -> usize {
        self.profile.width()
    }

    fn encode(&self, payload: &BitBuffer) -> BitBuffer {
        payload.concat(&self.field_for(payload))
    }

    fn verify(&self, received: &BitBuffer) -> bool {
        match split_field(received, self.profile.width()) {
            Some((data, field)) => self.field_for(&data) == field,
            None => false,
        }
    }
}

impl fmt::Display for CyclicRedundancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cyclic redundancy check: {} bits", self.profile.width())
    }
}

/// Error parsing a code name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown error code '{0}' (expected parity, bit-sum, crc8, crc16 or crc32)")]
pub struct ParseCodeKindError(String);

/// Selector for the error-detecting code a simulation uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeKind {
    #[default]
    Parity,
    BitSum,
    Crc8,
    Crc16,
    Crc32,
}

impl CodeKind {
    /// Build the code for packets of `packet_size` bytes
    pub fn build(self, packet_size: usize) -> Box<dyn ErrorCode> {
        match self {
            CodeKind::Parity => Box::new(Parity),
            CodeKind::BitSum => Box::new(BitSum::new(packet_size)),
            CodeKind::Crc8 => Box::new(CyclicRedundancy::new(CrcProfile::Crc8)),
            CodeKind::Crc16 => Box::new(CyclicRedundancy::new(CrcProfile::Crc16)),
            CodeKind::Crc32 => Box::new(CyclicRedundancy::new(CrcProfile::Crc32)),
        }
    }

    /// Every selectable code
    pub fn all() -> [CodeKind; 5] {
        [
            CodeKind::Parity,
            CodeKind::BitSum,
            CodeKind::Crc8,
            CodeKind::Crc16,
            CodeKind::Crc32,
        ]
    }
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodeKind::Parity => "parity",
            CodeKind::BitSum => "bit-sum",
            CodeKind::Crc8 => "crc8",
            CodeKind::Crc16 => "crc16",
            CodeKind::Crc32 => "crc32",
        };
        f.write_str(name)
    }
}

impl FromStr for CodeKind {
    type Err = ParseCodeKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "parity" => Ok(CodeKind::Parity),
            "bit-sum" | "bitsum" => Ok(CodeKind::BitSum),
            "crc8" | "crc-8" => Ok(CodeKind::Crc8),
            "crc16" | "crc-16" => Ok(CodeKind::Crc16),
            "crc32" | "crc-32" => Ok(CodeKind::Crc32),
            _ => Err(ParseCodeKindError(s.to_string())),
        }
    }
}
