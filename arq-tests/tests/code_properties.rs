//! Property-based tests for the error-detecting codes
//!
//! These tests use proptest to generate random payloads and check that every
//! code accepts what it encoded, and that single-bit errors never slip past.

use arq_protocol::{BitBuffer, BitSum, CodeKind, ErrorCode, Parity};
use proptest::prelude::*;

// Property test strategies

fn code_kind_strategy() -> impl Strategy<Value = CodeKind> {
    prop_oneof![
        Just(CodeKind::Parity),
        Just(CodeKind::BitSum),
        Just(CodeKind::Crc8),
        Just(CodeKind::Crc16),
        Just(CodeKind::Crc32),
    ]
}

fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=32)
}

proptest! {
    #[test]
    fn prop_encoded_packets_verify(kind in code_kind_strategy(), payload in payload_strategy()) {
        let code = kind.build(payload.len());
        let data = BitBuffer::from_bytes(&payload);
        let encoded = code.encode(&data);

        prop_assert_eq!(encoded.len(), data.len() + code.field_width());
        prop_assert!(code.verify(&encoded));

        // the data bits travel unchanged in front of the field
        let (front, _) = encoded.split_at(data.len());
        prop_assert_eq!(front, data);
    }

    #[test]
    fn prop_single_flip_detected(
        kind in code_kind_strategy(),
        payload in payload_strategy(),
        position in any::<prop::sample::Index>(),
    ) {
        let code = kind.build(payload.len());
        let mut encoded = code.encode(&BitBuffer::from_bytes(&payload));
        let position = position.index(encoded.len());
        encoded.flip(position);
        prop_assert!(!code.verify(&encoded));
    }

    #[test]
    fn prop_bit_sum_passes_same_weight_swaps(
        payload in payload_strategy(),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let code = BitSum::new(payload.len());
        let data = BitBuffer::from_bytes(&payload);
        let mut encoded = code.encode(&data);

        let a = a.index(data.len());
        let b = b.index(data.len());
        let (bit_a, bit_b) = (encoded[a], encoded[b]);
        encoded.set(a, bit_b);
        encoded.set(b, bit_a);

        prop_assert!(code.verify(&encoded));
    }
}

#[test]
fn test_parity_detects_every_single_flip() {
    for len in [1, 2, 4, 7] {
        let payload: Vec<u8> = (0..len).map(|i| 0x5A ^ (i as u8).wrapping_mul(37)).collect();
        let encoded = Parity.encode(&BitBuffer::from_bytes(&payload));
        for position in 0..encoded.len() {
            let mut received = encoded.clone();
            received.flip(position);
            assert!(
                !Parity.verify(&received),
                "parity missed flip at {} of {} bytes",
                position,
                len
            );
        }
    }
}

#[test]
fn test_bit_sum_detects_every_single_flip() {
    for len in [1, 2, 4, 7] {
        let payload: Vec<u8> = (0..len).map(|i| 0xC3 ^ (i as u8).wrapping_mul(91)).collect();
        let code = BitSum::new(len);
        let encoded = code.encode(&BitBuffer::from_bytes(&payload));
        for position in 0..encoded.len() {
            let mut received = encoded.clone();
            received.flip(position);
            assert!(
                !code.verify(&received),
                "bit sum missed flip at {} of {} bytes",
                position,
                len
            );
        }
    }
}

#[test]
fn test_parity_misses_double_flip() {
    let encoded = Parity.encode(&BitBuffer::from_bytes(&[0b1010_0110]));
    let mut received = encoded.clone();
    received.flip(0);
    received.flip(5);
    assert!(Parity.verify(&received));
}

#[test]
fn test_field_widths() {
    let widths: Vec<usize> = CodeKind::all()
        .iter()
        .map(|kind| kind.build(4).field_width())
        .collect();
    // bit sum over 4 bytes counts up to 32, which takes 6 bits
    assert_eq!(widths, vec![1, 6, 8, 16, 32]);
}

#[test]
fn test_too_short_input_rejected() {
    for kind in CodeKind::all() {
        let code = kind.build(4);
        let short = BitBuffer::zeroed(code.field_width() - 1);
        assert!(!code.verify(&short), "{} accepted a truncated packet", kind);
    }
}
