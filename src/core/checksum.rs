//! Payload checksum.
//!
//! The digest is the number of set bits across the whole fixed-size payload
//! buffer. Zero padding contributes nothing, so the full buffer and its
//! logical prefix give the same value. It catches incidental corruption only.

/// Count the set bits in `payload`.
///
/// Callers pass the full payload buffer; see [`crate::frame::Payload`].
pub fn checksum(payload: &[u8]) -> u32 {
    payload.iter().map(|byte| byte.count_ones()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::PAYLOAD_SIZE;
    use proptest::prelude::*;

    #[test]
    fn test_empty_and_zero_buffers() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0u8; PAYLOAD_SIZE]), 0);
    }

    #[test]
    fn test_known_values() {
        assert_eq!(checksum(b"HELLO"), 2 + 3 + 3 + 3 + 5);
        assert_eq!(checksum(&[0xFF; PAYLOAD_SIZE]), 8 * PAYLOAD_SIZE as u32);
    }

    #[test]
    fn test_padding_does_not_contribute() {
        let mut buf = [0u8; PAYLOAD_SIZE];
        buf[..5].copy_from_slice(b"HELLO");
        assert_eq!(checksum(&buf), checksum(b"HELLO"));
    }

    proptest! {
        #[test]
        fn prop_deterministic(data in proptest::collection::vec(any::<u8>(), 0..PAYLOAD_SIZE)) {
            prop_assert_eq!(checksum(&data), checksum(&data));
        }

        #[test]
        fn prop_single_bit_flip_detected(
            data in proptest::collection::vec(any::<u8>(), 1..PAYLOAD_SIZE),
            index in any::<proptest::sample::Index>(),
            bit in 0u8..8,
        ) {
            let mut flipped = data.clone();
            let i = index.index(flipped.len());
            flipped[i] ^= 1 << bit;
            prop_assert_eq!(checksum(&data).abs_diff(checksum(&flipped)), 1);
        }
    }
}
