//! SHA-256 checksum computation for WAL envelopes
//!
//! The checksum covers the envelope header and payload. It is stored as a
//! fixed 32-byte trailer.

use sha2::{Digest, Sha256};

/// Width of the checksum trailer in bytes.
pub const CHECKSUM_SIZE: usize = 32;

/// A SHA-256 digest.
pub type Checksum = [u8; CHECKSUM_SIZE];

/// Computes a SHA-256 checksum over the provided data.
pub fn compute_checksum(data: &[u8]) -> Checksum {
    Sha256::digest(data).into()
}

/// Verifies that the computed checksum matches the expected checksum.
pub fn verify_checksum(data: &[u8], expected: &Checksum) -> bool {
    compute_checksum(data) == *expected
}

/// Lowercase hex rendering used in error messages.
pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_deterministic() {
        let data = b"hello wal";
        assert_eq!(compute_checksum(data), compute_checksum(data));
    }

    #[test]
    fn test_known_digest() {
        // SHA-256("abc")
        assert_eq!(
            to_hex(&compute_checksum(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_checksum_detects_single_bit_flip() {
        let mut data = vec![0x00, 0x01, 0x02, 0x03, 0x04];
        let original = compute_checksum(&data);
        data[2] ^= 0x01;
        assert_ne!(original, compute_checksum(&data));
    }

    #[test]
    fn test_verify_checksum() {
        let data = b"payload to verify";
        let mut checksum = compute_checksum(data);
        assert!(verify_checksum(data, &checksum));
        checksum[0] ^= 0x80;
        assert!(!verify_checksum(data, &checksum));
    }
}
