//! WAL record envelope
//!
//! Each record is persisted as one object with the layout (big-endian):
//!
//! | bytes         | field                               |
//! |---------------|-------------------------------------|
//! | 0..8          | offset (u64)                        |
//! | 8..8+N        | payload (N bytes)                   |
//! | 8+N..8+N+32   | SHA-256 over bytes [0, 8+N)         |
//!
//! The envelope is immutable once written.

use super::checksum::{compute_checksum, to_hex, verify_checksum, Checksum, CHECKSUM_SIZE};
use super::errors::{WalError, WalResult};

/// Width of the offset header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Width of the checksum trailer in bytes.
pub const TRAILER_SIZE: usize = CHECKSUM_SIZE;

/// Smallest valid envelope: header and trailer around an empty payload.
pub const MIN_ENVELOPE_SIZE: usize = HEADER_SIZE + TRAILER_SIZE;

/// A log record: a 1-based offset and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub offset: u64,
    pub payload: Vec<u8>,
}

impl Record {
    /// Create a new record
    pub fn new(offset: u64, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            payload: payload.into(),
        }
    }
}

/// Borrowed view of an envelope split into its fixed-width fields.
struct Envelope<'a> {
    /// Header and payload: the bytes the trailer covers.
    covered: &'a [u8],
    header: &'a [u8; HEADER_SIZE],
    payload: &'a [u8],
    trailer: &'a Checksum,
}

impl<'a> Envelope<'a> {
    fn split(bytes: &'a [u8]) -> WalResult<Self> {
        let short = || WalError::ShortRecord {
            len: bytes.len(),
            min: MIN_ENVELOPE_SIZE,
        };
        if bytes.len() < MIN_ENVELOPE_SIZE {
            return Err(short());
        }

        let (covered, trailer) = bytes.split_at(bytes.len() - TRAILER_SIZE);
        let (header, payload) = covered.split_at(HEADER_SIZE);

        Ok(Self {
            covered,
            header: header.try_into().map_err(|_| short())?,
            payload,
            trailer: trailer.try_into().map_err(|_| short())?,
        })
    }

    fn offset(&self) -> u64 {
        u64::from_be_bytes(*self.header)
    }
}

/// Encode `payload` at `offset` into a checksummed envelope.
pub fn encode(offset: u64, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len() + TRAILER_SIZE);
    buf.extend_from_slice(&offset.to_be_bytes());
    buf.extend_from_slice(payload);

    let checksum = compute_checksum(&buf);
    buf.extend_from_slice(&checksum);
    buf
}

/// Decode an envelope, verifying its checksum trailer.
///
/// # Errors
///
/// - `ShortRecord` if the envelope is shorter than [`MIN_ENVELOPE_SIZE`]
/// - `ChecksumMismatch` if the trailer does not match header and payload
pub fn decode(envelope: &[u8]) -> WalResult<Record> {
    let fields = Envelope::split(envelope)?;

    if !verify_checksum(fields.covered, fields.trailer) {
        return Err(WalError::ChecksumMismatch {
            computed: to_hex(&compute_checksum(fields.covered)),
            stored: to_hex(fields.trailer),
        });
    }

    Ok(Record {
        offset: fields.offset(),
        payload: fields.payload.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let body = encode(7, b"entry");

        assert_eq!(body.len(), HEADER_SIZE + 5 + TRAILER_SIZE);
        assert_eq!(&body[..HEADER_SIZE], &7u64.to_be_bytes());
        assert_eq!(&body[HEADER_SIZE..HEADER_SIZE + 5], b"entry");
        assert_eq!(
            &body[HEADER_SIZE + 5..],
            &compute_checksum(&body[..HEADER_SIZE + 5])
        );
    }

    #[test]
    fn test_round_trip() {
        for (offset, payload) in [
            (1u64, Vec::new()),
            (2, b"a".to_vec()),
            (u64::MAX, vec![0xff; 4096]),
            (36, vec![0u8; 36]),
        ] {
            let record = decode(&encode(offset, &payload)).unwrap();
            assert_eq!(record, Record::new(offset, payload));
        }
    }

    #[test]
    fn test_mismatch_reports_both_digests() {
        let mut body = encode(3, b"payload");
        let last = body.len() - 1;
        body[last] ^= 0x01;

        match decode(&body).unwrap_err() {
            WalError::ChecksumMismatch { computed, stored } => {
                assert_eq!(computed, to_hex(&compute_checksum(&body[..HEADER_SIZE + 7])));
                assert_eq!(stored, to_hex(&body[HEADER_SIZE + 7..]));
                assert_ne!(computed, stored);
            }
            other => panic!("expected ChecksumMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_payload_is_minimum_size() {
        let body = encode(1, &[]);
        assert_eq!(body.len(), MIN_ENVELOPE_SIZE);
        assert_eq!(MIN_ENVELOPE_SIZE, 40);
        assert_eq!(decode(&body).unwrap().payload, Vec::<u8>::new());
    }

    #[test]
    fn test_short_record() {
        for len in [0, 1, HEADER_SIZE, MIN_ENVELOPE_SIZE - 1] {
            let err = decode(&vec![0u8; len]).unwrap_err();
            assert!(
                matches!(err, WalError::ShortRecord { len: l, min: 40 } if l == len),
                "len {} gave {:?}",
                len,
                err
            );
        }
    }

    #[test]
    fn test_every_single_bit_flip_is_detected() {
        let body = encode(11, b"payload");
        for byte in 0..body.len() {
            for bit in 0..8 {
                let mut tampered = body.clone();
                tampered[byte] ^= 1 << bit;
                let err = decode(&tampered).unwrap_err();
                assert!(
                    matches!(err, WalError::ChecksumMismatch { .. }),
                    "flip at byte {} bit {} gave {:?}",
                    byte,
                    bit,
                    err
                );
            }
        }
    }

    #[test]
    fn test_truncated_trailer_fails() {
        let mut body = encode(5, b"some payload bytes");
        body.truncate(body.len() - 4);
        assert!(matches!(
            decode(&body),
            Err(WalError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_appended_bytes_fail() {
        let mut body = encode(5, b"payload");
        body.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            decode(&body),
            Err(WalError::ChecksumMismatch { .. })
        ));
    }
}
