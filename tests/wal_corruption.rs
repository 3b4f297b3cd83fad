//! Corruption Detection Tests
//!
//! - Any bit flip in a stored envelope is detected
//! - Truncated objects fail with ShortRecord
//! - A valid envelope stored under the wrong key fails with OffsetMismatch
//! - Malformed keys under the prefix fail tail discovery
//! - Corruption is never skipped, by reads or by replay

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use s3wal::cancel::Cancellation;
use s3wal::store::{BucketStore, LocalStore, MemoryStore};
use s3wal::wal::{encode, Severity, Wal, WalError, MIN_ENVELOPE_SIZE};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

const BUCKET: &str = "test-bucket";
const PREFIX: &str = "wal";

async fn populated(payloads: &[&str]) -> (Arc<MemoryStore>, Wal) {
    let store = Arc::new(MemoryStore::with_bucket(BUCKET));
    let wal = Wal::new(store.clone(), BUCKET, PREFIX);
    let cancel = Cancellation::new();
    for payload in payloads {
        wal.append(&cancel, payload.as_bytes()).await.unwrap();
    }
    (store, wal)
}

async fn raw_object(store: &MemoryStore, wal: &Wal, offset: u64) -> Vec<u8> {
    store
        .get(&Cancellation::new(), BUCKET, &wal.keys().encode(offset))
        .await
        .unwrap()
}

// =============================================================================
// Checksum
// =============================================================================

#[tokio::test]
async fn test_tampered_payload_detected() {
    let (store, wal) = populated(&["hello"]).await;
    let mut data = raw_object(&store, &wal, 1).await;
    data[8] ^= 0x01;
    store
        .overwrite(BUCKET, &wal.keys().encode(1), data)
        .await
        .unwrap();

    let err = wal.read(&Cancellation::new(), 1).await.unwrap_err();
    assert!(matches!(err, WalError::ChecksumMismatch { .. }));
    assert_eq!(err.severity(), Severity::Fatal);
    assert_eq!(err.code(), "S3WAL_CHECKSUM_MISMATCH");
}

#[tokio::test]
async fn test_random_bit_flips_detected() {
    let (store, wal) = populated(&[]).await;
    let cancel = Cancellation::new();
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..64 {
        let mut payload = vec![0u8; rng.gen_range(0..256)];
        rng.fill(&mut payload[..]);
        let offset = wal.append(&cancel, &payload).await.unwrap();
        let key = wal.keys().encode(offset);

        let mut data = raw_object(&store, &wal, offset).await;
        let bit = rng.gen_range(0..data.len() * 8);
        data[bit / 8] ^= 1 << (bit % 8);
        store.overwrite(BUCKET, &key, data).await.unwrap();

        let err = wal.read(&cancel, offset).await.unwrap_err();
        assert!(err.is_corruption(), "bit {} of offset {} undetected", bit, offset);
        assert!(err.is_fatal());
    }
}

#[tokio::test]
async fn test_header_flip_is_checksum_not_offset_mismatch() {
    let (store, wal) = populated(&["a"]).await;
    let mut data = raw_object(&store, &wal, 1).await;
    data[7] ^= 0x02;
    store
        .overwrite(BUCKET, &wal.keys().encode(1), data)
        .await
        .unwrap();

    // The trailer covers the header, so integrity fails before the key check.
    let err = wal.read(&Cancellation::new(), 1).await.unwrap_err();
    assert!(matches!(err, WalError::ChecksumMismatch { .. }));
}

// =============================================================================
// Short Records
// =============================================================================

#[tokio::test]
async fn test_truncated_object_is_short_record() {
    let (store, wal) = populated(&["payload"]).await;
    let data = raw_object(&store, &wal, 1).await;
    store
        .overwrite(BUCKET, &wal.keys().encode(1), data[..MIN_ENVELOPE_SIZE - 1].to_vec())
        .await
        .unwrap();

    let err = wal.read(&Cancellation::new(), 1).await.unwrap_err();
    match err {
        WalError::ShortRecord { len, min } => {
            assert_eq!(len, MIN_ENVELOPE_SIZE - 1);
            assert_eq!(min, MIN_ENVELOPE_SIZE);
        }
        other => panic!("expected ShortRecord, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_object_is_short_record() {
    let (store, wal) = populated(&["a"]).await;
    store
        .overwrite(BUCKET, &wal.keys().encode(1), Vec::new())
        .await
        .unwrap();

    let err = wal.read(&Cancellation::new(), 1).await.unwrap_err();
    assert!(matches!(err, WalError::ShortRecord { len: 0, .. }));
}

// =============================================================================
// Offset Mismatch
// =============================================================================

#[tokio::test]
async fn test_envelope_under_wrong_key() {
    let (store, wal) = populated(&["a", "b", "c"]).await;

    // Well-formed envelope for offset 7, stored at offset 3.
    store
        .overwrite(BUCKET, &wal.keys().encode(3), encode(7, b"misplaced"))
        .await
        .unwrap();

    let err = wal.read(&Cancellation::new(), 3).await.unwrap_err();
    match err {
        WalError::OffsetMismatch { expected, found } => {
            assert_eq!(expected, 3);
            assert_eq!(found, 7);
        }
        other => panic!("expected OffsetMismatch, got {:?}", other),
    }
}

// =============================================================================
// Tail Discovery
// =============================================================================

#[tokio::test]
async fn test_malformed_key_fails_tail_discovery() {
    let (store, wal) = populated(&["a"]).await;
    store
        .overwrite(BUCKET, "wal/garbage", b"x".to_vec())
        .await
        .unwrap();

    let err = wal.last_record(&Cancellation::new()).await.unwrap_err();
    match &err {
        WalError::ParseError { key, .. } => assert_eq!(key, "wal/garbage"),
        other => panic!("expected ParseError, got {:?}", other),
    }
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn test_corrupt_tail_still_refreshes_cursor() {
    let (store, writer) = populated(&["a", "b"]).await;
    let mut data = raw_object(&store, &writer, 2).await;
    let last = data.len() - 1;
    data[last] ^= 0xff;
    store
        .overwrite(BUCKET, &writer.keys().encode(2), data)
        .await
        .unwrap();

    let wal = Wal::new(store.clone(), BUCKET, PREFIX);
    let cancel = Cancellation::new();
    let err = wal.last_record(&cancel).await.unwrap_err();
    assert!(matches!(err, WalError::ChecksumMismatch { .. }));

    // The corrupt offset is not reused.
    assert_eq!(wal.last_offset().await, 2);
    assert_eq!(wal.append(&cancel, b"c").await.unwrap(), 3);
}

#[tokio::test]
async fn test_open_fails_on_corrupt_tail() {
    let (store, wal) = populated(&["a"]).await;
    store
        .overwrite(BUCKET, &wal.keys().encode(1), vec![0u8; 12])
        .await
        .unwrap();

    let err = Wal::open(store, BUCKET, PREFIX, &Cancellation::new())
        .await
        .unwrap_err();
    assert!(matches!(err, WalError::ShortRecord { len: 12, .. }));
}

// =============================================================================
// Replay
// =============================================================================

#[tokio::test]
async fn test_replay_surfaces_corruption() {
    let (store, wal) = populated(&["a", "b", "c"]).await;
    store
        .overwrite(BUCKET, &wal.keys().encode(2), encode(9, b"b"))
        .await
        .unwrap();

    let cancel = Cancellation::new();
    let mut reader = wal.reader(1);
    assert_eq!(reader.read_next(&cancel).await.unwrap().unwrap().offset, 1);

    // The reader stays on the bad offset instead of skipping past it.
    for _ in 0..2 {
        let err = reader.read_next(&cancel).await.unwrap_err();
        assert!(matches!(err, WalError::OffsetMismatch { expected: 2, found: 9 }));
        assert_eq!(reader.next_offset(), Some(2));
    }
}

// =============================================================================
// Local Filesystem Backend
// =============================================================================

#[tokio::test]
async fn test_corrupt_file_on_local_store() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(LocalStore::new(temp.path().to_path_buf()));
    let wal = Wal::new(store, BUCKET, PREFIX);
    let cancel = Cancellation::new();
    wal.append(&cancel, b"durable").await.unwrap();

    let path = temp.path().join(BUCKET).join("wal/00000000000000000001");
    let mut data = std::fs::read(&path).unwrap();
    data[10] ^= 0x80;
    std::fs::write(&path, data).unwrap();

    let err = wal.read(&cancel, 1).await.unwrap_err();
    assert!(matches!(err, WalError::ChecksumMismatch { .. }));
}
