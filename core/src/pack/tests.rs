//! Tests for data pack replication

#![cfg(test)]

use super::*;
use crate::test_utils::noise;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// Pump chunks from `auth` to `viewer` until the authority has nothing left
/// to send, returning the last payload the viewer completed.
///
/// `lose` decides per chunk and per ack whether it gets dropped.
fn transfer(
    auth: &mut DataPack,
    viewer: &mut DataPack,
    mut lose: impl FnMut() -> bool,
) -> Option<Replicated> {
    let mut completed = None;
    for _ in 0..1000 {
        let Some((header, bytes)) = auth.pending_chunk() else {
            return completed;
        };
        let bytes = bytes.to_vec();
        if lose() {
            continue;
        }
        let Some(receipt) = viewer.on_chunk_received(header, &bytes) else {
            continue;
        };
        if !lose() {
            auth.on_chunk_ack(receipt.ack_version, receipt.ack_offset);
        }
        if receipt.completed {
            completed = viewer.replicated_payload();
        }
    }
    completed
}

#[test]
fn test_unchanged_payload_is_not_replicated_twice() {
    let mut pack = DataPack::new(DataPackPolicy::ResetOnTick);
    assert!(pack.request_replication(b"hello".to_vec(), 0));
    assert_eq!(pack.header.version, 1);

    assert!(!pack.request_replication(b"hello".to_vec(), 0));
    assert_eq!(pack.header.version, 1);

    pack.mark_dirty();
    assert!(pack.request_replication(b"hello".to_vec(), 0));
    assert_eq!(pack.header.version, 2);
    assert!(!pack.is_dirty());
}

#[test]
fn test_fresh_pack_with_empty_payload_sends_nothing() {
    let mut pack = DataPack::new(DataPackPolicy::Persistent);
    assert!(!pack.request_replication(Vec::new(), 0));
    assert!(pack.pending_chunk().is_none());
}

#[test]
fn test_small_payload_single_chunk() {
    let mut auth = DataPack::new(DataPackPolicy::ResetOnTick);
    let mut viewer = DataPack::new(DataPackPolicy::ResetOnTick);

    let payload = b"{green}path ok".to_vec();
    assert!(auth.request_replication(payload.clone(), 3));
    assert!(!auth.header.compressed);
    assert!(!auth.is_multi_packet());

    let result = transfer(&mut auth, &mut viewer, || false);
    assert_eq!(result, Some(Replicated::Apply(payload)));
    assert!(auth.is_received());
    assert_eq!(viewer.header.sync_counter, 3);
    assert!((viewer.progress() - 1.0).abs() < f32::EPSILON);
}

#[test]
fn test_large_payload_is_compressed_and_chunked() {
    let mut auth = DataPack::new(DataPackPolicy::ResetOnTick);
    let mut viewer = DataPack::new(DataPackPolicy::ResetOnTick);

    let payload = noise(2000, 1);
    assert!(auth.request_replication(payload.clone(), 0));
    assert!(auth.header.compressed);
    assert!(auth.is_multi_packet());

    let (first, bytes) = auth.pending_chunk().unwrap();
    assert_eq!(first.offset, 0);
    assert_eq!(bytes.len(), DEFAULT_PACKET_SIZE);

    let result = transfer(&mut auth, &mut viewer, || false);
    assert_eq!(result, Some(Replicated::Apply(payload)));
}

#[test]
fn test_compressible_payload_fits_one_chunk() {
    let mut pack = DataPack::new(DataPackPolicy::ResetOnTick);
    assert!(pack.request_replication(vec![7u8; 4096], 0));
    assert!(pack.header.compressed);
    assert!(!pack.is_multi_packet());
}

#[test]
fn test_new_data_waits_for_multi_chunk_confirmation() {
    let mut auth = DataPack::new(DataPackPolicy::ResetOnTick);
    let mut viewer = DataPack::new(DataPackPolicy::ResetOnTick);

    assert!(auth.request_replication(noise(1500, 2), 0));
    assert!(!auth.request_replication(noise(1500, 3), 0));
    assert_eq!(auth.header.version, 1);

    transfer(&mut auth, &mut viewer, || false).unwrap();
    assert!(auth.request_replication(noise(1500, 3), 0));
    assert_eq!(auth.header.version, 2);
}

#[test]
fn test_single_chunk_update_supersedes_unconfirmed_one() {
    let mut pack = DataPack::new(DataPackPolicy::ResetOnTick);
    assert!(pack.request_replication(b"one".to_vec(), 0));
    assert!(pack.request_replication(b"two".to_vec(), 0));
    assert_eq!(pack.header.version, 2);
}

#[test]
fn test_lossy_transfer_converges() {
    let mut rng = Pcg64::seed_from_u64(42);
    let mut auth = DataPack::new(DataPackPolicy::ResetOnTick);
    let mut viewer = DataPack::new(DataPackPolicy::ResetOnTick);

    for round in 0..4u64 {
        let payload = noise(1800 + round as usize * 300, 10 + round);
        assert!(auth.request_replication(payload.clone(), round as i16));
        let result = transfer(&mut auth, &mut viewer, || rng.random_bool(0.3));
        assert_eq!(result, Some(Replicated::Apply(payload)), "round {round}");
        assert!(auth.is_received());
    }
}

#[test]
fn test_missed_first_chunk_restarts_transfer() {
    let mut auth = DataPack::new(DataPackPolicy::ResetOnTick);
    let mut viewer = DataPack::new(DataPackPolicy::ResetOnTick);

    assert!(auth.request_replication(noise(1500, 4), 0));
    // pretend the first chunk was confirmed but the viewer never saw it
    auth.on_chunk_ack(1, 0);
    let (header, bytes) = auth.pending_chunk().unwrap();
    assert_eq!(header.offset, DEFAULT_PACKET_SIZE as i32);

    let receipt = viewer.on_chunk_received(header, bytes).unwrap();
    assert!(!receipt.completed);
    assert_eq!(receipt.ack_version, 0);

    auth.on_chunk_ack(receipt.ack_version, receipt.ack_offset);
    assert_eq!(auth.header.offset, 0);
}

#[test]
fn test_gap_acks_last_accepted_chunk() {
    let mut auth = DataPack::new(DataPackPolicy::ResetOnTick);
    let mut viewer = DataPack::new(DataPackPolicy::ResetOnTick);
    assert!(auth.request_replication(noise(2000, 5), 0));

    let (header, bytes) = auth.pending_chunk().unwrap();
    let first = viewer.on_chunk_received(header, bytes).unwrap();
    assert_eq!((first.ack_version, first.ack_offset), (1, 0));

    // ack lost, authority skips ahead anyway
    auth.on_chunk_ack(1, 0);
    auth.on_chunk_ack(1, 512);
    let (skipped, bytes) = auth.pending_chunk().unwrap();
    assert_eq!(skipped.offset, 1024);

    let gap = viewer.on_chunk_received(skipped, bytes).unwrap();
    assert_eq!((gap.ack_version, gap.ack_offset), (1, 0));
    auth.on_chunk_ack(gap.ack_version, gap.ack_offset);
    assert_eq!(auth.header.offset, 512);
}

#[test]
fn test_empty_payload_resets_viewer() {
    let mut auth = DataPack::new(DataPackPolicy::ResetOnActorChange);
    let mut viewer = DataPack::new(DataPackPolicy::ResetOnActorChange);

    assert!(auth.request_replication(b"data".to_vec(), 0));
    transfer(&mut auth, &mut viewer, || false).unwrap();

    assert!(auth.request_replication(Vec::new(), 1));
    assert_eq!(auth.header.size, 0);
    assert_eq!(
        transfer(&mut auth, &mut viewer, || false),
        Some(Replicated::Reset)
    );
}

#[test]
fn test_older_version_chunk_is_dropped() {
    let mut auth = DataPack::new(DataPackPolicy::ResetOnTick);
    let mut viewer = DataPack::new(DataPackPolicy::ResetOnTick);

    assert!(auth.request_replication(b"v1".to_vec(), 0));
    let (old_header, old_bytes) = auth.pending_chunk().map(|(h, b)| (h, b.to_vec())).unwrap();
    assert!(auth.request_replication(b"v2".to_vec(), 0));
    transfer(&mut auth, &mut viewer, || false).unwrap();

    assert!(viewer.on_chunk_received(old_header, &old_bytes).is_none());
}

#[test]
fn test_progress() {
    let mut auth = DataPack::new(DataPackPolicy::ResetOnTick);
    assert!((auth.progress() - 1.0).abs() < f32::EPSILON);

    assert!(auth.request_replication(noise(2000, 6), 0));
    assert!(auth.is_in_progress());
    assert!(auth.progress() < f32::EPSILON);

    auth.on_chunk_ack(1, 0);
    let expected = 512.0 / auth.header.size as f32;
    assert!((auth.progress() - expected).abs() < 1e-6);

    auth.mark_delivered_locally();
    assert!(!auth.is_in_progress());
    assert!((auth.progress() - 1.0).abs() < f32::EPSILON);
}

#[test]
fn test_resend_is_throttled() {
    let mut pack = DataPack::new(DataPackPolicy::ResetOnTick);
    assert!(pack.request_replication(b"abc".to_vec(), 0));

    assert!(pack.next_chunk_to_send().is_some());
    for _ in 0..RESEND_INTERVAL {
        assert!(pack.next_chunk_to_send().is_none());
    }
    assert!(pack.next_chunk_to_send().is_some());

    pack.on_chunk_ack(1, 0);
    assert!(pack.next_chunk_to_send().is_none());
}

#[test]
fn test_corrupt_compressed_payload_is_dropped() {
    let mut viewer = DataPack::new(DataPackPolicy::ResetOnTick);
    let header = DataPackHeader {
        version: 1,
        sync_counter: 0,
        size: 8,
        offset: 0,
        compressed: true,
    };
    let receipt = viewer
        .on_chunk_received(header, &[16, 0, 0, 0, 0xff, 0xff, 0xff, 0xff])
        .unwrap();
    assert!(receipt.completed);
    assert!(viewer.on_replicated().is_err());
    assert!(viewer.replicated_payload().is_none());
}

#[test]
fn test_acks_advance_one_packet_per_round() {
    let mut pack = DataPack::new(DataPackPolicy::Persistent);
    pack.header = DataPackHeader {
        version: 1,
        sync_counter: 0,
        size: 1500,
        offset: 0,
        compressed: false,
    };
    pack.received = false;

    let mut offsets = Vec::new();
    let mut rounds = 0;
    while !pack.is_received() && rounds < 10 {
        pack.on_chunk_ack(1, pack.header.offset);
        offsets.push(pack.header.offset);
        rounds += 1;
    }

    assert_eq!(offsets, vec![512, 1024, 1500]);
    assert_eq!(pack.progress(), 1.0);
}

#[test]
fn test_ack_rollback() {
    let mut pack = DataPack::new(DataPackPolicy::Persistent);
    pack.header = DataPackHeader {
        version: 5,
        sync_counter: 0,
        size: 4000,
        offset: 2048,
        compressed: false,
    };
    pack.received = false;

    // viewer only has the first chunk
    pack.on_chunk_ack(5, 0);
    assert_eq!(pack.header.offset, 512);

    // viewer is still on an older version
    pack.on_chunk_ack(4, 3584);
    assert_eq!(pack.header.offset, 0);
    assert!(!pack.is_received());

    // acks from the future are ignored
    pack.on_chunk_ack(6, 1024);
    assert_eq!(pack.header.offset, 0);
}

#[test]
fn test_ack_ahead_resynchronizes_after_stale_rollback() {
    let mut auth = DataPack::new(DataPackPolicy::Persistent);
    let mut viewer = DataPack::new(DataPackPolicy::Persistent);
    assert!(auth.request_replication(noise(2000, 11), 0));

    for _ in 0..3 {
        let (header, bytes) = auth.pending_chunk().unwrap();
        let receipt = viewer.on_chunk_received(header, bytes).unwrap();
        auth.on_chunk_ack(receipt.ack_version, receipt.ack_offset);
    }
    assert_eq!(auth.header.offset, 1536);

    // a late duplicate ack for the first chunk rolls the authority back
    auth.on_chunk_ack(1, 0);
    assert_eq!(auth.header.offset, 512);

    // the viewer answers the repeated chunk with its own position
    let (header, bytes) = auth.pending_chunk().unwrap();
    let receipt = viewer.on_chunk_received(header, bytes).unwrap();
    assert_eq!((receipt.ack_version, receipt.ack_offset), (1, 1024));
    auth.on_chunk_ack(receipt.ack_version, receipt.ack_offset);
    assert_eq!(auth.header.offset, 1536);

    assert!(transfer(&mut auth, &mut viewer, || false).is_some());
    assert!(auth.is_received());
}

#[test]
fn test_cancel_transfer_starts_a_fresh_version() {
    let mut auth = DataPack::new(DataPackPolicy::ResetOnActorChange);
    let mut viewer = DataPack::new(DataPackPolicy::ResetOnActorChange);
    let payload = noise(2000, 12);
    assert!(auth.request_replication(payload.clone(), 1));
    auth.on_chunk_ack(1, 0);
    assert!(!auth.request_replication(noise(2000, 13), 1));

    auth.cancel_transfer();
    assert!(auth.pending_chunk().is_none());
    assert!(auth.is_dirty());

    // identical bytes still go out, stamped for the new actor
    assert!(auth.request_replication(payload.clone(), 2));
    assert_eq!(auth.header.version, 2);
    assert_eq!(auth.header.sync_counter, 2);
    assert_eq!(auth.header.offset, 0);
    assert_eq!(
        transfer(&mut auth, &mut viewer, || false),
        Some(Replicated::Apply(payload))
    );
}
