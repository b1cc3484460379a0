//! Versioned, checksum-deduplicated binary payloads with chunked transfer.
//!
//! A category serializes its bulk debug data into one or more data packs.
//! The authority side decides whether a freshly serialized payload needs to
//! be sent at all (checksum), compresses large payloads and hands them out
//! in `packet_size` slices that the viewer acknowledges. The viewer side
//! reassembles slices and reports its position back so lost slices are
//! resent from the last confirmed offset.
//!
//! Compressed payloads use lz4's size-prepended format, which matches the
//! `[u32 uncompressed length][compressed bytes]` layout on the wire.

use dna_debugger_shared::{DataPackHeader, DataPackPolicy, is_newer_version};
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use thiserror::Error;
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

#[cfg(test)]
mod tests;

/// Payloads larger than this are compressed and sent in several chunks.
pub const DEFAULT_PACKET_SIZE: usize = 512;

/// Flushes to wait for an acknowledgement before sending the same chunk again.
pub const RESEND_INTERVAL: u32 = 8;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("failed to decompress data pack payload: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),
}

/// What the viewer should do with a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replicated {
    /// Empty payload: clear the producer's data
    Reset,
    /// Uncompressed payload for the producer to deserialize
    Apply(Vec<u8>),
}

/// Viewer reply to a received chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkReceipt {
    pub ack_version: i16,
    pub ack_offset: i32,
    /// The chunk completed the payload
    pub completed: bool,
}

/// One data pack, used on both ends of a replicator.
#[derive(Debug, Clone)]
pub struct DataPack {
    pub header: DataPackHeader,
    policy: DataPackPolicy,
    packet_size: usize,
    data: Vec<u8>,
    checksum: u64,
    dirty: bool,
    needs_confirmation: bool,
    received: bool,
    last_sent: Option<(i16, i32)>,
    resend_cooldown: u32,
    // viewer side
    assembling: bool,
    last_chunk_offset: i32,
}

impl DataPack {
    pub fn new(policy: DataPackPolicy) -> Self {
        Self::with_packet_size(policy, DEFAULT_PACKET_SIZE)
    }

    pub fn with_packet_size(policy: DataPackPolicy, packet_size: usize) -> Self {
        Self {
            header: DataPackHeader::default(),
            policy,
            packet_size: packet_size.max(1),
            data: Vec::new(),
            checksum: xxh3_64(&[]),
            dirty: false,
            needs_confirmation: false,
            received: true,
            last_sent: None,
            resend_cooldown: 0,
            assembling: false,
            last_chunk_offset: 0,
        }
    }

    pub fn policy(&self) -> DataPackPolicy {
        self.policy
    }

    pub fn packet_size(&self) -> usize {
        self.packet_size
    }

    /// Force the next replication request through even if the checksum matches.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record a freshly serialized payload and report whether it differs
    /// from the last one (or the pack was marked dirty).
    pub fn check_dirty_and_update(&mut self, payload: &[u8]) -> bool {
        let checksum = xxh3_64(payload);
        if !self.dirty && checksum == self.checksum {
            return false;
        }
        self.checksum = checksum;
        true
    }

    /// Accept a new payload for replication.
    ///
    /// Returns `false` when nothing changed, or when a multi-chunk transfer
    /// is still waiting for confirmation; the caller retries on its next
    /// collection.
    pub fn request_replication(&mut self, payload: Vec<u8>, sync_counter: i16) -> bool {
        if self.needs_confirmation && !self.received {
            return false;
        }
        if !self.check_dirty_and_update(&payload) {
            return false;
        }

        let compressed = payload.len() > self.packet_size;
        self.data = if compressed {
            compress_prepend_size(&payload)
        } else {
            payload
        };

        self.needs_confirmation = self.data.len() > self.packet_size;
        self.received = false;
        self.dirty = false;
        self.header = DataPackHeader {
            version: self.header.version.wrapping_add(1),
            sync_counter,
            size: self.data.len() as i32,
            offset: 0,
            compressed,
        };
        debug!(
            version = self.header.version,
            size = self.header.size,
            compressed,
            "data pack queued for replication"
        );
        true
    }

    /// Slice the viewer still has to confirm, if any.
    pub fn pending_chunk(&self) -> Option<(DataPackHeader, &[u8])> {
        if self.received {
            return None;
        }
        let start = self.header.offset.max(0) as usize;
        let end = (start + self.packet_size).min(self.data.len());
        if start > end {
            return None;
        }
        Some((self.header, &self.data[start..end]))
    }

    /// Pending chunk, throttled so an unacknowledged chunk is only repeated
    /// every [`RESEND_INTERVAL`] calls.
    pub fn next_chunk_to_send(&mut self) -> Option<(DataPackHeader, Vec<u8>)> {
        let (header, bytes) = self.pending_chunk()?;
        let key = (header.version, header.offset);
        if self.last_sent == Some(key) && self.resend_cooldown > 0 {
            self.resend_cooldown -= 1;
            return None;
        }
        let chunk = (header, bytes.to_vec());
        self.last_sent = Some(key);
        self.resend_cooldown = RESEND_INTERVAL;
        Some(chunk)
    }

    /// Apply a viewer acknowledgement.
    pub fn on_chunk_ack(&mut self, version: i16, offset: i32) {
        let packet = self.packet_size as i32;
        let size = self.header.size;
        if version == self.header.version {
            // `offset` is where the viewer's last accepted chunk starts; the
            // next chunk to send follows it, whether we are ahead or behind.
            // A viewer that kept chunks past a rollback keeps acking its own
            // position, so jumping forward is what resynchronizes the two.
            self.header.offset = (offset + packet).clamp(0, size);
            self.received = self.header.offset == size;
        } else if is_newer_version(self.header.version, version) {
            self.header.offset = 0;
            self.received = false;
        }
    }

    /// Abandon the transfer in flight. The next replication request goes
    /// out as a new version even if the payload is unchanged.
    pub fn cancel_transfer(&mut self) {
        self.data.clear();
        self.needs_confirmation = false;
        self.received = true;
        self.last_sent = None;
        self.resend_cooldown = 0;
        self.header.offset = 0;
        self.header.size = 0;
        self.dirty = true;
    }

    /// Authority and viewer share this pack; nothing has to travel.
    pub fn mark_delivered_locally(&mut self) {
        self.header.offset = self.header.size;
        self.received = true;
    }

    /// Viewer side: consume one chunk and produce the acknowledgement.
    ///
    /// Returns `None` for chunks of an older version, which are dropped.
    pub fn on_chunk_received(
        &mut self,
        remote: DataPackHeader,
        bytes: &[u8],
    ) -> Option<ChunkReceipt> {
        let same_version = self.assembling && remote.version == self.header.version;
        if !same_version {
            let newer = !self.assembling || is_newer_version(remote.version, self.header.version);
            if !newer {
                return None;
            }
            if remote.offset != 0 {
                // missed the start of this version, ask for a restart
                return Some(self.receipt(self.header.version, self.last_chunk_offset, false));
            }
            self.assembling = true;
            self.data.clear();
            self.last_chunk_offset = 0;
            self.header = DataPackHeader {
                offset: 0,
                ..remote
            };
        }

        let end = remote.offset as i64 + bytes.len() as i64;
        let in_order = remote.offset == self.header.offset && end <= self.header.size as i64;
        if !in_order {
            return Some(self.receipt(self.header.version, self.last_chunk_offset, false));
        }

        self.data.extend_from_slice(bytes);
        self.header.offset = end as i32;
        self.last_chunk_offset = remote.offset;
        let completed = self.header.offset == self.header.size;
        Some(self.receipt(remote.version, remote.offset, completed))
    }

    fn receipt(&self, version: i16, offset: i32, completed: bool) -> ChunkReceipt {
        ChunkReceipt {
            ack_version: version,
            ack_offset: offset,
            completed,
        }
    }

    /// Viewer side: interpret a completed payload.
    pub fn on_replicated(&self) -> Result<Replicated, PackError> {
        if self.header.size == 0 {
            return Ok(Replicated::Reset);
        }
        if self.header.compressed {
            return Ok(Replicated::Apply(decompress_size_prepended(&self.data)?));
        }
        Ok(Replicated::Apply(self.data.clone()))
    }

    /// Same as [`on_replicated`](Self::on_replicated) but logs and drops failures.
    pub fn replicated_payload(&self) -> Option<Replicated> {
        match self.on_replicated() {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(version = self.header.version, "{e}");
                None
            }
        }
    }

    /// Transfer progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.header.size <= 0 || self.header.offset >= self.header.size {
            1.0
        } else {
            self.header.offset as f32 / self.header.size as f32
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.header.offset < self.header.size
    }

    pub fn is_multi_packet(&self) -> bool {
        self.header.size as usize > self.packet_size
    }

    pub fn is_received(&self) -> bool {
        self.received
    }

    /// Drop all payload state (viewer reconnect, actor reset).
    pub fn clear(&mut self) {
        let policy = self.policy;
        let packet_size = self.packet_size;
        let version = self.header.version;
        *self = Self::with_packet_size(policy, packet_size);
        self.header.version = version;
    }
}
