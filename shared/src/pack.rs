//! Data pack transfer header and reset policy.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Transfer state of one data pack, replicated alongside each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct DataPackHeader {
    /// Bumped on every accepted replication request, wraps around
    pub version: i16,
    /// Debug actor sync counter at the time the payload was produced
    pub sync_counter: i16,
    /// Payload size on the wire (after compression)
    pub size: i32,
    /// Confirmed transfer position in `[0, size]`
    pub offset: i32,
    pub compressed: bool,
}

impl DataPackHeader {
    /// Compares the fields that describe transfer progress.
    ///
    /// Sync counter and compression flag are deliberately left out; two
    /// headers with the same version, size and offset describe the same
    /// state for delta replication.
    pub fn same_transfer_state(&self, other: &DataPackHeader) -> bool {
        self.version == other.version && self.size == other.size && self.offset == other.offset
    }
}

/// `true` if `version` is newer than `than`, accounting for wraparound.
pub fn is_newer_version(version: i16, than: i16) -> bool {
    version.wrapping_sub(than) > 0
}

/// When a data pack's contents are cleared before collection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, Serialize, Deserialize,
)]
pub enum DataPackPolicy {
    /// Never reset automatically
    Persistent,
    /// Reset when the selected debug actor changes
    ResetOnActorChange,
    /// Reset before every collection
    #[default]
    ResetOnTick,
}
