//! Replicator wire messages
//!
//! Every message between an authority-side replicator and its viewer is a
//! [`ReplicatorMessage`], serialized with bitcode and framed so a datagram
//! can be validated before decoding.
//!
//! # Wire Format
//!
//! ```text
//! [DNAD][version:u16][length:u32][bitcode payload...]
//! ```

use bitcode::{Decode, Encode};
use thiserror::Error;

use crate::ids::ActorId;
use crate::pack::DataPackHeader;
use crate::shape::Shape;

/// Frame magic bytes
pub const DNAD_MAGIC: [u8; 4] = *b"DNAD";

/// Current wire protocol version
pub const DNAD_VERSION: u16 = 1;

/// Header size: magic (4) + version (2) + length (4)
pub const DNAD_HEADER_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub enum ReplicatorMessage {
    // Authority -> viewer
    /// Replicator-wide enabled flag
    ReplicatorState { enabled: bool },
    /// Currently selected debug actor
    DebugActor(DebugActorState),
    /// Category records that changed since the last send (or all of them on a keyframe)
    CategoryRecords(Vec<CategoryRecord>),
    /// One slice of a data pack payload
    DataPackChunk(DataPackChunk),

    // Viewer -> authority
    SetEnabled(bool),
    SetDebugActor(Option<ActorId>),
    SetCategoryEnabled { category_id: u32, enable: bool },
    CategoryInput { category_id: u32, handler_id: u32 },
    ExtensionInput { extension_id: u32, handler_id: u32 },
    /// Receipt for a data pack chunk
    DataPackAck(DataPackAck),
}

/// Replicated view of one category instance
#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
pub struct CategoryRecord {
    pub category_id: u32,
    pub enabled: bool,
    pub text_lines: Vec<String>,
    pub shapes: Vec<Shape>,
    pub data_packs: Vec<DataPackHeader>,
}

impl CategoryRecord {
    /// Equality used for delta replication (pack headers compare by transfer state only).
    pub fn same_replicated_state(&self, other: &CategoryRecord) -> bool {
        self.category_id == other.category_id
            && self.enabled == other.enabled
            && self.text_lines == other.text_lines
            && self.shapes == other.shapes
            && self.data_packs.len() == other.data_packs.len()
            && self
                .data_packs
                .iter()
                .zip(&other.data_packs)
                .all(|(a, b)| a.same_transfer_state(b))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
pub struct DebugActorState {
    pub actor: Option<ActorId>,
    pub name: String,
    pub sync_counter: i16,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct DataPackChunk {
    pub category_id: u32,
    pub pack_id: u32,
    pub header: DataPackHeader,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct DataPackAck {
    pub category_id: u32,
    pub pack_id: u32,
    pub version: i16,
    pub offset: i32,
}

impl ReplicatorMessage {
    /// Messages that must arrive; the rest are resent or superseded by later traffic.
    pub fn is_reliable(&self) -> bool {
        !matches!(
            self,
            Self::CategoryRecords(_) | Self::DataPackChunk(_) | Self::DataPackAck(_)
        )
    }

    /// Serialize message to bytes with DNAD framing
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload = bitcode::encode(self);
        let mut bytes = Vec::with_capacity(DNAD_HEADER_SIZE + payload.len());
        bytes.extend_from_slice(&DNAD_MAGIC);
        bytes.extend_from_slice(&DNAD_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&payload);
        bytes
    }

    /// Deserialize message from bytes with DNAD framing
    ///
    /// Validates magic, version, and length before decoding payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < DNAD_HEADER_SIZE {
            return Err(DecodeError::TooShort);
        }
        if bytes[0..4] != DNAD_MAGIC {
            return Err(DecodeError::InvalidMagic);
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != DNAD_VERSION {
            return Err(DecodeError::VersionMismatch {
                expected: DNAD_VERSION,
                got: version,
            });
        }

        let length = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
        let available = bytes.len() - DNAD_HEADER_SIZE;
        if available < length {
            return Err(DecodeError::IncompletePayload {
                expected: length,
                got: available,
            });
        }

        let payload = &bytes[DNAD_HEADER_SIZE..DNAD_HEADER_SIZE + length];
        bitcode::decode(payload).map_err(|e| DecodeError::DecodeFailed(e.to_string()))
    }
}

/// Errors that can occur when decoding framed messages
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("message too short for DNAD header")]
    TooShort,
    #[error("invalid DNAD magic bytes")]
    InvalidMagic,
    #[error("DNAD version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u16, got: u16 },
    #[error("incomplete payload: expected {expected} bytes, got {got}")]
    IncompletePayload { expected: usize, got: usize },
    #[error("failed to decode DNAD message: {0}")]
    DecodeFailed(String),
}
