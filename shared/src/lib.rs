//! Shared types for the DNA debugger.
//!
//! Everything in here crosses the wire between an authority-side replicator
//! and its viewer: colors, debug shapes, data pack headers and the framed
//! [`ReplicatorMessage`] envelope.

pub mod color;
pub mod ids;
pub mod messages;
pub mod pack;
pub mod shape;

pub use color::Color;
pub use ids::{ActorId, ControllerId};
pub use messages::{
    CategoryRecord, DataPackAck, DataPackChunk, DebugActorState, DecodeError, ReplicatorMessage,
};
pub use pack::{DataPackHeader, DataPackPolicy, is_newer_version};
pub use shape::{Shape, ShapeKind};
