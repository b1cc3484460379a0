//! Opaque handles for engine objects referenced over the wire.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A player controller (one debugger viewer per controller)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode, Serialize, Deserialize,
)]
pub struct ControllerId(pub u32);

/// A gameplay actor that can be selected as the debug subject
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode, Serialize, Deserialize,
)]
pub struct ActorId(pub u64);
