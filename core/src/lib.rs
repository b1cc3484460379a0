//! DNA Debugger Core - in-game debugging overlay framework
//!
//! Pluggable debug categories collect diagnostics on the authority and
//! stream them to the viewer that asked for them; extensions add input-only
//! behavior on top.
//!
//! # Architecture
//!
//! - [`AddonRegistry`] - Process-wide category/extension registration and slot layout
//! - [`Replicator`] - One viewer session: collection, delta records, RPCs
//! - [`DataPack`] - Checksummed, compressed, chunked payload transfer
//! - [`SessionManager`] - Per-world housekeeping of replicators and input routers
//! - [`CanvasContext`] - Markup text and shape drawing over an engine [`Canvas`]

pub mod canvas;
pub mod category;
pub mod config;
pub mod extension;
pub mod input;
#[cfg(test)]
mod integration;
pub mod net;
pub mod pack;
pub mod registry;
pub mod replicator;
pub mod session;
#[cfg(test)]
pub mod test_utils;
pub mod world;

pub use canvas::{Canvas, CanvasContext, CanvasPadding};
pub use category::{Category, CategoryInstance, CategoryPhase, CategorySetup, CategoryState};
pub use config::{ConfigError, DebuggerConfig};
pub use extension::{Extension, ExtensionInstance, ExtensionSetup, HudExtension};
pub use input::{InputAction, InputHandler, InputMode, InputModifier, InputRouter, KeyEvent};
pub use net::{Link, LinkError, LoopbackLink, UdpLink};
pub use pack::{DataPack, PackError};
pub use registry::{AddonRegistry, CategoryLayout, RegistryEvent, SessionContext};
pub use replicator::Replicator;
pub use session::{DebuggerModule, SessionManager};
pub use world::{DebugActor, NetMode, World, WorldId};

// Re-export wire types for convenience
pub use dna_debugger_shared::{
    ActorId, Color, ControllerId, DataPackHeader, DataPackPolicy, ReplicatorMessage, Shape,
};
