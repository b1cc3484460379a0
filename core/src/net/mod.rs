//! Transport links between an authority replicator and its viewer
//!
//! ```text
//!   authority Replicator            viewer Replicator
//!          │ drain_outgoing()              ▲ handle_message()
//!          ▼                               │
//!   ┌─────────────┐   DNAD frames   ┌─────────────┐
//!   │    Link     │ ──────────────▶ │    Link     │
//!   └─────────────┘ ◀────────────── └─────────────┘
//! ```
//!
//! - [`LoopbackLink`] - in-process pair with optional seeded packet loss
//! - [`UdpLink`] - non-blocking UDP socket bound to one peer

mod loopback;
mod udp;

pub use loopback::LoopbackLink;
pub use udp::{DEFAULT_DNA_PORT, UdpLink};

use dna_debugger_shared::{DecodeError, ReplicatorMessage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid address '{0}'")]
    AddressParse(String),
    #[error("failed to decode message: {0}")]
    Decode(#[from] DecodeError),
    #[error("peer is gone")]
    Closed,
}

/// Message pipe to the other side of a replicator session.
///
/// Unreliable messages may be dropped by the link; reliable ones must not
/// be.
pub trait Link {
    fn send(&mut self, message: &ReplicatorMessage) -> Result<(), LinkError>;

    /// Next received message, without blocking.
    fn poll(&mut self) -> Option<ReplicatorMessage>;

    fn send_all(&mut self, messages: Vec<ReplicatorMessage>) -> Result<(), LinkError> {
        for message in &messages {
            self.send(message)?;
        }
        Ok(())
    }

    fn poll_all(&mut self) -> Vec<ReplicatorMessage> {
        std::iter::from_fn(|| self.poll()).collect()
    }
}
