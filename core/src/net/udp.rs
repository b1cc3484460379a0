use std::collections::VecDeque;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use dna_debugger_shared::ReplicatorMessage;

use super::{Link, LinkError};

/// Largest datagram a DNAD frame can arrive in
const RECV_BUFFER_SIZE: usize = 65_536;

pub const DEFAULT_DNA_PORT: u16 = 7790;

/// Non-blocking UDP socket talking to a single peer.
///
/// Datagrams from other addresses are discarded. The socket does not
/// retransmit, so reliable messages assume a loss-free path such as
/// loopback or a LAN.
pub struct UdpLink {
    socket: UdpSocket,
    local_addr: SocketAddr,
    peer: SocketAddr,
    recv_buf: Vec<u8>,
    recv_queue: VecDeque<ReplicatorMessage>,
}

fn parse_addr(addr: &str) -> Result<SocketAddr, LinkError> {
    addr.parse()
        .map_err(|_| LinkError::AddressParse(addr.to_string()))
}

impl UdpLink {
    /// Bind `local` and exchange messages with `peer`.
    pub fn bind(local: &str, peer: &str) -> Result<Self, LinkError> {
        let socket = UdpSocket::bind(parse_addr(local)?)?;
        socket.set_nonblocking(true)?;
        let local_addr = socket.local_addr()?;
        tracing::debug!(port = local_addr.port(), peer, "UdpLink bound");

        Ok(Self {
            socket,
            local_addr,
            peer: parse_addr(peer)?,
            recv_buf: vec![0u8; RECV_BUFFER_SIZE],
            recv_queue: VecDeque::new(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Point the link at a different peer, e.g. once an ephemeral port is known.
    pub fn set_peer(&mut self, peer: SocketAddr) {
        self.peer = peer;
    }

    /// Block until a message arrives or `timeout` passes.
    pub fn wait_for_message(&mut self, timeout: Duration) -> Option<ReplicatorMessage> {
        let start = Instant::now();
        loop {
            if let Some(message) = self.poll() {
                return Some(message);
            }
            if start.elapsed() >= timeout {
                return None;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn recv_all(&mut self) {
        loop {
            match self.socket.recv_from(&mut self.recv_buf) {
                Ok((len, from)) => {
                    if from != self.peer {
                        tracing::debug!(%from, "ignoring datagram from unknown sender");
                        continue;
                    }
                    match ReplicatorMessage::from_bytes(&self.recv_buf[..len]) {
                        Ok(message) => {
                            tracing::trace!(?message, "received replicator message");
                            self.recv_queue.push_back(message);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to decode replicator message");
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    tracing::warn!(error = %e, "receive error");
                    break;
                }
            }
        }
    }
}

impl Link for UdpLink {
    fn send(&mut self, message: &ReplicatorMessage) -> Result<(), LinkError> {
        self.socket.send_to(&message.to_bytes(), self.peer)?;
        tracing::trace!(?message, "sent replicator message");
        Ok(())
    }

    fn poll(&mut self) -> Option<ReplicatorMessage> {
        if self.recv_queue.is_empty() {
            self.recv_all();
        }
        self.recv_queue.pop_front()
    }
}
