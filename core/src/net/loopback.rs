use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use dna_debugger_shared::ReplicatorMessage;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use super::{Link, LinkError};

type Queue = RefCell<VecDeque<Vec<u8>>>;

/// One end of an in-process link.
///
/// Messages travel as encoded frames, so the wire format is exercised the
/// same way a socket would.
pub struct LoopbackLink {
    inbox: Rc<Queue>,
    peer: Weak<Queue>,
    loss: Option<(f64, Pcg64)>,
    dropped: usize,
}

impl LoopbackLink {
    pub fn pair() -> (Self, Self) {
        let a = Rc::new(Queue::default());
        let b = Rc::new(Queue::default());
        let left = Self {
            inbox: a.clone(),
            peer: Rc::downgrade(&b),
            loss: None,
            dropped: 0,
        };
        let right = Self {
            inbox: b,
            peer: Rc::downgrade(&a),
            loss: None,
            dropped: 0,
        };
        (left, right)
    }

    /// Drop this fraction of outgoing unreliable messages, seeded for
    /// repeatable runs.
    pub fn with_loss(mut self, rate: f64, seed: u64) -> Self {
        self.loss = Some((rate.clamp(0.0, 1.0), Pcg64::seed_from_u64(seed)));
        self
    }

    /// Unreliable messages dropped so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl Link for LoopbackLink {
    fn send(&mut self, message: &ReplicatorMessage) -> Result<(), LinkError> {
        let peer = self.peer.upgrade().ok_or(LinkError::Closed)?;
        let lost = match &mut self.loss {
            Some((rate, rng)) if !message.is_reliable() => rng.random_bool(*rate),
            _ => false,
        };
        if lost {
            self.dropped += 1;
            return Ok(());
        }
        peer.borrow_mut().push_back(message.to_bytes());
        Ok(())
    }

    fn poll(&mut self) -> Option<ReplicatorMessage> {
        loop {
            let frame = self.inbox.borrow_mut().pop_front()?;
            match ReplicatorMessage::from_bytes(&frame) {
                Ok(message) => return Some(message),
                Err(e) => tracing::warn!(error = %e, "dropping undecodable frame"),
            }
        }
    }
}
