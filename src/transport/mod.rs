//! Message Transport
//!
//! The protocol core never touches sockets directly; it talks to a
//! [`Transport`], an opaque best-effort channel that may drop, reorder, or
//! duplicate messages. The merge engine's monotonic-heartbeat rule is what
//! makes the protocol tolerant of that.
//!
//! Two implementations ship with the crate: [`UdpTransport`] for real
//! deployments and [`InMemoryNetwork`] for simulations and tests.

pub mod udp;

pub use udp::UdpTransport;

use bytes::Bytes;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::membership::types::PeerId;

pub trait Transport {
    /// Best-effort, non-blocking send. Delivery is never guaranteed.
    fn send(&mut self, from: PeerId, to: PeerId, payload: Bytes);

    /// Every message that has arrived for `node` since the last drain, in
    /// arrival order. Consumes the queue.
    fn drain_inbound(&mut self, node: PeerId) -> Vec<Bytes>;
}

/// In-process transport: one mailbox per peer.
///
/// Backs the test suite and multi-node simulations. Peers can be isolated to
/// model crashes, message loss, and partitions.
#[derive(Debug, Default)]
pub struct InMemoryNetwork {
    mailboxes: HashMap<PeerId, VecDeque<Bytes>>,
    isolated: HashSet<PeerId>,
}

impl InMemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Silently drops all traffic to and from `id` until [`heal`](Self::heal).
    pub fn isolate(&mut self, id: PeerId) {
        self.isolated.insert(id);
    }

    pub fn heal(&mut self, id: PeerId) {
        self.isolated.remove(&id);
    }

    /// Number of undelivered messages queued for `id`.
    pub fn pending(&self, id: PeerId) -> usize {
        self.mailboxes.get(&id).map_or(0, VecDeque::len)
    }
}

impl Transport for InMemoryNetwork {
    fn send(&mut self, from: PeerId, to: PeerId, payload: Bytes) {
        if self.isolated.contains(&from) || self.isolated.contains(&to) {
            return;
        }
        self.mailboxes.entry(to).or_default().push_back(payload);
    }

    fn drain_inbound(&mut self, node: PeerId) -> Vec<Bytes> {
        if self.isolated.contains(&node) {
            self.mailboxes.remove(&node);
            return Vec::new();
        }
        self.mailboxes.remove(&node).map(Vec::from).unwrap_or_default()
    }
}
