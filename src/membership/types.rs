use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

/// Identity of a cluster member: an IPv4 host and a port.
///
/// Two ids are equal iff both fields match exactly. The id doubles as the
/// member's gossip endpoint, so no separate address book is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId {
    pub host: u32,
    pub port: u16,
}

impl PeerId {
    pub const fn new(host: u32, port: u16) -> Self {
        Self { host, port }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::from(self.host), self.port))
    }

    /// IPv4 endpoints only; the wire format has no room for anything wider.
    pub fn from_socket_addr(addr: SocketAddr) -> Option<Self> {
        match addr {
            SocketAddr::V4(v4) => Some(Self::from(v4)),
            SocketAddr::V6(_) => None,
        }
    }
}

impl From<SocketAddrV4> for PeerId {
    fn from(addr: SocketAddrV4) -> Self {
        Self::new(u32::from(*addr.ip()), addr.port())
    }
}

impl FromStr for PeerId {
    type Err = std::net::AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<SocketAddrV4>().map(Self::from)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", Ipv4Addr::from(self.host), self.port)
    }
}

/// One row of the membership table: the freshest liveness evidence this node
/// holds about one peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipEntry {
    pub id: PeerId,
    /// Highest heartbeat observed for this peer. Never decreases.
    pub heartbeat: u64,
    /// Local clock reading at which `heartbeat` last advanced. Always our own
    /// clock, never the sender's — it records when *we* last had fresh
    /// evidence.
    pub last_updated: u64,
}

/// The authoritative per-node view of the group.
///
/// Owned exclusively by one [`Node`](super::node::Node); never shared across
/// nodes. Enumeration order is unspecified and carries no meaning.
#[derive(Debug, Default)]
pub struct MembershipTable {
    entries: HashMap<PeerId, MembershipEntry>,
}

impl MembershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &PeerId) -> Option<&MembershipEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &PeerId) -> bool {
        self.entries.contains_key(id)
    }

    /// Applies liveness evidence for `id`.
    ///
    /// Inserts a fresh entry when the peer is unknown. For a known peer the
    /// entry advances only when `heartbeat` is strictly newer; stale or
    /// duplicate evidence leaves both the heartbeat and `last_updated`
    /// untouched. Returns `true` when a new entry was created.
    pub fn upsert(&mut self, id: PeerId, heartbeat: u64, now: u64) -> bool {
        match self.entries.entry(id) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if heartbeat > entry.heartbeat {
                    entry.heartbeat = heartbeat;
                    entry.last_updated = now;
                }
                false
            }
            Entry::Vacant(vacant) => {
                vacant.insert(MembershipEntry {
                    id,
                    heartbeat,
                    last_updated: now,
                });
                true
            }
        }
    }

    pub fn remove(&mut self, id: &PeerId) -> Option<MembershipEntry> {
        self.entries.remove(id)
    }

    pub fn all(&self) -> impl Iterator<Item = &MembershipEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of entries whose evidence is at least `ttl` ticks old.
    ///
    /// Candidates are collected into an owned list so the caller can remove
    /// them afterwards; erasing while scanning the same structure can skip
    /// the entry behind a removed one.
    pub fn expired(&self, now: u64, ttl: u64) -> Vec<PeerId> {
        self.entries
            .values()
            .filter(|entry| now.saturating_sub(entry.last_updated) >= ttl)
            .map(|entry| entry.id)
            .collect()
    }
}

/// Sink for membership change notifications.
///
/// Pure notification: nothing the observer does feeds back into protocol
/// state. `observer` is the node reporting the change, `peer` the subject.
pub trait PeerObserver {
    fn peer_added(&self, observer: PeerId, peer: PeerId);
    fn peer_removed(&self, observer: PeerId, peer: PeerId);
}

/// Production observer: emits membership changes as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl PeerObserver for LogObserver {
    fn peer_added(&self, observer: PeerId, peer: PeerId) {
        tracing::info!("{} added member {}", observer, peer);
    }

    fn peer_removed(&self, observer: PeerId, peer: PeerId) {
        tracing::info!("{} removed member {}", observer, peer);
    }
}
