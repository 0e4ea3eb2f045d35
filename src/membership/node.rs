//! Node State Machine
//!
//! Owns the membership table and drives the protocol's duty cycle. One tick
//! is an atomic unit of work: drain and dispatch every queued inbound
//! message, then run the failure-detection / gossip pass. The node is
//! logically single-threaded; collaborators (transport, clock, observer) are
//! passed in by the outer driver on every call.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::{ConfigError, ProtocolConfig};
use crate::transport::Transport;

use super::merge::merge;
use super::protocol::{self, Message, MessageKind, PeerDigest, WireError};
use super::types::{MembershipTable, PeerId, PeerObserver};

#[derive(Debug, Error)]
pub enum MembershipError {
    /// The node cannot establish its own identity or state. Fatal at
    /// start-up; a node cannot meaningfully exist without it.
    #[error("initialization failed: {0}")]
    Initialization(#[from] ConfigError),
    /// Every join attempt went unanswered. Fatal: the node never entered the
    /// group.
    #[error("no join reply from {rendezvous} after {attempts} attempts")]
    JoinTimeout { rendezvous: PeerId, attempts: u32 },
}

/// Protocol state machine for one cluster member.
pub struct Node {
    id: PeerId,
    heartbeat: u64,
    in_group: bool,
    failed: bool,
    table: MembershipTable,
    config: ProtocolConfig,
    join_attempts: u32,
    /// Clock reading at which the next join request may go out.
    next_join_retry: u64,
}

impl Node {
    pub fn new(id: PeerId, config: ProtocolConfig) -> Result<Self, MembershipError> {
        config.validate()?;
        Ok(Self {
            id,
            heartbeat: 0,
            in_group: false,
            failed: false,
            table: MembershipTable::new(),
            config,
            join_attempts: 0,
            next_join_retry: 0,
        })
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn heartbeat(&self) -> u64 {
        self.heartbeat
    }

    pub fn in_group(&self) -> bool {
        self.in_group
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn table(&self) -> &MembershipTable {
        &self.table
    }

    /// Bootstraps the node.
    ///
    /// The member holding the rendezvous identity seeds the group on its own:
    /// it inserts itself and is in the group immediately. Every other member
    /// sends a join request to the rendezvous endpoint and stays out of the
    /// group until a reply arrives.
    pub fn start(
        &mut self,
        net: &mut dyn Transport,
        clock: &dyn Clock,
        observer: &dyn PeerObserver,
    ) {
        let now = clock.now();
        if self.id == self.config.rendezvous {
            info!("{} starting up group as introducer", self.id);
            self.table.upsert(self.id, self.heartbeat, now);
            observer.peer_added(self.id, self.id);
            self.in_group = true;
        } else {
            self.send_join_request(net, now);
        }
    }

    /// Marks the node as crashed. A failed node takes no further part in the
    /// protocol; every subsequent [`tick`](Self::tick) is a no-op.
    pub fn fail(&mut self) {
        self.failed = true;
    }

    /// One protocol tick: drain and dispatch all inbound messages, then run
    /// the failure detector and gossip fanout (once in the group).
    pub fn tick(
        &mut self,
        net: &mut dyn Transport,
        clock: &dyn Clock,
        observer: &dyn PeerObserver,
    ) -> Result<(), MembershipError> {
        if self.failed {
            return Ok(());
        }

        for payload in net.drain_inbound(self.id) {
            self.dispatch(&payload, net, clock, observer);
        }

        if !self.in_group {
            return self.drive_join(net, clock);
        }

        self.detect_and_gossip(net, clock.now(), observer);
        Ok(())
    }

    fn dispatch(
        &mut self,
        payload: &[u8],
        net: &mut dyn Transport,
        clock: &dyn Clock,
        observer: &dyn PeerObserver,
    ) {
        let now = clock.now();
        match protocol::decode(payload) {
            Ok(Message::JoinRequest { from, heartbeat }) => {
                self.handle_join_request(from, heartbeat, net, now, observer);
            }
            Ok(Message::JoinReply { members }) => {
                merge(&mut self.table, &members, now, self.id, observer);
                if !self.in_group {
                    info!(
                        "{} admitted to group ({} known members)",
                        self.id,
                        self.table.len()
                    );
                    self.in_group = true;
                }
            }
            Ok(Message::Heartbeat { members }) => {
                merge(&mut self.table, &members, now, self.id, observer);
            }
            // Transport noise must not destabilize the node: unknown kinds
            // are ignored, malformed payloads dropped without touching state.
            Err(WireError::UnknownKind { tag }) => {
                debug!("{} ignoring message with unknown kind tag {}", self.id, tag);
            }
            Err(err) => {
                warn!("{} dropping malformed message: {}", self.id, err);
            }
        }
    }

    fn handle_join_request(
        &mut self,
        from: PeerId,
        heartbeat: u64,
        net: &mut dyn Transport,
        now: u64,
        observer: &dyn PeerObserver,
    ) {
        info!("{} received join request from {}", self.id, from);
        let digest = PeerDigest {
            id: from,
            heartbeat,
            timestamp: now,
        };
        merge(&mut self.table, &[digest], now, self.id, observer);

        // Reply with the whole table so the joiner converges in one message.
        let reply = protocol::encode_snapshot(MessageKind::JoinReply, &self.snapshot());
        net.send(self.id, from, reply);
    }

    /// Failure detector and gossip disseminator, in order: refresh own entry,
    /// evict peers past `t_cleanup`, then fan the full table out to every
    /// peer still inside the `t_fail` window.
    fn detect_and_gossip(&mut self, net: &mut dyn Transport, now: u64, observer: &dyn PeerObserver) {
        // Own liveness first, so the local entry never looks stale.
        self.heartbeat += 1;
        self.table.upsert(self.id, self.heartbeat, now);

        for id in self.table.expired(now, self.config.t_cleanup) {
            self.table.remove(&id);
            observer.peer_removed(self.id, id);
        }

        // Peers silent for at least t_fail ticks stay in the table — late
        // evidence can still rehabilitate them — but gossiping at them gains
        // nothing, so they are excluded from fanout.
        let targets: Vec<PeerId> = self
            .table
            .all()
            .filter(|entry| {
                entry.id != self.id && now.saturating_sub(entry.last_updated) < self.config.t_fail
            })
            .map(|entry| entry.id)
            .collect();

        if targets.is_empty() {
            return;
        }

        let snapshot = protocol::encode_snapshot(MessageKind::Heartbeat, &self.snapshot());
        for target in targets {
            net.send(self.id, target, snapshot.clone());
        }
    }

    /// Re-sends the join request with bounded exponential backoff until a
    /// reply arrives or the attempt budget is spent.
    fn drive_join(
        &mut self,
        net: &mut dyn Transport,
        clock: &dyn Clock,
    ) -> Result<(), MembershipError> {
        let now = clock.now();
        if now < self.next_join_retry {
            return Ok(());
        }
        if self.join_attempts >= self.config.max_join_attempts {
            return Err(MembershipError::JoinTimeout {
                rendezvous: self.config.rendezvous,
                attempts: self.join_attempts,
            });
        }
        self.send_join_request(net, now);
        Ok(())
    }

    fn send_join_request(&mut self, net: &mut dyn Transport, now: u64) {
        use rand::Rng;

        self.join_attempts += 1;
        let backoff = self.config.join_retry_base << (self.join_attempts - 1).min(16);
        let jitter = rand::thread_rng().gen_range(0..self.config.join_retry_base);
        self.next_join_retry = now + backoff + jitter;

        info!(
            "{} sending join request to {} (attempt {}/{})",
            self.id, self.config.rendezvous, self.join_attempts, self.config.max_join_attempts
        );
        net.send(
            self.id,
            self.config.rendezvous,
            protocol::encode_join_request(self.id, self.heartbeat),
        );
    }

    fn snapshot(&self) -> Vec<PeerDigest> {
        self.table
            .all()
            .map(|entry| PeerDigest {
                id: entry.id,
                heartbeat: entry.heartbeat,
                timestamp: entry.last_updated,
            })
            .collect()
    }
}
