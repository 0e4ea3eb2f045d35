//! Membership & Dissemination Module
//!
//! Implements a heartbeat-gossip group membership protocol: each node keeps a
//! table of peers with the freshest heartbeat it has seen for each, and fans
//! the whole table out to every live peer once per tick.
//!
//! ## Core Mechanisms
//! - **Join protocol**: A well-known rendezvous member seeds the group and
//!   admits newcomers by answering their join request with a full table
//!   snapshot, so a new node converges in one message.
//! - **Heartbeat gossip**: Full-mesh, non-randomized dissemination — every
//!   tick, every live member learns every other member's latest heartbeat.
//! - **Failure detection**: Purely local and timeout-driven. A peer silent
//!   for `t_fail` ticks is dropped from fanout; after `t_cleanup` ticks it is
//!   evicted from the table. Suspicion is recomputed every tick, so a late
//!   heartbeat fully rehabilitates a peer.

pub mod merge;
pub mod node;
pub mod protocol;
pub mod service;
pub mod types;
