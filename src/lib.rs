//! Gossip Cluster Membership Library
//!
//! This library crate implements a peer-to-peer group membership protocol:
//! every process keeps a locally-consistent view of which peers are alive,
//! spreads that view with periodic full-table gossip, and evicts peers that
//! have gone silent for too long.
//!
//! ## Architecture Modules
//! The crate is composed of four loosely coupled subsystems:
//!
//! - **`membership`**: The protocol core. Contains the membership table, the
//!   binary wire codec, the monotonic-heartbeat merge engine, the per-tick
//!   failure detector / gossip disseminator, the join protocol, and the UDP
//!   runtime service that drives one node at a fixed cadence.
//! - **`transport`**: The message transport seam. A best-effort [`transport::Transport`]
//!   trait with a UDP implementation for real deployments and an in-memory
//!   network for simulations and tests.
//! - **`clock`**: The logical time source. All freshness decisions are made
//!   against a shared, monotonically non-decreasing tick counter.
//! - **`config`**: Protocol tunables — the failure and eviction windows, the
//!   rendezvous identity, and the join retry policy.

pub mod clock;
pub mod config;
pub mod membership;
pub mod transport;
