//! Logical time source.
//!
//! The protocol never reads wall-clock time. Freshness of membership evidence
//! is judged against a logical tick counter that the outer driver advances
//! once per protocol tick, and that every node in a deployment or simulation
//! shares as a common reference point.

use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically non-decreasing logical clock.
pub trait Clock {
    /// The current logical timestamp, in ticks.
    fn now(&self) -> u64;
}

/// A clock backed by a plain counter.
///
/// The owning driver advances it explicitly between protocol ticks; the
/// protocol core only ever reads it. One instance is shared by every node of
/// an in-process simulation so that all freshness judgments use the same
/// reference point.
#[derive(Debug, Default)]
pub struct TickClock {
    now: AtomicU64,
}

impl TickClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward by `ticks` and returns the new reading.
    pub fn advance(&self, ticks: u64) -> u64 {
        self.now.fetch_add(ticks, Ordering::Relaxed) + ticks
    }
}

impl Clock for TickClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}
