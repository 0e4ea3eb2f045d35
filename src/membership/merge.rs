//! Merge engine: reconciles an incoming snapshot against the local table.

use super::protocol::PeerDigest;
use super::types::{MembershipTable, PeerId, PeerObserver};

/// Folds `incoming` into `table` under the monotonic-heartbeat rule.
///
/// Unknown peers are inserted and reported through `observer` — this is how
/// new members are discovered, whether learned directly from a join request
/// or transitively from a third party's gossip. Known peers advance only on a
/// strictly newer heartbeat, in which case `last_updated` is stamped with the
/// local `now`. Stale or duplicate evidence never touches the table, which is
/// what keeps timeout-based failure detection meaningful under reordered and
/// duplicated delivery.
pub fn merge(
    table: &mut MembershipTable,
    incoming: &[PeerDigest],
    now: u64,
    local_id: PeerId,
    observer: &dyn PeerObserver,
) {
    for digest in incoming {
        // Sender timestamps are never trusted; freshness is always local.
        if table.upsert(digest.id, digest.heartbeat, now) {
            observer.peer_added(local_id, digest.id);
        }
    }
}
