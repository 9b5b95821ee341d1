//! Peer blacklist with expiring bans.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use weavenode_types::Peer;

/// Maps banned peers to their ban expiry. Expired entries are dropped
/// lazily on the next read.
#[derive(Default)]
pub struct PeerBlacklist {
    bans: DashMap<Peer, Instant>,
}

impl PeerBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ban a peer for the given duration, extending any existing ban.
    pub fn ban(&self, peer: Peer, duration: Duration) {
        self.bans.insert(peer, Instant::now() + duration);
    }

    /// Whether the peer currently holds an unexpired ban.
    pub fn is_banned(&self, peer: &Peer) -> bool {
        // copy the expiry out before touching the map again; holding the
        // read guard across a remove would deadlock on the shard lock
        let expiry = match self.bans.get(peer) {
            Some(entry) => *entry,
            None => return false,
        };
        if expiry > Instant::now() {
            true
        } else {
            self.bans.remove(peer);
            false
        }
    }
}
