//! Known-peer bookkeeping.

use dashmap::DashSet;
use weavenode_types::Peer;

/// The set of peers that have spoken to this node.
///
/// [`PeerDb::record`] reports first sightings so the caller can announce
/// new peers to the bridge exactly once.
#[derive(Default)]
pub struct PeerDb {
    peers: DashSet<Peer>,
}

impl PeerDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a peer; returns `true` on first sighting.
    pub fn record(&self, peer: Peer) -> bool {
        self.peers.insert(peer)
    }

    /// All known peers, unordered.
    pub fn all(&self) -> Vec<Peer> {
        self.peers.iter().map(|p| *p).collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_record_reports_first_sighting() {
        let db = PeerDb::new();
        let peer = Peer::new(Ipv4Addr::new(9, 8, 7, 6), 1984);
        assert!(db.record(peer));
        assert!(!db.record(peer));
        assert_eq!(db.all(), vec![peer]);
    }
}
