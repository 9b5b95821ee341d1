//! Process-wide dedup cache over recently seen identifiers.

use dashmap::DashSet;
use weavenode_types::Hash;

/// Deduplication set over transaction ids, block independent hashes and
/// block-data-segment digests.
///
/// Used both for gossip loop-breaking and idempotent POST semantics.
/// [`IgnoreSet::insert`] is the compare-and-insert primitive: of two
/// concurrent admissions of the same id, exactly one observes `true`.
#[derive(Default)]
pub struct IgnoreSet {
    seen: DashSet<Hash>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an id; returns `true` if it was not already present.
    pub fn insert(&self, id: Hash) -> bool {
        self.seen.insert(id)
    }

    pub fn contains(&self, id: &Hash) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_insert_reports_first_winner() {
        let set = IgnoreSet::new();
        let id = Hash::digest(b"tx");
        assert!(set.insert(id));
        assert!(!set.insert(id));
        assert!(set.contains(&id));
    }

    #[test]
    fn test_concurrent_inserts_have_one_winner() {
        let set = Arc::new(IgnoreSet::new());
        let id = Hash::digest(b"contended");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let set = set.clone();
                std::thread::spawn(move || set.insert(id))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(set.len(), 1);
    }
}
