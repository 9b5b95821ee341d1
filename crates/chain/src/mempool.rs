//! The waiting-transaction pool.

use std::collections::HashMap;
use std::sync::Mutex;
use weavenode_types::{Hash, Tx};

/// Set of accepted but not-yet-mined transactions, keyed by id, with the
/// summed payload byte count the admission cap is enforced against.
///
/// The capacity check and the insertion form one critical section: two
/// concurrent admissions near the limit cannot both pass the check.
#[derive(Default)]
pub struct Mempool {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    txs: HashMap<Hash, Tx>,
    data_size: u64,
}

/// Outcome of a successful [`Mempool::try_add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admitted {
    Inserted,
    /// The id was already waiting; nothing changed.
    AlreadyPending,
}

/// The pool's summed payload bytes would exceed the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("mempool is full")]
pub struct MempoolFull;

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check capacity and insert in one critical section.
    ///
    /// `data_size_cap` is the fork-1.8 total-payload limit; `None` skips
    /// the check (pre-fork heights, or an unjoined node).
    pub fn try_add(&self, tx: Tx, data_size_cap: Option<u64>) -> Result<Admitted, MempoolFull> {
        let mut inner = self.inner.lock().expect("mempool lock poisoned");
        if inner.txs.contains_key(&tx.id) {
            return Ok(Admitted::AlreadyPending);
        }
        let added = tx.data_size();
        if let Some(cap) = data_size_cap {
            if inner.data_size + added > cap {
                return Err(MempoolFull);
            }
        }
        inner.data_size += added;
        inner.txs.insert(tx.id, tx);
        Ok(Admitted::Inserted)
    }

    /// Drop a waiting transaction, releasing its byte accounting.
    pub fn remove(&self, id: &Hash) -> Option<Tx> {
        let mut inner = self.inner.lock().expect("mempool lock poisoned");
        let tx = inner.txs.remove(id)?;
        inner.data_size -= tx.data_size();
        Some(tx)
    }

    pub fn contains(&self, id: &Hash) -> bool {
        self.inner
            .lock()
            .expect("mempool lock poisoned")
            .txs
            .contains_key(id)
    }

    /// Ids of all waiting transactions, sorted for stable output.
    pub fn pending_ids(&self) -> Vec<Hash> {
        let inner = self.inner.lock().expect("mempool lock poisoned");
        let mut ids: Vec<Hash> = inner.txs.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Snapshot of all waiting transactions.
    pub fn snapshot(&self) -> Vec<Tx> {
        self.inner
            .lock()
            .expect("mempool lock poisoned")
            .txs
            .values()
            .cloned()
            .collect()
    }

    /// Summed payload bytes of the waiting pool.
    pub fn waiting_data_size(&self) -> u64 {
        self.inner.lock().expect("mempool lock poisoned").data_size
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("mempool lock poisoned").txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
