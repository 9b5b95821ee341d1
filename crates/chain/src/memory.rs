//! In-memory collaborator implementations.
//!
//! Real implementations of the trait seams, backed by process memory.
//! The node binary wires these in when no external subsystems are
//! configured, and the HTTP tests drive the full router against them.

use crate::{
    BlockBuilder, Bridge, NodeError, NodeState, PowValidator, ReplayPool, ReplayVerdict,
    Storage, TxSearch, WalletKeystore,
};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use weavenode_types::constants::{
    MAX_FUTURE_DRIFT_SECS, MAX_PAST_DRIFT_SECS, MAX_TX_ANCHOR_DEPTH,
};
use weavenode_types::{Base64, Block, BlockShadow, Hash, Peer, RecallHint, Tag, Tx, WalletEntry};

/// One coherent view of the node's consensus cursors.
#[derive(Debug, Clone, Default)]
pub struct NodeSnapshot {
    /// Current height; `None` until the node has joined.
    pub height: Option<u64>,
    pub current_block: Option<Hash>,
    /// Newest first; length is height + 1 once joined.
    pub hash_list: Vec<Hash>,
    pub wallets: Vec<WalletEntry>,
    /// Difficulty of the next block.
    pub diff: u64,
    /// Difficulty of the current head.
    pub current_diff: u64,
    /// (block hash, tx ids) pairs, newest first.
    pub block_txs_pairs: Vec<(Hash, Vec<Hash>)>,
    pub blocks_on_disk: u64,
}

/// Node state served from an atomically swapped snapshot.
///
/// Writers install whole snapshots; readers never block. A test hook can
/// force reads to fail the way a timed-out cross-task read would.
#[derive(Default)]
pub struct InMemoryNode {
    snapshot: ArcSwap<NodeSnapshot>,
    unavailable: AtomicBool,
}

impl InMemoryNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn joined(snapshot: NodeSnapshot) -> Self {
        let node = Self::new();
        node.install(snapshot);
        node
    }

    /// Install a new snapshot.
    pub fn install(&self, snapshot: NodeSnapshot) {
        self.snapshot.store(Arc::new(snapshot));
    }

    pub fn snapshot(&self) -> Arc<NodeSnapshot> {
        self.snapshot.load_full()
    }

    /// Make wallet reads fail with [`NodeError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), NodeError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(NodeError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl NodeState for InMemoryNode {
    fn height(&self) -> Option<u64> {
        self.snapshot.load().height
    }

    fn current_block_hash(&self) -> Option<Hash> {
        self.snapshot.load().current_block
    }

    fn hash_list(&self) -> Vec<Hash> {
        self.snapshot.load().hash_list.clone()
    }

    fn wallet_list(&self) -> Vec<WalletEntry> {
        self.snapshot.load().wallets.clone()
    }

    fn balance(&self, address: &Hash) -> Result<u64, NodeError> {
        self.check_available()?;
        let snap = self.snapshot.load();
        Ok(snap
            .wallets
            .iter()
            .find(|w| w.address == *address)
            .map(|w| w.balance)
            .unwrap_or(0))
    }

    fn last_tx(&self, address: &Hash) -> Result<Hash, NodeError> {
        self.check_available()?;
        let snap = self.snapshot.load();
        Ok(snap
            .wallets
            .iter()
            .find(|w| w.address == *address)
            .map(|w| w.last_tx)
            .unwrap_or(Hash::ZERO))
    }

    fn diff(&self) -> u64 {
        self.snapshot.load().diff
    }

    fn current_diff(&self) -> u64 {
        self.snapshot.load().current_diff
    }

    fn block_txs_pairs(&self) -> Vec<(Hash, Vec<Hash>)> {
        self.snapshot.load().block_txs_pairs.clone()
    }

    fn blocks_on_disk(&self) -> u64 {
        self.snapshot.load().blocks_on_disk
    }
}

/// Transaction and block files held in maps instead of on disk.
#[derive(Default)]
pub struct InMemoryStorage {
    txs: DashMap<Hash, Vec<u8>>,
    blocks: DashMap<Hash, Vec<u8>>,
    heights: DashMap<u64, Hash>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_tx(&self, tx: &Tx) {
        let bytes = serde_json::to_vec(tx).expect("tx serializes");
        self.txs.insert(tx.id, bytes);
    }

    pub fn put_block(&self, shadow: &BlockShadow) {
        let bytes = serde_json::to_vec(shadow).expect("shadow serializes");
        self.heights.insert(shadow.height, shadow.indep_hash);
        self.blocks.insert(shadow.indep_hash, bytes);
    }
}

impl Storage for InMemoryStorage {
    fn lookup_tx(&self, id: &Hash) -> Option<Vec<u8>> {
        self.txs.get(id).map(|b| b.value().clone())
    }

    fn lookup_block_by_hash(&self, hash: &Hash) -> Option<Vec<u8>> {
        self.blocks.get(hash).map(|b| b.value().clone())
    }

    fn lookup_block_by_height(&self, height: u64) -> Option<Vec<u8>> {
        let hash = *self.heights.get(&height)?;
        self.lookup_block_by_hash(&hash)
    }
}

/// Tag index with insertion-recency canonical order.
#[derive(Default)]
pub struct InMemoryTxSearch {
    entries: DashMap<(Vec<u8>, Vec<u8>), Vec<Hash>>,
    tags: DashMap<Hash, Vec<Tag>>,
    seq: DashMap<Hash, u64>,
    counter: AtomicU64,
}

impl InMemoryTxSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a transaction's tags. Later calls are "newer" in the
    /// canonical order.
    pub fn index(&self, id: Hash, tags: Vec<Tag>) {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst);
        self.seq.insert(id, seq);
        for tag in &tags {
            self.entries
                .entry((tag.name.0.clone(), tag.value.0.clone()))
                .or_default()
                .push(id);
        }
        self.tags.insert(id, tags);
    }
}

impl TxSearch for InMemoryTxSearch {
    fn entries(&self, name: &[u8], value: &[u8]) -> Vec<Hash> {
        self.entries
            .get(&(name.to_vec(), value.to_vec()))
            .map(|ids| ids.value().clone())
            .unwrap_or_default()
    }

    fn tags_by_id(&self, id: &Hash) -> Vec<Tag> {
        self.tags
            .get(id)
            .map(|t| t.value().clone())
            .unwrap_or_default()
    }

    fn sort_txids(&self, mut ids: Vec<Hash>) -> Vec<Hash> {
        // newest first; ids the index has never seen sort last
        ids.sort_by_key(|id| {
            let seq = self.seq.get(id).map(|s| *s.value());
            (std::cmp::Reverse(seq), *id)
        });
        ids
    }
}

/// Bridge that records hand-offs in memory.
#[derive(Default)]
pub struct LocalBridge {
    peers: Mutex<Vec<Peer>>,
    txs: Mutex<Vec<Tx>>,
    blocks: Mutex<Vec<(Peer, Block, Hash, RecallHint)>>,
}

impl LocalBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remote_peers(&self) -> Vec<Peer> {
        self.peers.lock().expect("bridge lock").clone()
    }

    pub fn dispatched_txs(&self) -> Vec<Tx> {
        self.txs.lock().expect("bridge lock").clone()
    }

    pub fn dispatched_block_count(&self) -> usize {
        self.blocks.lock().expect("bridge lock").len()
    }

    pub fn dispatched_blocks(&self) -> Vec<(Peer, Block, Hash, RecallHint)> {
        self.blocks.lock().expect("bridge lock").clone()
    }
}

impl Bridge for LocalBridge {
    fn add_remote_peer(&self, peer: Peer) {
        debug!(%peer, "bridge: new remote peer");
        self.peers.lock().expect("bridge lock").push(peer);
    }

    fn add_tx(&self, tx: Tx) {
        debug!(id = %tx.id, "bridge: tx dispatched");
        self.txs.lock().expect("bridge lock").push(tx);
    }

    fn add_block(&self, peer: Peer, block: Block, bds: Hash, recall: RecallHint) {
        debug!(%peer, indep_hash = %block.shadow.indep_hash, "bridge: block dispatched");
        self.blocks
            .lock()
            .expect("bridge lock")
            .push((peer, block, bds, recall));
    }
}

/// Leading-zero-bits proof of work over `digest(bds || nonce)`.
pub struct HashPow;

impl HashPow {
    /// Find a nonce satisfying the difficulty. Test and demo helper;
    /// difficulty must be small enough to brute-force.
    pub fn mine_nonce(bds: &[u8], diff: u64) -> Vec<u8> {
        for counter in 0u64.. {
            let nonce = counter.to_be_bytes().to_vec();
            if Hash::digest_parts(&[bds, &nonce]).leading_zero_bits() as u64 >= diff {
                return nonce;
            }
        }
        unreachable!("nonce space exhausted")
    }
}

impl PowValidator for HashPow {
    fn validate(&self, bds: &[u8], nonce: &[u8], diff: u64, _height: u64) -> bool {
        Hash::digest_parts(&[bds, nonce]).leading_zero_bits() as u64 >= diff
    }
}

/// Block builder over the in-memory node state.
pub struct SimpleBlockBuilder {
    node: Arc<dyn NodeState>,
}

impl SimpleBlockBuilder {
    pub fn new(node: Arc<dyn NodeState>) -> Self {
        Self { node }
    }

    fn now_unix() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before epoch")
            .as_secs() as i64
    }
}

impl BlockBuilder for SimpleBlockBuilder {
    fn verify_timestamp(&self, shadow: &BlockShadow) -> bool {
        let now = Self::now_unix();
        shadow.timestamp >= now - MAX_PAST_DRIFT_SECS
            && shadow.timestamp <= now + MAX_FUTURE_DRIFT_SECS
    }

    fn generate_block_from_shadow(
        &self,
        shadow: &BlockShadow,
        _recall_size: u64,
    ) -> Result<Block, NodeError> {
        Ok(Block::from_shadow(
            shadow.clone(),
            self.node.hash_list(),
            self.node.wallet_list(),
        ))
    }
}

/// Replay-protection verifier over in-memory state.
///
/// Checks, in order: the id/signature binding, presence on the recent
/// weave, presence in the waiting pool, then the anchor. Anchors may
/// name a block within the last [`MAX_TX_ANCHOR_DEPTH`] blocks or the
/// wallet's recorded last transaction.
pub struct SimpleReplayPool;

impl SimpleReplayPool {
    fn signature_ok(tx: &Tx) -> bool {
        if tx.id != Hash::digest(tx.signature.as_slice()) {
            return false;
        }
        let Ok(owner_bytes) = <[u8; 32]>::try_from(tx.owner.as_slice()) else {
            return false;
        };
        let Ok(key) = VerifyingKey::from_bytes(&owner_bytes) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(tx.signature.as_slice()) else {
            return false;
        };
        let signature = Signature::from_bytes(&sig_bytes);
        key.verify(&tx.signature_payload(), &signature).is_ok()
    }
}

impl ReplayPool for SimpleReplayPool {
    fn verify_tx(
        &self,
        tx: &Tx,
        _diff: u64,
        _height: u64,
        block_txs_pairs: &[(Hash, Vec<Hash>)],
        mempool: &[Tx],
        wallets: &[WalletEntry],
    ) -> ReplayVerdict {
        if !Self::signature_ok(tx) {
            return ReplayVerdict::InvalidSignature;
        }
        if block_txs_pairs.iter().any(|(_, ids)| ids.contains(&tx.id)) {
            return ReplayVerdict::AlreadyInWeave;
        }
        if mempool.iter().any(|waiting| waiting.id == tx.id) {
            return ReplayVerdict::AlreadyInMempool;
        }
        if mempool.iter().any(|waiting| waiting.id == tx.last_tx) {
            return ReplayVerdict::LastTxInMempool;
        }
        let anchor_window = block_txs_pairs.iter().take(MAX_TX_ANCHOR_DEPTH);
        let anchored_on_weave = anchor_window
            .map(|(hash, _)| *hash)
            .any(|hash| hash == tx.last_tx);
        let owner = tx.owner_address();
        let anchored_on_wallet = wallets
            .iter()
            .find(|w| w.address == owner)
            .map(|w| w.last_tx)
            .unwrap_or(Hash::ZERO)
            == tx.last_tx;
        if anchored_on_weave || anchored_on_wallet {
            ReplayVerdict::Valid
        } else {
            ReplayVerdict::BadAnchor
        }
    }
}

/// Ed25519 keystore held in memory.
pub struct InMemoryKeystore {
    server: SigningKey,
    keyfiles: DashMap<String, SigningKey>,
}

impl InMemoryKeystore {
    /// Generate a fresh server keypair.
    pub fn generate() -> Self {
        Self {
            server: SigningKey::generate(&mut rand::rngs::OsRng),
            keyfiles: DashMap::new(),
        }
    }

    /// Build from a known server key (deterministic tests).
    pub fn with_server_key(server: SigningKey) -> Self {
        Self {
            server,
            keyfiles: DashMap::new(),
        }
    }

    pub fn keyfile_count(&self) -> usize {
        self.keyfiles.len()
    }
}

impl WalletKeystore for InMemoryKeystore {
    fn new_keyfile(&self, access_code: &str) -> Result<Hash, NodeError> {
        if self.keyfiles.contains_key(access_code) {
            return Err(NodeError::Keystore("access code already used".into()));
        }
        let key = SigningKey::generate(&mut rand::rngs::OsRng);
        let address = Hash::digest(key.verifying_key().as_bytes());
        self.keyfiles.insert(access_code.to_string(), key);
        Ok(address)
    }

    fn server_keypair(&self) -> Result<SigningKey, NodeError> {
        Ok(self.server.clone())
    }
}

/// Sign a transaction with the given key: fills owner and signature and
/// derives the id from the signature digest.
pub fn sign_tx(mut tx: Tx, key: &SigningKey) -> Tx {
    tx.owner = Base64::from(key.verifying_key().as_bytes().as_slice());
    let signature = key.sign(&tx.signature_payload());
    tx.signature = Base64::from(signature.to_bytes().as_slice());
    tx.id = Hash::digest(tx.signature.as_slice());
    tx
}
