//! Collaborator interfaces.
//!
//! Each external subsystem the request core touches is hidden behind a
//! small synchronous trait. Implementations hold in-memory snapshots or
//! forward to their owning task; reads that the backing node cannot
//! serve in time return [`NodeError::Unavailable`].

use crate::NodeError;
use weavenode_types::{Block, BlockShadow, Hash, Peer, RecallHint, Tag, Tx, WalletEntry};

/// Read access to the node's consensus state.
pub trait NodeState: Send + Sync {
    /// Current height, `None` until the node has joined the network.
    fn height(&self) -> Option<u64>;

    /// Independent hash of the current head, `None` until joined.
    fn current_block_hash(&self) -> Option<Hash>;

    /// The hash list (BHL), newest first. Its length equals height + 1.
    fn hash_list(&self) -> Vec<Hash>;

    /// The wallet list, ordered by address.
    fn wallet_list(&self) -> Vec<WalletEntry>;

    /// Balance of an address; absent wallets hold zero.
    fn balance(&self, address: &Hash) -> Result<u64, NodeError>;

    /// Identifier of the last transaction an address signed.
    fn last_tx(&self, address: &Hash) -> Result<Hash, NodeError>;

    /// Difficulty the next block will be mined at.
    fn diff(&self) -> u64;

    /// Difficulty of the current head.
    fn current_diff(&self) -> u64;

    /// (block hash, tx ids) pairs for the recent weave, newest first.
    fn block_txs_pairs(&self) -> Vec<(Hash, Vec<Hash>)>;

    fn is_joined(&self) -> bool {
        self.height().is_some()
    }

    /// Number of full blocks held on disk.
    fn blocks_on_disk(&self) -> u64;
}

/// Read access to persisted blocks and transactions.
pub trait Storage: Send + Sync {
    /// Serialized transaction JSON, if the tx has been written to disk.
    fn lookup_tx(&self, id: &Hash) -> Option<Vec<u8>>;

    /// Serialized block shadow JSON by independent hash.
    fn lookup_block_by_hash(&self, hash: &Hash) -> Option<Vec<u8>>;

    /// Serialized block shadow JSON by height.
    fn lookup_block_by_height(&self, height: u64) -> Option<Vec<u8>>;
}

/// The tag-indexed transaction search backend.
pub trait TxSearch: Send + Sync {
    /// Transaction ids carrying the given tag, in index order.
    fn entries(&self, name: &[u8], value: &[u8]) -> Vec<Hash>;

    /// All indexed tags of a transaction, including the synthetic
    /// `block_height` / `block_indep_hash` entries written at mining
    /// time.
    fn tags_by_id(&self, id: &Hash) -> Vec<Tag>;

    /// Order ids by the index's canonical order, newest first.
    fn sort_txids(&self, ids: Vec<Hash>) -> Vec<Hash>;
}

/// Hand-off to the gossip/bridge subsystem.
pub trait Bridge: Send + Sync {
    /// Register a peer we have not seen before.
    fn add_remote_peer(&self, peer: Peer);

    /// Dispatch an admitted transaction for gossip and mining.
    fn add_tx(&self, tx: Tx);

    /// Dispatch an accepted, reconstructed block.
    fn add_block(&self, peer: Peer, block: Block, bds: Hash, recall: RecallHint);
}

/// Proof-of-work validation.
pub trait PowValidator: Send + Sync {
    /// Check the PoW over (block data segment, nonce) at the given
    /// difficulty and height.
    fn validate(&self, bds: &[u8], nonce: &[u8], diff: u64, height: u64) -> bool;
}

/// Block reconstruction and timestamp checks.
pub trait BlockBuilder: Send + Sync {
    /// Whether the shadow's timestamp is within the acceptable skew
    /// window around local time.
    fn verify_timestamp(&self, shadow: &BlockShadow) -> bool;

    /// Materialize a full block from a gossiped shadow.
    fn generate_block_from_shadow(
        &self,
        shadow: &BlockShadow,
        recall_size: u64,
    ) -> Result<Block, NodeError>;
}

/// Verdict of the replay-pool verifier on a candidate transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayVerdict {
    Valid,
    /// Signature or id does not verify.
    InvalidSignature,
    /// The anchor names a transaction still waiting in the mempool.
    LastTxInMempool,
    /// The anchor is outside the accepted window.
    BadAnchor,
    AlreadyInWeave,
    AlreadyInMempool,
}

/// Replay-protection and signature verification for mempool admission.
pub trait ReplayPool: Send + Sync {
    /// Verify a candidate against the recent weave, the waiting pool and
    /// the wallet list. `mempool` excludes the candidate itself.
    fn verify_tx(
        &self,
        tx: &Tx,
        diff: u64,
        height: u64,
        block_txs_pairs: &[(Hash, Vec<Hash>)],
        mempool: &[Tx],
        wallets: &[WalletEntry],
    ) -> ReplayVerdict;
}

/// The wallet keystore backing the internal API.
pub trait WalletKeystore: Send + Sync {
    /// Create a keyfile addressable by the given access code; returns
    /// the new wallet address.
    fn new_keyfile(&self, access_code: &str) -> Result<Hash, NodeError>;

    /// The node's own signing key, used by the unsigned-tx endpoint.
    fn server_keypair(&self) -> Result<ed25519_dalek::SigningKey, NodeError>;
}

/// Delegation target for `/api/ipfs/*` requests.
pub trait IpfsGateway: Send + Sync {
    /// Handle a delegated request; returns (status, body).
    fn handle(&self, method: &str, path: &str, body: &[u8]) -> (u16, Vec<u8>);
}

/// Placeholder gateway used when no IPFS adapter is wired in.
pub struct NoIpfsGateway;

impl IpfsGateway for NoIpfsGateway {
    fn handle(&self, _method: &str, _path: &str, _body: &[u8]) -> (u16, Vec<u8>) {
        (404, b"IPFS handler not configured.".to_vec())
    }
}
