//! Shared fixtures for driving the full router in tests.

use crate::state::{ApiConfig, ApiState};
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use weavenode_chain::memory::{
    InMemoryKeystore, InMemoryNode, InMemoryStorage, InMemoryTxSearch, LocalBridge, NodeSnapshot,
    SimpleBlockBuilder,
};
use weavenode_chain::{PowValidator, ReplayPool, ReplayVerdict};
use weavenode_types::constants::MIN_DIFF;
use weavenode_types::{Base64, BlockShadow, Hash, Tx, WalletEntry};

/// Replay verifier with a scripted verdict and a call counter.
#[derive(Default)]
pub(crate) struct ScriptedReplay {
    verdict: Mutex<Option<ReplayVerdict>>,
    calls: AtomicUsize,
}

impl ScriptedReplay {
    pub(crate) fn set_verdict(&self, verdict: ReplayVerdict) {
        *self.verdict.lock().unwrap() = Some(verdict);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReplayPool for ScriptedReplay {
    fn verify_tx(
        &self,
        _tx: &Tx,
        _diff: u64,
        _height: u64,
        _block_txs_pairs: &[(Hash, Vec<Hash>)],
        _mempool: &[Tx],
        _wallets: &[WalletEntry],
    ) -> ReplayVerdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict.lock().unwrap().unwrap_or(ReplayVerdict::Valid)
    }
}

/// PoW validator with a scripted outcome (valid by default).
pub(crate) struct ScriptedPow {
    valid: AtomicBool,
}

impl Default for ScriptedPow {
    fn default() -> Self {
        Self {
            valid: AtomicBool::new(true),
        }
    }
}

impl ScriptedPow {
    pub(crate) fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::SeqCst);
    }
}

impl PowValidator for ScriptedPow {
    fn validate(&self, _bds: &[u8], _nonce: &[u8], _diff: u64, _height: u64) -> bool {
        self.valid.load(Ordering::SeqCst)
    }
}

/// A full state built over in-memory collaborators, with handles to the
/// concrete types for scripting and inspection.
pub(crate) struct TestEnv {
    pub(crate) state: ApiState,
    pub(crate) node: Arc<InMemoryNode>,
    pub(crate) storage: Arc<InMemoryStorage>,
    pub(crate) search: Arc<InMemoryTxSearch>,
    pub(crate) bridge: Arc<LocalBridge>,
    pub(crate) pow: Arc<ScriptedPow>,
    pub(crate) replay: Arc<ScriptedReplay>,
    pub(crate) keystore: Arc<InMemoryKeystore>,
}

impl TestEnv {
    /// Fresh unjoined node, default config.
    pub(crate) fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub(crate) fn with_config(configure: impl FnOnce(&mut ApiConfig)) -> Self {
        let mut config = ApiConfig::default();
        configure(&mut config);

        let node = Arc::new(InMemoryNode::new());
        let storage = Arc::new(InMemoryStorage::new());
        let search = Arc::new(InMemoryTxSearch::new());
        let bridge = Arc::new(LocalBridge::new());
        let pow = Arc::new(ScriptedPow::default());
        let replay = Arc::new(ScriptedReplay::default());
        let keystore = Arc::new(InMemoryKeystore::generate());
        let builder = Arc::new(SimpleBlockBuilder::new(node.clone()));

        let state = ApiState::new(
            node.clone(),
            storage.clone(),
            search.clone(),
            bridge.clone(),
            pow.clone(),
            builder,
            replay.clone(),
            keystore.clone(),
            config,
        );

        Self {
            state,
            node,
            storage,
            search,
            bridge,
            pow,
            replay,
            keystore,
        }
    }

    /// Joined node at the given height, with a populated hash list.
    pub(crate) fn joined(height: u64) -> Self {
        let env = Self::new();
        let hash_list: Vec<Hash> = (0..=height)
            .rev()
            .map(|h| Hash::digest(format!("block-hash-{h}").as_bytes()))
            .collect();
        env.node.install(NodeSnapshot {
            height: Some(height),
            current_block: Some(hash_list[0]),
            hash_list,
            wallets: Vec::new(),
            diff: 12,
            current_diff: 10,
            block_txs_pairs: Vec::new(),
            blocks_on_disk: height + 1,
        });
        env
    }

    pub(crate) fn router(&self) -> Router {
        crate::routes::create_router(self.state.clone())
    }

    /// Credit the tx owner with a comfortable balance.
    pub(crate) fn fund(&self, tx: &Tx) {
        self.fund_with(tx, 1_000_000_000);
    }

    pub(crate) fn fund_with(&self, tx: &Tx, balance: u64) {
        let mut snapshot = self.node.snapshot().as_ref().clone();
        snapshot.wallets.push(wallet_for(tx, balance));
        self.node.install(snapshot);
    }
}

/// Wallet entry for the tx owner.
pub(crate) fn wallet_for(tx: &Tx, balance: u64) -> WalletEntry {
    WalletEntry::new(tx.owner_address(), balance)
}

/// A structurally complete tx with a seed-derived id. All sample txs
/// share one owner so balance tests can stack them on one wallet.
pub(crate) fn sample_tx(seed: &[u8], data_len: usize) -> Tx {
    Tx {
        id: Hash::digest(seed),
        last_tx: Hash::ZERO,
        owner: Base64::from(&b"test-owner-key"[..]),
        target: Base64::empty(),
        quantity: 0,
        data: Base64(vec![0u8; data_len]),
        reward: 1,
        signature: Base64::from(seed),
        tags: Vec::new(),
    }
}

/// A shadow at the given height with a fresh timestamp.
pub(crate) fn sample_shadow(height: u64) -> BlockShadow {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    BlockShadow {
        indep_hash: Hash::digest(format!("block-{height}").as_bytes()),
        previous_block: Hash::digest(format!("block-{}", height.saturating_sub(1)).as_bytes()),
        height,
        diff: MIN_DIFF + 2,
        nonce: Base64::from(&b"nonce"[..]),
        timestamp: now,
        last_retarget: now - 120,
        reward_addr: Base64::empty(),
        txs: Vec::new(),
        wallet_list_hash: Hash::digest(b"wallet-root"),
        hash_list_hash: Hash::digest(b"hash-root"),
    }
}

/// A complete `POST /block` body for the given height, as mutable JSON.
pub(crate) fn sample_post_block(height: u64) -> serde_json::Value {
    let shadow = sample_shadow(height);
    serde_json::json!({
        "new_block": shadow,
        "recall_block": Hash::digest(format!("recall-{height}").as_bytes()),
        "recall_size": 1024,
        "block_data_segment": Base64::from(format!("segment-{height}").as_bytes()),
        "key": Base64::empty(),
        "nonce": Base64::empty(),
    })
}

const TEST_PEER: [u8; 4] = [1, 2, 3, 4];

fn with_peer(mut req: Request<Body>, ip: [u8; 4]) -> Request<Body> {
    let addr = SocketAddr::from((ip, 40000));
    req.extensions_mut().insert(ConnectInfo(addr));
    req
}

pub(crate) fn get_request(uri: &str) -> Request<Body> {
    with_peer(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
        TEST_PEER,
    )
}

pub(crate) fn get_request_with_header(uri: &str, name: &str, value: &str) -> Request<Body> {
    with_peer(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(name, value)
            .body(Body::empty())
            .unwrap(),
        TEST_PEER,
    )
}

pub(crate) fn request_with_body(method: Method, uri: &str, body: Vec<u8>) -> Request<Body> {
    with_peer(
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
        TEST_PEER,
    )
}

pub(crate) fn post_json<T: Serialize>(uri: &str, value: &T) -> Request<Body> {
    request_with_body(
        Method::POST,
        uri,
        serde_json::to_vec(value).expect("serializable"),
    )
}

/// `POST /block` from a specific peer ip.
pub(crate) fn post_block_request(body: &serde_json::Value, ip: [u8; 4]) -> Request<Body> {
    with_peer(
        Request::builder()
            .method(Method::POST)
            .uri("/block")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).expect("serializable")))
            .unwrap(),
        ip,
    )
}

/// Privileged request with an optional secret header.
pub(crate) fn internal_request(
    uri: &str,
    secret: Option<&str>,
    body: Option<Vec<u8>>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(secret) = secret {
        builder = builder.header("x-internal-api-secret", secret);
    }
    with_peer(
        builder.body(Body::from(body.unwrap_or_default())).unwrap(),
        TEST_PEER,
    )
}

pub(crate) async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024 * 1024)
        .await
        .expect("drain body");
    String::from_utf8_lossy(&bytes).into_owned()
}

pub(crate) async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).expect("json body")
}
