//! Shared state for the HTTP core.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};
use weavenode_chain::{
    BlockBuilder, Bridge, IgnoreSet, IpfsGateway, Mempool, NoIpfsGateway, NodeState,
    PeerBlacklist, PeerDb, PowValidator, ReplayPool, Storage, TxSearch, WalletKeystore,
};
use weavenode_types::constants::{
    ARQL_CONCURRENCY, HANDLER_TIMEOUT, TOTAL_WAITING_TXS_DATA_SIZE_LIMIT,
};
use weavenode_types::Service;

/// API behavior flags.
///
/// The original node read these from its metadata store per request;
/// here they are plain configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Emit a structured log line per handled request.
    #[serde(default)]
    pub http_logging: bool,

    /// Serve version-1 block format to legacy clients.
    #[serde(default = "default_true")]
    pub api_compat: bool,

    /// Allow `/block/{..}/{field}` subfield queries.
    #[serde(default = "default_true")]
    pub subfield_queries: bool,

    /// Shared secret for the privileged endpoints; `None` disables them.
    #[serde(default)]
    pub internal_api_secret: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            http_logging: false,
            api_compat: true,
            subfield_queries: true,
            internal_api_secret: None,
        }
    }
}

/// Shared state for all handlers.
///
/// Collaborator subsystems are trait objects; the mempool, ignore set,
/// blacklist and peer DB are the process-wide state the request core
/// itself owns.
#[derive(Clone)]
pub struct ApiState {
    pub node: Arc<dyn NodeState>,
    pub storage: Arc<dyn Storage>,
    pub search: Arc<dyn TxSearch>,
    pub bridge: Arc<dyn Bridge>,
    pub pow: Arc<dyn PowValidator>,
    pub builder: Arc<dyn BlockBuilder>,
    pub replay: Arc<dyn ReplayPool>,
    pub keystore: Arc<dyn WalletKeystore>,
    pub ipfs: Arc<dyn IpfsGateway>,
    /// Waiting transactions; check-and-insert is one critical section.
    pub mempool: Arc<Mempool>,
    /// Process-wide dedup over recently seen identifiers.
    pub ignored: Arc<IgnoreSet>,
    pub blacklist: Arc<PeerBlacklist>,
    pub peers: Arc<PeerDb>,
    /// Bounds concurrent tag-search load.
    pub arql_gate: Arc<Semaphore>,
    /// Serializes hash-list reads; acquired without a deadline.
    pub hash_list_gate: Arc<Semaphore>,
    pub services: Arc<RwLock<Vec<Service>>>,
    pub config: Arc<ApiConfig>,
    /// Hard deadline for a single request.
    pub handler_timeout: Duration,
    /// Fork-1.8 cap on summed waiting-tx payload bytes.
    pub mempool_data_limit: u64,
}

impl ApiState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        node: Arc<dyn NodeState>,
        storage: Arc<dyn Storage>,
        search: Arc<dyn TxSearch>,
        bridge: Arc<dyn Bridge>,
        pow: Arc<dyn PowValidator>,
        builder: Arc<dyn BlockBuilder>,
        replay: Arc<dyn ReplayPool>,
        keystore: Arc<dyn WalletKeystore>,
        config: ApiConfig,
    ) -> Self {
        Self {
            node,
            storage,
            search,
            bridge,
            pow,
            builder,
            replay,
            keystore,
            ipfs: Arc::new(NoIpfsGateway),
            mempool: Arc::new(Mempool::new()),
            ignored: Arc::new(IgnoreSet::new()),
            blacklist: Arc::new(PeerBlacklist::new()),
            peers: Arc::new(PeerDb::new()),
            arql_gate: Arc::new(Semaphore::new(ARQL_CONCURRENCY)),
            hash_list_gate: Arc::new(Semaphore::new(1)),
            services: Arc::new(RwLock::new(Vec::new())),
            config: Arc::new(config),
            handler_timeout: HANDLER_TIMEOUT,
            mempool_data_limit: TOTAL_WAITING_TXS_DATA_SIZE_LIMIT,
        }
    }

    /// Replace the IPFS delegation target.
    pub fn with_ipfs(mut self, ipfs: Arc<dyn IpfsGateway>) -> Self {
        self.ipfs = ipfs;
        self
    }
}
