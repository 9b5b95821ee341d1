//! Protocol constants.

use std::time::Duration;

/// Network identifier checked on peer announcements.
pub const NETWORK_NAME: &str = "weavenet.1";

/// Protocol version advertised in node info.
pub const PROTOCOL_VERSION: u32 = 5;

/// Release number advertised in node info.
pub const RELEASE_NUMBER: u32 = 51;

/// Hard wall-clock deadline for a single request handler.
pub const HANDLER_TIMEOUT: Duration = Duration::from_secs(55);

/// Maximum accepted request body size in bytes.
pub const MAX_BODY_SIZE: usize = 15 * 1024 * 1024;

/// Cap on the summed data payload bytes of all waiting transactions.
///
/// Enforced from [`FORK_HEIGHT_1_8`] onward; before the fork the mempool
/// accepts without a size check.
pub const TOTAL_WAITING_TXS_DATA_SIZE_LIMIT: u64 = 250 * 1024 * 1024;

/// Height at which the mempool data-size cap activates.
pub const FORK_HEIGHT_1_8: u64 = 80_000;

/// How deep into the hash list a transaction anchor may reach.
pub const MAX_TX_ANCHOR_DEPTH: usize = 18;

/// Accepted height window around the current height for gossiped blocks.
pub const STORE_BLOCKS_BEHIND_CURRENT: u64 = 50;

/// Ban duration for a peer that submitted a block with invalid PoW.
pub const BAD_POW_BAN_TIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Minimum difficulty a gossiped block must carry, in leading zero bits.
pub const MIN_DIFF: u64 = 8;

/// Default peer-to-peer port, used when `x-p2p-port` is absent.
pub const DEFAULT_P2P_PORT: u16 = 1984;

/// Default HTTP listen port.
pub const DEFAULT_HTTP_PORT: u16 = 1984;

/// Block timestamps may lag behind local time by this much.
pub const MAX_PAST_DRIFT_SECS: i64 = 600;

/// Block timestamps may run ahead of local time by this much.
pub const MAX_FUTURE_DRIFT_SECS: i64 = 15;

/// Concurrent tag-search evaluations admitted by the ARQL gate.
pub const ARQL_CONCURRENCY: usize = 10;

/// How long an ARQL request waits for a gate permit before giving up.
pub const ARQL_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Flat byte overhead charged on every transaction by the fee formula.
pub const BASE_TX_BYTES: u64 = 3210;

/// Price numerator per charged byte.
pub const BYTE_PRICE: u64 = 100_000;

/// Surcharge applied when a transaction targets a wallet the node has
/// never seen.
pub const WALLET_GEN_FEE: u64 = 250_000_000;
