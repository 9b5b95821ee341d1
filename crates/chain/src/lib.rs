//! Collaborator interfaces and process-wide state for the weavenode
//! request core.
//!
//! The HTTP layer never talks to consensus, storage or gossip directly;
//! it goes through the small traits in [`traits`]. The state the request
//! core itself owns — the mempool, the ignore set, the peer blacklist
//! and the peer DB — lives here as concrete types with the concurrency
//! contracts the admission pipelines rely on.

mod blacklist;
mod error;
mod ignore_set;
pub mod memory;
mod mempool;
mod peers;
mod price;
mod traits;

pub use blacklist::PeerBlacklist;
pub use error::NodeError;
pub use ignore_set::IgnoreSet;
pub use mempool::{Admitted, Mempool, MempoolFull};
pub use peers::PeerDb;
pub use price::{estimate_tx_price, min_difficulty, min_tx_cost};
pub use traits::{
    BlockBuilder, Bridge, IpfsGateway, NoIpfsGateway, NodeState, PowValidator, ReplayPool,
    ReplayVerdict, Storage, TxSearch, WalletKeystore,
};
