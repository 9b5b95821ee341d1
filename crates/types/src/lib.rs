//! Wire types and protocol constants for the weavenode data-storage chain.
//!
//! Everything that crosses the HTTP surface lives here: 32-byte
//! identifiers ([`Hash`]), base64url byte strings ([`Base64`]),
//! transactions and their tags, block shadows, wallet entries, peers and
//! the service registry entries. All types serialize to the JSON wire
//! format with byte fields base64url-encoded.

mod block;
pub mod constants;
mod encoding;
mod hash;
mod peer;
mod service;
mod tx;
mod wallet;

pub use block::{Block, BlockShadow, RecallHint};
pub use encoding::Base64;
pub use hash::{Hash, HashDecodeError};
pub use peer::{Peer, PeerParseError};
pub use service::Service;
pub use tx::{Tag, Tx};
pub use wallet::WalletEntry;
