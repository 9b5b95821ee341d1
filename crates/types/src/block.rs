//! Block shadows and full blocks.

use crate::{Base64, Hash, WalletEntry};
use serde::{Deserialize, Serialize};

/// The subset of a block a peer transmits for gossip.
///
/// A full [`Block`] is reconstructable from a shadow plus a recall-size
/// hint by the block builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockShadow {
    /// Independent hash identifying the block.
    pub indep_hash: Hash,
    /// Independent hash of the previous block.
    pub previous_block: Hash,
    pub height: u64,
    /// Difficulty the block was mined at, in leading zero bits.
    pub diff: u64,
    /// Proof-of-work nonce.
    pub nonce: Base64,
    /// Unix seconds the block was mined at.
    pub timestamp: i64,
    /// Unix seconds of the last difficulty retarget.
    pub last_retarget: i64,
    /// Address credited with the mining reward; empty if unclaimed.
    #[serde(default)]
    pub reward_addr: Base64,
    /// Identifiers of the transactions the block carries.
    #[serde(default)]
    pub txs: Vec<Hash>,
    /// Root of the wallet list at this block.
    pub wallet_list_hash: Hash,
    /// Root of the hash list at this block.
    pub hash_list_hash: Hash,
}

/// A fully materialized block: shadow fields plus the hash list and
/// wallet list the roots commit to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(flatten)]
    pub shadow: BlockShadow,
    pub hash_list: Vec<Hash>,
    pub wallet_list: Vec<WalletEntry>,
}

impl Block {
    pub fn from_shadow(
        shadow: BlockShadow,
        hash_list: Vec<Hash>,
        wallet_list: Vec<WalletEntry>,
    ) -> Self {
        Self {
            shadow,
            hash_list,
            wallet_list,
        }
    }
}

/// Recall hint shipped alongside a reconstructed block to the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecallHint {
    /// Independent hash of the recall block.
    pub indep_hash: Hash,
    /// Recall block size in bytes.
    pub size: u64,
    /// Encryption key for the recall segment.
    pub key: Base64,
    /// Nonce for the recall segment.
    pub nonce: Base64,
}
