//! Transactions and tags.

use crate::{Base64, Hash};
use serde::{Deserialize, Serialize};

/// A name/value byte pair attached to a transaction.
///
/// Tags are indexed by the tag search backend and drive content-type
/// negotiation for data serving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: Base64,
    pub value: Base64,
}

impl Tag {
    pub fn new(name: &[u8], value: &[u8]) -> Self {
        Self {
            name: Base64::from(name),
            value: Base64::from(value),
        }
    }
}

/// A data transaction.
///
/// The identifier is the digest of the signature; the signature covers
/// [`Tx::signature_payload`] and verifies under `owner`. `last_tx` is the
/// replay-protection anchor and must name a block within the last
/// [`crate::constants::MAX_TX_ANCHOR_DEPTH`] blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    /// Transaction identifier, `digest(signature)`.
    pub id: Hash,
    /// Replay-protection anchor.
    pub last_tx: Hash,
    /// Public key of the signing wallet.
    pub owner: Base64,
    /// Recipient address; empty for data-only transactions.
    #[serde(default)]
    pub target: Base64,
    /// Amount transferred to `target`.
    #[serde(default)]
    pub quantity: u64,
    /// Arbitrary data payload.
    #[serde(default)]
    pub data: Base64,
    /// Mining reward offered.
    #[serde(default)]
    pub reward: u64,
    /// Signature over [`Tx::signature_payload`].
    pub signature: Base64,
    /// Ordered tag sequence.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Tx {
    /// The canonical byte string the signature covers: owner, target,
    /// data, quantity, reward, anchor and tags, in that order.
    pub fn signature_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(
            self.owner.len() + self.target.len() + self.data.len() + 48,
        );
        payload.extend_from_slice(self.owner.as_slice());
        payload.extend_from_slice(self.target.as_slice());
        payload.extend_from_slice(self.data.as_slice());
        payload.extend_from_slice(&self.quantity.to_be_bytes());
        payload.extend_from_slice(&self.reward.to_be_bytes());
        payload.extend_from_slice(self.last_tx.as_bytes());
        for tag in &self.tags {
            payload.extend_from_slice(tag.name.as_slice());
            payload.extend_from_slice(tag.value.as_slice());
        }
        payload
    }

    /// Wallet address owning this transaction: digest of the owner key.
    pub fn owner_address(&self) -> Hash {
        Self::address_of(&self.owner)
    }

    /// Address of an arbitrary public key.
    pub fn address_of(owner: &Base64) -> Hash {
        Hash::digest(owner.as_slice())
    }

    /// Data payload size in bytes.
    pub fn data_size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Look up the first tag with the given name, decoded as UTF-8.
    pub fn tag_value(&self, name: &[u8]) -> Option<&Base64> {
        self.tags
            .iter()
            .find(|t| t.name.as_slice() == name)
            .map(|t| &t.value)
    }
}
