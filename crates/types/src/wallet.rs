//! Wallet list entries.

use crate::Hash;
use serde::{Deserialize, Serialize};

/// One entry of the wallet list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEntry {
    pub address: Hash,
    pub balance: u64,
    /// Identifier of the last transaction this wallet signed.
    pub last_tx: Hash,
}

impl WalletEntry {
    pub fn new(address: Hash, balance: u64) -> Self {
        Self {
            address,
            balance,
            last_tx: Hash::ZERO,
        }
    }
}
