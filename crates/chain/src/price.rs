//! Fee estimation and difficulty floors.

use weavenode_types::constants::{BASE_TX_BYTES, BYTE_PRICE, MIN_DIFF, WALLET_GEN_FEE};
use weavenode_types::{Hash, WalletEntry};

/// Minimum reward a transaction of the given payload size must offer to
/// be mined at the given difficulty.
///
/// Linear in the charged bytes (payload plus a flat header overhead),
/// scaled down as difficulty rises: miners at higher difficulty settle
/// for a lower per-byte reward.
pub fn min_tx_cost(data_size: u64, diff: u64) -> u64 {
    (BASE_TX_BYTES + data_size) * BYTE_PRICE / diff.max(1)
}

/// Fee estimate for a transaction of `data_size` payload bytes.
///
/// Takes the larger of the price at the current difficulty and the price
/// at the projected next difficulty, so a quote stays sufficient across
/// the next retarget. When a target wallet is supplied and the wallet
/// list does not know it, the new-wallet surcharge is added.
pub fn estimate_tx_price(
    data_size: u64,
    current_diff: u64,
    next_diff: u64,
    target: Option<&Hash>,
    wallets: &[WalletEntry],
) -> u64 {
    let base = min_tx_cost(data_size, current_diff).max(min_tx_cost(data_size, next_diff));
    match target {
        Some(addr) if !wallets.iter().any(|w| w.address == *addr) => base + WALLET_GEN_FEE,
        _ => base,
    }
}

/// The lowest difficulty a gossiped block may carry at the given height.
pub fn min_difficulty(_height: u64) -> u64 {
    MIN_DIFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_scales_with_size() {
        assert!(min_tx_cost(1000, 10) > min_tx_cost(10, 10));
    }

    #[test]
    fn test_cost_falls_as_difficulty_rises() {
        assert!(min_tx_cost(1000, 20) < min_tx_cost(1000, 10));
    }

    #[test]
    fn test_estimate_is_pessimistic() {
        // whichever difficulty yields the larger price wins
        let up = estimate_tx_price(500, 10, 20, None, &[]);
        let down = estimate_tx_price(500, 20, 10, None, &[]);
        assert_eq!(up, min_tx_cost(500, 10));
        assert_eq!(down, min_tx_cost(500, 10));
    }

    #[test]
    fn test_new_wallet_surcharge() {
        let known = Hash::digest(b"known");
        let unknown = Hash::digest(b"unknown");
        let wallets = vec![WalletEntry::new(known, 100)];
        let base = estimate_tx_price(500, 10, 10, Some(&known), &wallets);
        let charged = estimate_tx_price(500, 10, 10, Some(&unknown), &wallets);
        assert_eq!(charged, base + WALLET_GEN_FEE);
    }
}
