//! Mempool admission: the `POST /tx` state machine.
//!
//! Stage order is deliberate: the capacity check and the dedup gate are
//! O(1) against local state and run before the wallet lookup, which in
//! turn runs before the expensive replay-pool verification. The ignore
//! set is claimed before the verifier so two concurrent admissions of
//! the same id cannot both reach it.

use crate::body::{read_complete_body, BodyError};
use crate::reply::text;
use crate::state::ApiState;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::Response;
use tracing::{info, warn};
use weavenode_chain::{Admitted, MempoolFull, ReplayVerdict};
use weavenode_types::constants::FORK_HEIGHT_1_8;
use weavenode_types::Tx;

/// Handler for `POST /tx`.
pub async fn post_tx_handler(State(state): State<ApiState>, req: Request) -> Response {
    let bytes = match read_complete_body(req.into_body()).await {
        Ok(bytes) => bytes,
        Err(BodyError::TooLarge) => {
            return text(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large.")
        }
        Err(err) => {
            warn!(%err, "body read failed");
            return text(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read body.");
        }
    };
    let tx: Tx = match serde_json::from_slice(&bytes) {
        Ok(tx) => tx,
        Err(err) => {
            warn!(%err, "malformed tx json");
            return text(StatusCode::BAD_REQUEST, "Invalid transaction.");
        }
    };
    admit(&state, tx).await
}

/// Run a parsed transaction through the admission pipeline.
pub(crate) async fn admit(state: &ApiState, tx: Tx) -> Response {
    // capacity check and provisional insert form one critical section;
    // the cap only binds from the 1.8 fork height on, and an unjoined
    // node counts as pre-fork
    let cap = state
        .node
        .height()
        .filter(|h| *h >= FORK_HEIGHT_1_8)
        .map(|_| state.mempool_data_limit);
    let admitted = match state.mempool.try_add(tx.clone(), cap) {
        Ok(admitted) => admitted,
        Err(MempoolFull) => {
            warn!(id = %tx.id, "tx rejected: mempool full");
            return text(StatusCode::BAD_REQUEST, "Mempool is full.");
        }
    };

    // idempotent dedup: the earlier contains-and-insert wins; the loser
    // rolls back its own provisional insert and reports 208
    if !state.ignored.insert(tx.id) {
        if admitted == Admitted::Inserted {
            state.mempool.remove(&tx.id);
        }
        return text(
            StatusCode::ALREADY_REPORTED,
            "Transaction already processed.",
        );
    }

    // the wallet must cover this tx plus everything it already has
    // waiting
    let wallets = state.node.wallet_list();
    let owner = tx.owner_address();
    let balance = wallets
        .iter()
        .find(|w| w.address == owner)
        .map(|w| w.balance)
        .unwrap_or(0);
    let pool: Vec<Tx> = state
        .mempool
        .snapshot()
        .into_iter()
        .filter(|waiting| waiting.id != tx.id)
        .collect();
    let waiting_spend: u64 = pool
        .iter()
        .filter(|waiting| waiting.owner_address() == owner)
        .map(|waiting| waiting.reward + waiting.quantity)
        .sum();
    if balance < waiting_spend + tx.reward + tx.quantity {
        state.mempool.remove(&tx.id);
        warn!(id = %tx.id, %owner, balance, "tx rejected: exceeds balance");
        return text(
            StatusCode::BAD_REQUEST,
            "Waiting TXs exceed balance for wallet.",
        );
    }

    // replay-protection and signature verification, the expensive stage
    let height = state.node.height().unwrap_or(0);
    let verdict = state.replay.verify_tx(
        &tx,
        state.node.diff(),
        height,
        &state.node.block_txs_pairs(),
        &pool,
        &wallets,
    );
    match verdict {
        ReplayVerdict::Valid => {
            info!(id = %tx.id, "tx accepted");
            state.bridge.add_tx(tx);
            text(StatusCode::OK, "OK")
        }
        rejected => {
            state.mempool.remove(&tx.id);
            warn!(id = %tx.id, verdict = ?rejected, "tx rejected");
            let message = match rejected {
                ReplayVerdict::InvalidSignature => "Transaction verification failed.",
                ReplayVerdict::LastTxInMempool => "Invalid anchor (last_tx from mempool).",
                ReplayVerdict::BadAnchor => "Invalid anchor (last_tx).",
                ReplayVerdict::AlreadyInWeave => "Transaction is already on the weave.",
                ReplayVerdict::AlreadyInMempool => "Transaction is already in the mempool.",
                ReplayVerdict::Valid => unreachable!(),
            };
            text(StatusCode::BAD_REQUEST, message)
        }
    }
}
