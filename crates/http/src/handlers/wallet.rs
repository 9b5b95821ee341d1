//! Wallet reads: balance, last tx, outgoing txs, deposits.

use crate::reply::{json, text};
use crate::state::ApiState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use weavenode_types::Hash;

/// Handler for `GET /wallet/{addr}/balance`.
///
/// A node-state read that times out surfaces as 503.
pub async fn balance_handler(
    State(state): State<ApiState>,
    Path(addr): Path<String>,
) -> Response {
    let Ok(address) = Hash::from_base64url(&addr) else {
        return text(StatusCode::BAD_REQUEST, "Invalid address.");
    };
    match state.node.balance(&address) {
        Ok(balance) => text(StatusCode::OK, balance.to_string()),
        Err(_) => text(StatusCode::SERVICE_UNAVAILABLE, "Internal timeout."),
    }
}

/// Handler for `GET /wallet/{addr}/last_tx`.
pub async fn last_tx_handler(
    State(state): State<ApiState>,
    Path(addr): Path<String>,
) -> Response {
    let Ok(address) = Hash::from_base64url(&addr) else {
        return text(StatusCode::BAD_REQUEST, "Invalid address.");
    };
    match state.node.last_tx(&address) {
        Ok(last_tx) => text(StatusCode::OK, last_tx.to_base64url()),
        Err(_) => text(StatusCode::SERVICE_UNAVAILABLE, "Internal timeout."),
    }
}

/// Handler for `GET /wallet/{addr}/txs`.
pub async fn txs_handler(State(state): State<ApiState>, Path(addr): Path<String>) -> Response {
    indexed_ids(&state, &addr, b"from", None)
}

/// Handler for `GET /wallet/{addr}/txs/{earliest}` - newest first, cut
/// at `earliest` inclusively.
pub async fn txs_from_handler(
    State(state): State<ApiState>,
    Path((addr, earliest)): Path<(String, String)>,
) -> Response {
    indexed_ids(&state, &addr, b"from", Some(&earliest))
}

/// Handler for `GET /wallet/{addr}/deposits`.
pub async fn deposits_handler(
    State(state): State<ApiState>,
    Path(addr): Path<String>,
) -> Response {
    indexed_ids(&state, &addr, b"to", None)
}

/// Handler for `GET /wallet/{addr}/deposits/{earliest}`.
pub async fn deposits_from_handler(
    State(state): State<ApiState>,
    Path((addr, earliest)): Path<(String, String)>,
) -> Response {
    indexed_ids(&state, &addr, b"to", Some(&earliest))
}

/// Query the tag index for a wallet, newest first, optionally truncated
/// at an id (inclusive).
fn indexed_ids(state: &ApiState, addr: &str, tag: &[u8], earliest: Option<&str>) -> Response {
    let Ok(address) = Hash::from_base64url(addr) else {
        return text(StatusCode::BAD_REQUEST, "Invalid address.");
    };
    let earliest = match earliest {
        Some(s) => match Hash::from_base64url(s) {
            Ok(id) => Some(id),
            Err(_) => return text(StatusCode::BAD_REQUEST, "Invalid hash."),
        },
        None => None,
    };
    let entries = state
        .search
        .entries(tag, address.to_base64url().as_bytes());
    let mut ids = state.search.sort_txids(entries);
    if let Some(earliest) = earliest {
        if let Some(pos) = ids.iter().position(|id| *id == earliest) {
            ids.truncate(pos + 1);
        }
    }
    json(StatusCode::OK, ids)
}
