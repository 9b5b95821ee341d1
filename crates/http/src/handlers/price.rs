//! Fee estimation.

use crate::reply::text;
use crate::state::ApiState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use weavenode_chain::estimate_tx_price;
use weavenode_types::Hash;

/// Handler for `GET /price/{bytes}`.
pub async fn price_handler(
    State(state): State<ApiState>,
    Path(bytes): Path<String>,
) -> Response {
    let Ok(data_size) = bytes.parse::<u64>() else {
        return text(StatusCode::BAD_REQUEST, "Invalid byte size.");
    };
    quote(&state, data_size, None)
}

/// Handler for `GET /price/{bytes}/{addr}` - includes the new-wallet
/// surcharge when the target is unknown.
pub async fn price_for_wallet_handler(
    State(state): State<ApiState>,
    Path((bytes, addr)): Path<(String, String)>,
) -> Response {
    let Ok(data_size) = bytes.parse::<u64>() else {
        return text(StatusCode::BAD_REQUEST, "Invalid byte size.");
    };
    let Ok(target) = Hash::from_base64url(&addr) else {
        return text(StatusCode::BAD_REQUEST, "Invalid address.");
    };
    quote(&state, data_size, Some(target))
}

fn quote(state: &ApiState, data_size: u64, target: Option<Hash>) -> Response {
    let wallets = state.node.wallet_list();
    let price = estimate_tx_price(
        data_size,
        state.node.current_diff(),
        state.node.diff(),
        target.as_ref(),
        &wallets,
    );
    text(StatusCode::OK, price.to_string())
}
