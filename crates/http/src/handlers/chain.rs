//! Consensus-cursor reads: time, height, hash list, wallet list, anchor.

use crate::reply::{json, text};
use crate::state::ApiState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use std::time::{SystemTime, UNIX_EPOCH};
use weavenode_types::constants::MAX_TX_ANCHOR_DEPTH;

/// Handler for `GET /time` - local unix seconds as decimal text.
pub async fn time_handler() -> Response {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    text(StatusCode::OK, now.to_string())
}

/// Handler for `GET /height`.
pub async fn height_handler(State(state): State<ApiState>) -> Response {
    match state.node.height() {
        Some(height) => text(StatusCode::OK, height.to_string()),
        None => text(
            StatusCode::SERVICE_UNAVAILABLE,
            "Node has not joined the network yet.",
        ),
    }
}

/// Handler for `GET /hash_list`.
///
/// Reads are serialized through the hash-list gate; the wait has no
/// deadline of its own, only the handler deadline above it.
pub async fn hash_list_handler(State(state): State<ApiState>) -> Response {
    let _permit = match state.hash_list_gate.acquire().await {
        Ok(permit) => permit,
        Err(_) => return text(StatusCode::INTERNAL_SERVER_ERROR, "Hash list unavailable."),
    };
    json(StatusCode::OK, state.node.hash_list())
}

/// Handler for `GET /wallet_list`.
pub async fn wallet_list_handler(State(state): State<ApiState>) -> Response {
    json(StatusCode::OK, state.node.wallet_list())
}

/// Handler for `GET /tx_anchor`.
///
/// Picks the anchor at index `min(len, MAX_TX_ANCHOR_DEPTH) / 2` of the
/// hash list, keeping quoted anchors valid for roughly half the anchor
/// window even as the chain advances.
pub async fn tx_anchor_handler(State(state): State<ApiState>) -> Response {
    let hash_list = state.node.hash_list();
    if hash_list.is_empty() {
        return text(StatusCode::BAD_REQUEST, "Not joined.");
    }
    let index = hash_list.len().min(MAX_TX_ANCHOR_DEPTH) / 2;
    text(StatusCode::OK, hash_list[index].to_base64url())
}

#[cfg(test)]
mod tests {
    use crate::testutil::{body_string, get_request, TestEnv};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_height_before_join_is_503() {
        let env = TestEnv::new();
        let response = env.router().oneshot(get_request("/height")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_string(response).await,
            "Node has not joined the network yet."
        );
    }

    #[tokio::test]
    async fn test_height_after_join() {
        let env = TestEnv::joined(42);
        let response = env.router().oneshot(get_request("/height")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "42");
    }

    #[tokio::test]
    async fn test_tx_anchor_empty_hash_list_is_400() {
        let env = TestEnv::new();
        let response = env.router().oneshot(get_request("/tx_anchor")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tx_anchor_index_selection() {
        // height 4 -> hash list of length 5 -> anchor index min(5, 18) / 2 = 2
        let env = TestEnv::joined(4);
        let hash_list = env.node.snapshot().hash_list.clone();
        assert_eq!(hash_list.len(), 5);
        let response = env.router().oneshot(get_request("/tx_anchor")).await.unwrap();
        assert_eq!(body_string(response).await, hash_list[2].to_base64url());
    }

    #[tokio::test]
    async fn test_tx_anchor_deep_chain_stays_in_window() {
        // hash list longer than the anchor depth: index pins at 18 / 2
        let env = TestEnv::joined(100);
        let hash_list = env.node.snapshot().hash_list.clone();
        let response = env.router().oneshot(get_request("/tx_anchor")).await.unwrap();
        assert_eq!(body_string(response).await, hash_list[9].to_base64url());
    }

    #[tokio::test]
    async fn test_hash_list_lists_all_hashes() {
        let env = TestEnv::joined(3);
        let response = env.router().oneshot(get_request("/hash_list")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value = crate::testutil::body_json(response).await;
        assert_eq!(value.as_array().unwrap().len(), 4);
    }
}
