//! Node info.

use crate::reply::json;
use crate::state::ApiState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;
use std::time::Instant;
use weavenode_types::constants::{NETWORK_NAME, PROTOCOL_VERSION, RELEASE_NUMBER};

#[derive(Debug, Serialize)]
struct InfoResponse {
    network: &'static str,
    version: u32,
    release: u32,
    /// -1 until the node has joined.
    height: i64,
    /// Base64url head hash, or a sentinel before joining.
    current: String,
    blocks: u64,
    peers: usize,
    queue_length: usize,
    /// Average duration of two sampled node-state reads, microseconds.
    node_state_latency: u64,
}

/// Handler for `GET /` and `GET /info`.
pub async fn info_handler(State(state): State<ApiState>) -> Response {
    let started = Instant::now();
    let height = state.node.height();
    let current = state.node.current_block_hash();
    let node_state_latency = (started.elapsed().as_micros() / 2) as u64;

    json(
        StatusCode::OK,
        InfoResponse {
            network: NETWORK_NAME,
            version: PROTOCOL_VERSION,
            release: RELEASE_NUMBER,
            height: height.map(|h| h as i64).unwrap_or(-1),
            current: current
                .map(|h| h.to_base64url())
                .unwrap_or_else(|| "not_joined".to_string()),
            blocks: state.node.blocks_on_disk(),
            peers: state.peers.len(),
            queue_length: state.mempool.len(),
            node_state_latency,
        },
    )
}

#[cfg(test)]
mod tests {
    use crate::testutil::{body_json, get_request, TestEnv};
    use axum::http::StatusCode;
    use tower::ServiceExt;
    use weavenode_types::constants::NETWORK_NAME;

    #[tokio::test]
    async fn test_info_unjoined() {
        let env = TestEnv::new();
        let response = env.router().oneshot(get_request("/info")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value["network"], NETWORK_NAME);
        assert_eq!(value["height"], -1);
        assert_eq!(value["current"], "not_joined");
        assert_eq!(value["queue_length"], 0);
    }

    #[tokio::test]
    async fn test_info_joined_reports_head() {
        let env = TestEnv::joined(10);
        let response = env.router().oneshot(get_request("/")).await.unwrap();
        let value = body_json(response).await;
        assert_eq!(value["height"], 10);
        let head = env.node.snapshot().current_block.unwrap();
        assert_eq!(value["current"], head.to_base64url());
    }
}
