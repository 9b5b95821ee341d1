//! Peer list and peer announcements.

use crate::body::{read_complete_body, BodyError};
use crate::reply::{json, text};
use crate::state::ApiState;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Extension;
use serde::Deserialize;
use tracing::warn;
use weavenode_types::constants::NETWORK_NAME;
use weavenode_types::Peer;

/// Handler for `GET /peers` - active peers, excluding the caller.
pub async fn peers_handler(
    State(state): State<ApiState>,
    Extension(caller): Extension<Peer>,
) -> Response {
    let mut peers: Vec<Peer> = state
        .peers
        .all()
        .into_iter()
        .filter(|p| *p != caller)
        .collect();
    peers.sort();
    json(StatusCode::OK, peers)
}

#[derive(Debug, Deserialize)]
struct PeerAnnounce {
    network: String,
}

/// Handler for `POST /peers` - peer announce with network-name check.
///
/// The announcing peer itself was already recorded by the accounting
/// middleware; this endpoint only vets the network name.
pub async fn post_peers_handler(State(_state): State<ApiState>, req: Request) -> Response {
    let bytes = match read_complete_body(req.into_body()).await {
        Ok(bytes) => bytes,
        Err(BodyError::TooLarge) => {
            return text(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large.")
        }
        Err(_) => return text(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read body."),
    };
    let announce: PeerAnnounce = match serde_json::from_slice(&bytes) {
        Ok(announce) => announce,
        Err(err) => {
            warn!(%err, "malformed peer announce");
            return text(StatusCode::BAD_REQUEST, "Invalid request body.");
        }
    };
    if announce.network != NETWORK_NAME {
        return text(StatusCode::BAD_REQUEST, "Wrong network.");
    }
    text(StatusCode::OK, "OK")
}
