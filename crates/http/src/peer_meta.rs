//! Per-request peer accounting.
//!
//! Derives the peer identity (transport ipv4 plus the `x-p2p-port`
//! header) before routing, stores it in request extensions for the
//! handlers, announces first-seen peers to the bridge, and emits the
//! optional per-request log line.

use crate::state::ApiState;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;
use tracing::debug;
use weavenode_types::Peer;

pub async fn track_peer(
    State(state): State<ApiState>,
    mut req: Request,
    next: Next,
) -> Response {
    let p2p_port = req
        .headers()
        .get("x-p2p-port")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u16>().ok());
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .and_then(|info| Peer::from_socket(info.0, p2p_port))
        .unwrap_or(Peer::UNSPECIFIED);
    req.extensions_mut().insert(peer);

    if !peer.is_unspecified() && state.peers.record(peer) {
        state.bridge.add_remote_peer(peer);
    }
    if state.config.http_logging {
        debug!(method = %req.method(), path = %req.uri().path(), %peer, "http_request");
    }

    next.run(req).await
}
