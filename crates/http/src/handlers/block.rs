//! Block reads: by hash, by height, current head, subfields.

use crate::reply::{json, json_bytes, text};
use crate::state::ApiState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use tracing::error;
use weavenode_types::BlockShadow;
use weavenode_types::Hash;

/// Handler for `GET /block/current` - alias for the head block.
pub async fn current_block_handler(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let Some(head) = state.node.current_block_hash() else {
        return text(StatusCode::NOT_FOUND, "Block not found.");
    };
    match state.storage.lookup_block_by_hash(&head) {
        Some(bytes) => serve_block_bytes(&state, &headers, bytes),
        None => text(StatusCode::NOT_FOUND, "Block not found."),
    }
}

/// Handler for `GET /block/{hash|height}/{id}`.
pub async fn get_block_handler(
    State(state): State<ApiState>,
    Path((kind, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    match lookup_block(&state, &kind, &id) {
        Ok(bytes) => serve_block_bytes(&state, &headers, bytes),
        Err(response) => response,
    }
}

/// Handler for `GET /block/{hash|height}/{id}/{field}`.
pub async fn get_block_field_handler(
    State(state): State<ApiState>,
    Path((kind, id, field)): Path<(String, String, String)>,
) -> Response {
    if !state.config.subfield_queries {
        return text(
            StatusCode::MISDIRECTED_REQUEST,
            "Subfield block querying is disabled on this node.",
        );
    }
    let bytes = match lookup_block(&state, &kind, &id) {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };
    let value: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(err) => {
            error!(%err, "stored block does not parse");
            return text(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read block.");
        }
    };
    match field.as_str() {
        // decimal rendering
        "timestamp" | "last_retarget" | "diff" | "height" => match value.get(&field) {
            Some(v) => text(StatusCode::OK, v.to_string()),
            None => text(StatusCode::BAD_REQUEST, "Invalid field."),
        },
        // raw base64url rendering
        "nonce" | "previous_block" | "indep_hash" => match value.get(&field) {
            Some(serde_json::Value::String(s)) => text(StatusCode::OK, s.clone()),
            _ => text(StatusCode::BAD_REQUEST, "Invalid field."),
        },
        "hash" => match value.get("indep_hash") {
            Some(serde_json::Value::String(s)) => text(StatusCode::OK, s.clone()),
            _ => text(StatusCode::BAD_REQUEST, "Invalid field."),
        },
        "txs" => match value.get("txs") {
            Some(v) => json(StatusCode::OK, v.clone()),
            None => text(StatusCode::BAD_REQUEST, "Invalid field."),
        },
        // legacy compat: materialized from current node state
        "hash_list" => json(StatusCode::OK, state.node.hash_list()),
        "wallet_list" => json(StatusCode::OK, state.node.wallet_list()),
        _ => text(StatusCode::BAD_REQUEST, "Invalid field."),
    }
}

/// Resolve `{hash|height}/{id}` to the stored block bytes.
fn lookup_block(state: &ApiState, kind: &str, id: &str) -> Result<Vec<u8>, Response> {
    let bytes = match kind {
        "hash" => {
            let hash =
                Hash::from_base64url(id).map_err(|_| text(StatusCode::BAD_REQUEST, "Invalid hash."))?;
            state.storage.lookup_block_by_hash(&hash)
        }
        "height" => {
            let height: u64 = id
                .parse()
                .map_err(|_| text(StatusCode::BAD_REQUEST, "Invalid height."))?;
            state.storage.lookup_block_by_height(height)
        }
        _ => return Err(text(StatusCode::BAD_REQUEST, "Request type not found.")),
    };
    bytes.ok_or_else(|| text(StatusCode::NOT_FOUND, "Block not found."))
}

/// Serve stored block bytes, negotiating the legacy version-1 format via
/// the `x-block-format` header (default version 2).
fn serve_block_bytes(state: &ApiState, headers: &HeaderMap, bytes: Vec<u8>) -> Response {
    let format = headers
        .get("x-block-format")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("2");
    if format != "1" {
        return json_bytes(StatusCode::OK, bytes);
    }
    if !state.config.api_compat {
        return text(StatusCode::UPGRADE_REQUIRED, "Client version incompatible.");
    }
    // legacy clients expect the hash list inlined next to the tx ids
    let shadow: BlockShadow = match serde_json::from_slice(&bytes) {
        Ok(shadow) => shadow,
        Err(err) => {
            error!(%err, "stored block does not parse");
            return text(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read block.");
        }
    };
    let mut value = serde_json::to_value(&shadow).unwrap_or_default();
    value["hash_list"] = serde_json::to_value(state.node.hash_list()).unwrap_or_default();
    json(StatusCode::OK, value)
}
