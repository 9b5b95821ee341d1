//! Transaction reads: pending list, files, subfields, data serving.

use crate::reply::{bytes_with_content_type, json, json_bytes, text};
use crate::state::ApiState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;
use tracing::error;
use weavenode_types::{Hash, Tx};

/// Handler for `GET /tx/pending` - base64url ids of the waiting pool.
pub async fn pending_txs_handler(State(state): State<ApiState>) -> Response {
    json(StatusCode::OK, state.mempool.pending_ids())
}

/// Handler for `GET /tx/{hash}` - the stored transaction file.
pub async fn get_tx_handler(
    State(state): State<ApiState>,
    Path(hash): Path<String>,
) -> Response {
    let Ok(id) = Hash::from_base64url(&hash) else {
        return text(StatusCode::BAD_REQUEST, "Invalid hash.");
    };
    match state.storage.lookup_tx(&id) {
        Some(bytes) => json_bytes(StatusCode::OK, bytes),
        None => missing_tx(&state, &id),
    }
}

/// Handler for `GET /tx/{hash}/{field}`.
///
/// `status` derives from the tag index, `data.{ext}` serves raw payload
/// bytes, `tags` and the scalar fields come from the stored file.
pub async fn get_tx_field_handler(
    State(state): State<ApiState>,
    Path((hash, field)): Path<(String, String)>,
) -> Response {
    let Ok(id) = Hash::from_base64url(&hash) else {
        return text(StatusCode::BAD_REQUEST, "Invalid hash.");
    };
    if field == "status" {
        return tx_status(&state, &id);
    }
    if let Some(ext) = field.strip_prefix("data.") {
        return serve_tx_data(&state, &id, Some(ext)).await;
    }
    let Some(bytes) = state.storage.lookup_tx(&id) else {
        return missing_tx(&state, &id);
    };
    let tx: Tx = match serde_json::from_slice(&bytes) {
        Ok(tx) => tx,
        Err(err) => {
            error!(%id, %err, "stored tx does not parse");
            return text(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read transaction.");
        }
    };
    if field == "tags" {
        return json(StatusCode::OK, tx.tags);
    }
    let value = serde_json::to_value(&tx).unwrap_or_default();
    match value.get(field.as_str()) {
        Some(serde_json::Value::String(s)) => text(StatusCode::OK, s.clone()),
        Some(other) => json(StatusCode::OK, other.clone()),
        None => text(StatusCode::BAD_REQUEST, "Invalid field."),
    }
}

#[derive(Debug, Serialize)]
struct TxStatusResponse {
    block_height: u64,
    block_indep_hash: String,
    number_of_confirmations: u64,
}

/// Tag-derived status of a mined transaction.
fn tx_status(state: &ApiState, id: &Hash) -> Response {
    let tags = state.search.tags_by_id(id);
    if tags.is_empty() {
        return missing_tx(state, id);
    }
    let find = |name: &[u8]| {
        tags.iter()
            .find(|t| t.name.as_slice() == name)
            .map(|t| String::from_utf8_lossy(t.value.as_slice()).into_owned())
    };
    let (Some(height_str), Some(indep_hash)) = (find(b"block_height"), find(b"block_indep_hash"))
    else {
        return missing_tx(state, id);
    };
    let Ok(block_height) = height_str.parse::<u64>() else {
        return text(StatusCode::INTERNAL_SERVER_ERROR, "Corrupt status index.");
    };
    let Some(current) = state.node.height() else {
        return text(
            StatusCode::SERVICE_UNAVAILABLE,
            "Node has not joined the network yet.",
        );
    };
    json(
        StatusCode::OK,
        TxStatusResponse {
            block_height,
            block_indep_hash: indep_hash,
            number_of_confirmations: current.saturating_sub(block_height) + 1,
        },
    )
}

/// Serve the raw data payload with a tag-derived content type. Shared by
/// `/tx/{hash}/data.{ext}` and the top-level `/{hash}.{ext}` shorthand.
pub async fn serve_tx_data(state: &ApiState, id: &Hash, ext: Option<&str>) -> Response {
    let Some(bytes) = state.storage.lookup_tx(id) else {
        return missing_tx(state, id);
    };
    let tx: Tx = match serde_json::from_slice(&bytes) {
        Ok(tx) => tx,
        Err(err) => {
            error!(%id, %err, "stored tx does not parse");
            return text(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read transaction.");
        }
    };
    let content_type = tx
        .tag_value(b"Content-Type")
        .map(|v| String::from_utf8_lossy(v.as_slice()).into_owned())
        .unwrap_or_else(|| content_type_for_ext(ext).to_string());
    bytes_with_content_type(tx.data.0, content_type)
}

fn content_type_for_ext(ext: Option<&str>) -> &'static str {
    match ext {
        Some("html") => "text/html",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// A transaction we know about but cannot serve: 202 while it waits in
/// the mempool, 404 otherwise.
fn missing_tx(state: &ApiState, id: &Hash) -> Response {
    if state.mempool.contains(id) {
        text(StatusCode::ACCEPTED, "Pending")
    } else {
        text(StatusCode::NOT_FOUND, "Not Found.")
    }
}
