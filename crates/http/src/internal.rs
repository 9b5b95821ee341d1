//! The internal API: keyfile issuance and server-side signing.
//!
//! Both endpoints sit behind the shared-secret guard. Every rejection
//! sleeps a uniformly random 1000-2000 ms before replying so response
//! timing reveals nothing about how the comparison failed.

use crate::body::{read_complete_body, BodyError};
use crate::reply::{json, text};
use crate::state::ApiState;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use rand::{Rng, RngCore};
use std::time::Duration;
use tracing::{error, info, warn};
use weavenode_chain::memory::sign_tx;
use weavenode_types::{Base64, Tx};

async fn require_secret(state: &ApiState, headers: &HeaderMap) -> Result<(), Response> {
    let provided = headers
        .get("x-internal-api-secret")
        .and_then(|v| v.to_str().ok());
    if let (Some(secret), Some(provided)) = (state.config.internal_api_secret.as_deref(), provided)
    {
        if secret == provided {
            return Ok(());
        }
    }
    let jitter_ms = rand::thread_rng().gen_range(1000..2000);
    tokio::time::sleep(Duration::from_millis(jitter_ms)).await;
    Err(text(
        StatusCode::MISDIRECTED_REQUEST,
        "Internal API disabled or invalid internal API secret in request.",
    ))
}

/// Handler for `POST /wallet` - issue a fresh keyfile.
pub async fn post_wallet_handler(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_secret(&state, &headers).await {
        return response;
    }
    let mut code_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut code_bytes);
    let access_code = Base64::from(code_bytes.as_slice()).to_base64url();
    match state.keystore.new_keyfile(&access_code) {
        Ok(address) => {
            info!(%address, "issued new keyfile");
            json(
                StatusCode::OK,
                serde_json::json!({
                    "wallet_address": address,
                    "wallet_access_code": access_code,
                }),
            )
        }
        Err(err) => {
            error!(%err, "keyfile creation failed");
            text(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create wallet.")
        }
    }
}

/// Handler for `POST /unsigned_tx` - sign with the server key and run
/// the standard admission pipeline.
pub async fn post_unsigned_tx_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
    req: Request,
) -> Response {
    if let Err(response) = require_secret(&state, &headers).await {
        return response;
    }
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
    let unsigned: Tx = match serde_json::from_slice(&bytes) {
        Ok(tx) => tx,
        Err(err) => {
            warn!(%err, "malformed unsigned tx");
            return text(StatusCode::BAD_REQUEST, "Invalid transaction.");
        }
    };
    let key = match state.keystore.server_keypair() {
        Ok(key) => key,
        Err(err) => {
            error!(%err, "server keypair unavailable");
            return text(StatusCode::INTERNAL_SERVER_ERROR, "Keystore unavailable.");
        }
    };
    let tx = sign_tx(unsigned, &key);
    let id = tx.id;
    let response = crate::admission::admit(&state, tx).await;
    if response.status() == StatusCode::OK {
        json(StatusCode::OK, serde_json::json!({ "id": id }))
    } else {
        response
    }
}
