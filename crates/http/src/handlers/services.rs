//! The non-consensus service registry.

use crate::body::{read_complete_body, BodyError};
use crate::reply::{json, text};
use crate::state::ApiState;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::Response;
use tracing::warn;
use weavenode_types::Service;

/// Handler for `GET /services`.
pub async fn get_services_handler(State(state): State<ApiState>) -> Response {
    let services = state.services.read().await.clone();
    json(StatusCode::OK, services)
}

/// Handler for `POST /services` - appends entries after a structural
/// parse; the registry carries no further validation.
pub async fn post_services_handler(State(state): State<ApiState>, req: Request) -> Response {
    let bytes = match read_complete_body(req.into_body()).await {
        Ok(bytes) => bytes,
        Err(BodyError::TooLarge) => {
            return text(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large.")
        }
        Err(_) => return text(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read body."),
    };
    let entries: Vec<Service> = match serde_json::from_slice(&bytes) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(%err, "malformed services payload");
            return text(StatusCode::BAD_REQUEST, "Invalid request body.");
        }
    };
    state.services.write().await.extend(entries);
    text(StatusCode::OK, "OK")
}
