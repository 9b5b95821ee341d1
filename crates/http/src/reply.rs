//! Terminal response helpers.
//!
//! Handlers always finish with a concrete `(status, body)`; no error
//! escapes the router boundary.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Plain-text response.
pub fn text(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain")],
        body.into(),
    )
        .into_response()
}

/// JSON response from a serializable value.
pub fn json<T: Serialize>(status: StatusCode, value: T) -> Response {
    (status, axum::Json(value)).into_response()
}

/// JSON response from pre-serialized bytes (stored tx/block files).
pub fn json_bytes(status: StatusCode, bytes: Vec<u8>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        bytes,
    )
        .into_response()
}

/// Raw bytes with an explicit content type (tx data serving).
pub fn bytes_with_content_type(bytes: Vec<u8>, content_type: String) -> Response {
    match header::HeaderValue::from_str(&content_type) {
        Ok(value) => (StatusCode::OK, [(header::CONTENT_TYPE, value)], bytes).into_response(),
        Err(_) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            bytes,
        )
            .into_response(),
    }
}
