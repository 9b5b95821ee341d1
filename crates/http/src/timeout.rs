//! The deadline supervisor.
//!
//! Every request runs under a hard wall-clock deadline. When the timer
//! fires first, the handler future is dropped wherever it was suspended
//! and the client gets a 500; partial side effects (ignore-set inserts)
//! stay, which is intentional and idempotent at that layer.

use crate::reply::text;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Duration;
use tracing::warn;
use weavenode_types::constants::HANDLER_TIMEOUT;

/// Run the rest of the stack under [`HANDLER_TIMEOUT`].
pub async fn supervise(req: Request, next: Next) -> Response {
    supervise_within(HANDLER_TIMEOUT, req, next).await
}

/// Deadline supervisor with an explicit budget.
pub async fn supervise_within(deadline: Duration, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    match tokio::time::timeout(deadline, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(%method, %path, "handler_timeout");
            text(StatusCode::INTERNAL_SERVER_ERROR, "Handler timeout")
        }
    }
}
