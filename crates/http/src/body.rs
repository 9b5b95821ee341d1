//! Bounded request body reading.

use axum::body::Body;
use bytes::{Bytes, BytesMut};
use http_body_util::BodyExt;
use weavenode_types::constants::MAX_BODY_SIZE;

/// Failure while draining a request body.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    /// Accumulated size passed the hard cap; maps to HTTP 413.
    #[error("request body too large")]
    TooLarge,

    /// The transport failed mid-read.
    #[error("transport error while reading body: {0}")]
    Transport(#[from] axum::Error),
}

/// Drain a request body into one buffer, enforcing [`MAX_BODY_SIZE`].
///
/// Chunks are accumulated as they arrive; the read aborts as soon as the
/// accumulated size passes the cap, without waiting for the remainder.
pub async fn read_complete_body(body: Body) -> Result<Bytes, BodyError> {
    read_body_with_limit(body, MAX_BODY_SIZE).await
}

pub(crate) async fn read_body_with_limit(
    mut body: Body,
    limit: usize,
) -> Result<Bytes, BodyError> {
    let mut buf = BytesMut::new();
    while let Some(frame) = body.frame().await {
        let frame = frame?;
        if let Some(chunk) = frame.data_ref() {
            if buf.len() + chunk.len() > limit {
                return Err(BodyError::TooLarge);
            }
            buf.extend_from_slice(chunk);
        }
    }
    Ok(buf.freeze())
}
