//! Errors surfaced by collaborator interfaces.

/// Errors from node-state reads and keystore operations.
///
/// The original node performs these reads as cross-task messages that
/// can time out; that failure mode surfaces here as [`NodeError::Unavailable`]
/// and maps to HTTP 503 at the surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    /// The backing state could not be read in time.
    #[error("node state unavailable")]
    Unavailable,

    /// Keystore operation failed.
    #[error("keystore: {0}")]
    Keystore(String),

    /// Block reconstruction from a shadow failed.
    #[error("block reconstruction failed: {0}")]
    BuildFailed(String),
}
