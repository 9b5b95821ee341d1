//! Service registry entries.

use serde::{Deserialize, Serialize};

/// One entry of the non-consensus service registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub host: String,
    /// Unix seconds after which the entry is stale.
    pub expires: i64,
}
