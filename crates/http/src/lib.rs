//! HTTP request processing core for the weavenode data-storage chain.
//!
//! This crate terminates external traffic for a node: it routes requests
//! over the public read surface (blocks, transactions, wallets, the tag
//! index), runs the mempool admission and block ingestion pipelines for
//! writes, and hands accepted artifacts to the gossip bridge.
//!
//! # Surface
//!
//! - Read handlers: `/info`, `/time`, `/height`, `/peers`, `/hash_list`,
//!   `/wallet_list`, `/tx_anchor`, `/price/*`, `/tx/*`, `/block/*`,
//!   `/wallet/*`, `/services`.
//! - Writes: `POST /tx` (mempool admission), `POST /block` (staged
//!   ingestion pipeline), `POST /arql` (gated tag search),
//!   `POST /peers`, `POST /services`.
//! - Privileged: `POST /wallet`, `POST /unsigned_tx`, behind the
//!   internal-API guard.
//!
//! Every request runs under a hard wall-clock deadline; bodies are read
//! chunk-wise against a hard size cap; all collaborator subsystems sit
//! behind the trait seams of `weavenode-chain`.

pub mod admission;
pub mod arql;
pub mod body;
pub mod handlers;
pub mod ingest;
pub mod internal;
pub mod peer_meta;
pub mod reply;
pub mod routes;
pub mod server;
pub mod state;
pub mod timeout;

#[cfg(test)]
pub(crate) mod testutil;

pub use routes::create_router;
pub use server::{ApiServer, ApiServerConfig, ApiServerError, ApiServerHandle};
pub use state::{ApiConfig, ApiState};
