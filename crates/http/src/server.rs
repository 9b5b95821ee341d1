//! HTTP server lifecycle.

use crate::routes::create_router;
use crate::state::ApiState;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};
use weavenode_types::constants::DEFAULT_HTTP_PORT;

/// Errors from the HTTP server.
#[derive(Debug, Error)]
pub enum ApiServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Address to listen on.
    pub listen_addr: SocketAddr,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_HTTP_PORT)),
        }
    }
}

/// Handle for controlling a running server.
pub struct ApiServerHandle {
    task: JoinHandle<()>,
    addr: SocketAddr,
}

impl ApiServerHandle {
    /// The address the listener actually bound.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Abort the server task.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Wait for the server to finish.
    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.task.await
    }
}

/// The node's HTTP interface.
pub struct ApiServer {
    config: ApiServerConfig,
    state: ApiState,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: ApiState) -> Self {
        Self { config, state }
    }

    /// Bind, spawn the accept loop and return a control handle.
    pub async fn start(self) -> Result<ApiServerHandle, ApiServerError> {
        let router = create_router(self.state);
        let listener = tokio::net::TcpListener::bind(self.config.listen_addr).await?;
        let addr = listener.local_addr()?;
        info!(%addr, "HTTP interface listening");

        let task = tokio::spawn(async move {
            if let Err(err) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                error!(error = ?err, "HTTP server error");
            }
        });

        Ok(ApiServerHandle { task, addr })
    }

    /// Start and serve until the task ends.
    pub async fn serve(self) -> Result<(), ApiServerError> {
        let handle = self.start().await?;
        let _ = handle.join().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestEnv;

    #[test]
    fn test_default_config() {
        let config = ApiServerConfig::default();
        assert_eq!(config.listen_addr.port(), DEFAULT_HTTP_PORT);
    }

    #[tokio::test]
    async fn test_server_binds_ephemeral_port() {
        let env = TestEnv::new();
        let config = ApiServerConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
        };
        let handle = ApiServer::new(config, env.state.clone()).start().await.unwrap();
        assert_ne!(handle.addr().port(), 0);
        handle.abort();
    }
}
