use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::server::routes::{AppState, router};
use crate::storage::RootHandle;

pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl Server {
    /// Configures the served root and binds the listener.
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let root = RootHandle::configure(config.server_root_path())?;
        let policy = config.storage_policy();

        let socket = config.listen_socket();
        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(ServerError::Bind(socket, e));
            }
        };

        Ok(Self {
            listener,
            state: Arc::new(AppState { root, policy }),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves requests until Ctrl-C is received.
    pub async fn start(self) -> Result<(), ServerError> {
        self.serve_until(shutdown_signal()).await
    }

    /// Serves requests until `shutdown` completes.
    pub async fn serve_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = self
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "<unknown>".to_string());
        info!(
            "Serving {} on {} (max upload {} bytes)",
            self.state.root.path().display(),
            addr,
            self.state.policy.max_upload_bytes
        );

        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ServerError::Serve)?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
