//! Signaling server listener
//!
//! Handles the TCP accept loop and spawns connection handlers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, Semaphore};

use crate::error::Result;
use crate::registry::ConnectionId;
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;
use crate::server::hub::Hub;
use crate::stats::ServerStats;

/// WebSocket signaling server
pub struct SignalServer {
    config: ServerConfig,
    hub: Arc<Mutex<Hub>>,
    connection_semaphore: Option<Arc<Semaphore>>,
    started_at: Instant,
}

impl SignalServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            hub: Arc::new(Mutex::new(Hub::new(config.broadcast_online))),
            config,
            connection_semaphore,
            started_at: Instant::now(),
        }
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve connections from an already bound listener until `shutdown`
    /// resolves
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Signaling server listening");

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
            }
            _ = self.accept_loop(&listener) => {}
        }

        Ok(())
    }

    async fn accept_loop(&self, listener: &TcpListener) {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::error!(error = %e, "Failed to configure socket");
                return;
            }
        }

        let connection_id = ConnectionId::generate();

        tracing::debug!(
            connection = %connection_id,
            peer = %peer_addr,
            "New connection"
        );

        let config = self.config.clone();
        let hub = Arc::clone(&self.hub);

        tokio::spawn(async move {
            let _permit = permit;
            let mut connection = Connection::new(connection_id.clone(), peer_addr, config, hub);

            if let Err(e) = connection.run(socket).await {
                tracing::debug!(
                    connection = %connection_id,
                    error = %e,
                    "Connection error"
                );
            }

            tracing::debug!(connection = %connection_id, "Connection closed");
        });
    }

    /// Current server statistics
    pub async fn stats(&self) -> ServerStats {
        let mut stats = self.hub.lock().await.stats();
        stats.uptime = self.started_at.elapsed();
        stats
    }

    /// Number of live connections
    pub async fn online(&self) -> usize {
        self.hub.lock().await.online()
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
