//! Server execution logic.

use std::sync::Arc;

use tokio::net::TcpListener;

use super::session::{SessionContext, handle_connection};

/// Line-oriented TCP chat relay server
///
/// Accepts connections and spawns one session task per client.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(context);
/// server.run("127.0.0.1".to_string(), 8989).await?;
/// ```
pub struct Server {
    context: Arc<SessionContext>,
}

impl Server {
    pub fn new(context: Arc<SessionContext>) -> Self {
        Self { context }
    }

    /// Bind the listener and serve connections until the process exits.
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8989)
    pub async fn run(&self, host: String, port: u16) -> std::io::Result<()> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Chat relay listening on {}", listener.local_addr()?);

        self.run_with_listener(listener).await
    }

    /// Serve connections on an already-bound listener.
    ///
    /// Split out from [`Server::run`] so tests can bind to port 0 themselves.
    pub async fn run_with_listener(&self, listener: TcpListener) -> std::io::Result<()> {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!("Error accepting connection: {}", e);
                    continue;
                }
            };
            tracing::info!("New connection from {}", peer);

            let context = self.context.clone();
            tokio::spawn(async move {
                handle_connection(stream, context).await;
            });
        }
    }
}
