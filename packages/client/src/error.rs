//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not reach the server
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The server went away mid-session
    #[error("Connection lost")]
    ConnectionLost,
}
