//! Shared utilities for the idobata chat binaries.
//!
//! Logging setup and time handling used by both the server and the client.

pub mod logger;
pub mod time;
