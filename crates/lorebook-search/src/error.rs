//! Error types for lorebook-search

use thiserror::Error;

/// Failure of one fetch against the remote directory
///
/// Every variant collapses to `SearchState::Error(message)` inside the
/// coordinator; nothing here ever propagates further than the state machine.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// Connection, timeout or other transport-level failure
    #[error("{0}")]
    Transport(String),

    /// The remote service answered with a non-success status
    #[error("Remote service returned HTTP {0}")]
    RemoteStatus(u16),

    /// The response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;
