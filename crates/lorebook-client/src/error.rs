//! Error types for lorebook-client

use thiserror::Error;

/// Failures constructing a [`CharacterClient`](crate::CharacterClient)
///
/// Per-search failures are reported through `FetchError` on the port
/// boundary instead.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Http(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
