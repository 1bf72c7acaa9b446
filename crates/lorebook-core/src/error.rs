//! Error types for lorebook-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown character status: {0}")]
    InvalidStatus(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
