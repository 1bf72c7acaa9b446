//! Lorebook Client - Remote character directory access over HTTPS
//!
//! This crate provides:
//! - `CharacterClient`: a `FetchPort` implementation backed by `reqwest`
//! - Wire-format decoding of the directory's paginated JSON envelope

pub mod client;
pub mod error;

pub use client::*;
pub use error::*;
