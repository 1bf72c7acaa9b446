//! Lorebook Core - Domain types for the character directory search
//!
//! This crate defines the value types shared across the workspace:
//! - `CharacterSummary`: one entry returned by the remote directory
//! - `Filters` / `FilterUpdate`: structured refinement of a search
//! - `SearchParams`: the merged query + filter input to a fetch
//! - `SearchState`: the tagged union exposed to the presentation layer

pub mod character;
pub mod error;
pub mod filters;
pub mod params;
pub mod state;

pub use character::*;
pub use error::*;
pub use filters::*;
pub use params::*;
pub use state::*;
