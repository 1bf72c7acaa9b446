//! Lorebook Search - Reactive coordination of character directory searches
//!
//! This crate owns the one piece of the system that needs real concurrency
//! coordination:
//! - `FetchPort`: the async boundary to the remote directory
//! - `SearchCoordinator`: merges query and filter mutations into a single
//!   debounced, cancelable, last-writer-wins fetch cycle
//! - `StateUpdates`: an ordered stream of `SearchState` transitions

pub mod coordinator;
pub mod error;
pub mod port;

pub use coordinator::*;
pub use error::*;
pub use port::*;
