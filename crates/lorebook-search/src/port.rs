//! The async boundary to the remote character directory

use async_trait::async_trait;
use lorebook_core::{CharacterSummary, SearchParams};

use crate::error::Result;

/// One asynchronous search against the remote directory
///
/// Implementations must eventually resolve or be safely ignorable after
/// cancellation: the coordinator aborts in-flight searches on a best-effort
/// basis and never blocks waiting for the abort, so a late result may still
/// arrive and is discarded by generation comparison.
#[async_trait]
pub trait FetchPort: Send + Sync {
    /// Resolve the given params into an ordered list of characters
    ///
    /// An empty query means "match all"; an empty result list is a valid
    /// success, not an error.
    async fn search(&self, params: &SearchParams) -> Result<Vec<CharacterSummary>>;
}
