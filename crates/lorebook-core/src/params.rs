//! The merged search input: query text plus filter selection

use serde::{Deserialize, Serialize};

use crate::filters::{FilterUpdate, Filters};

/// Immutable search input, compared by value
///
/// Exactly one `SearchParams` is "current" at any instant inside the
/// coordinator; it is the sole input to the next fetch decision. Two params
/// are equal iff the query strings and every filter field match.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchParams {
    /// Free-text query, already trimmed; empty means "no text filter"
    query: String,

    /// Structured filter selection
    filters: Filters,
}

impl SearchParams {
    /// Build params from raw query text and a filter selection
    pub fn new(query: impl AsRef<str>, filters: Filters) -> Self {
        Self {
            query: query.as_ref().trim().to_string(),
            filters,
        }
    }

    /// The trimmed query text
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The filter selection
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Replace the query portion, trimming the input
    pub fn set_query(&mut self, text: impl AsRef<str>) {
        self.query = text.as_ref().trim().to_string();
    }

    /// Apply a partial filter update, keeping unspecified fields
    pub fn update_filters(&mut self, update: &FilterUpdate) {
        update.apply(&mut self.filters);
    }

    /// Reset the filters to their defaults, leaving the query untouched
    pub fn clear_filters(&mut self) {
        self.filters = Filters::default();
    }

    /// Whether this is the default input: empty query, inactive filters
    ///
    /// Default params short-circuit the fetch cycle entirely; the state
    /// machine goes back to `Initial` without touching the fetch boundary.
    pub fn is_default(&self) -> bool {
        self.query.is_empty() && !self.filters.is_active()
    }
}
