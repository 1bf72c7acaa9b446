//! The search state machine exposed to the presentation layer

use crate::character::CharacterSummary;

/// Tagged union the presentation layer renders from
///
/// Transitions are driven solely by settled search input and by the
/// resolution of the current-generation fetch:
/// - any settle of default params re-enters `Initial` without a fetch
/// - any settle of non-default params enters `Loading` before the fetch
/// - `Loading` resolves to `Success`, `Empty` or `Error`
///
/// `Success` always carries a non-empty list; a fetch that succeeds with
/// zero results resolves to `Empty` instead. There is no automatic way out
/// of `Error`, `Success` or `Empty` other than a new settled input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchState {
    /// Nothing searched yet, or the input returned to its default
    #[default]
    Initial,

    /// A fetch for the current settled input is in flight
    Loading,

    /// The fetch resolved with at least one character, in remote order
    Success(Vec<CharacterSummary>),

    /// The fetch resolved successfully but matched nothing
    Empty,

    /// The fetch failed; carries a descriptive message
    Error(String),
}

impl SearchState {
    /// Whether a fetch is currently in flight
    pub fn is_loading(&self) -> bool {
        matches!(self, SearchState::Loading)
    }

    /// The result list, when in `Success`
    pub fn results(&self) -> Option<&[CharacterSummary]> {
        match self {
            SearchState::Success(results) => Some(results),
            _ => None,
        }
    }
}
