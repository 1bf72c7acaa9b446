//! Structured filters refining a character search

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Life-status filter for a character search
///
/// `All` is the default and means "do not filter on status"; it is never
/// sent to the remote directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterStatus {
    #[default]
    All,
    Alive,
    Dead,
    Unknown,
}

impl CharacterStatus {
    /// The value sent as the `status` query parameter, or `None` for `All`
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            CharacterStatus::All => None,
            CharacterStatus::Alive => Some("alive"),
            CharacterStatus::Dead => Some("dead"),
            CharacterStatus::Unknown => Some("unknown"),
        }
    }
}

impl fmt::Display for CharacterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacterStatus::All => write!(f, "all"),
            CharacterStatus::Alive => write!(f, "alive"),
            CharacterStatus::Dead => write!(f, "dead"),
            CharacterStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for CharacterStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(CharacterStatus::All),
            "alive" => Ok(CharacterStatus::Alive),
            "dead" => Ok(CharacterStatus::Dead),
            "unknown" => Ok(CharacterStatus::Unknown),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

/// Filter selection for a character search
///
/// The selection is "active" as soon as any field deviates from its default
/// (`All` status, no species, no type). An inactive selection combined with
/// an empty query means the search as a whole is in its default state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filters {
    /// Life-status restriction
    pub status: CharacterStatus,

    /// Species restriction (exact remote-side matching)
    pub species: Option<String>,

    /// Sub-type restriction; sent on the wire as `type`
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl Filters {
    /// Whether any field deviates from its default
    pub fn is_active(&self) -> bool {
        self.status != CharacterStatus::All || self.species.is_some() || self.kind.is_some()
    }
}

/// Partial update to a [`Filters`] value
///
/// Fields left as `None` keep their previous value; `species` and `kind`
/// carry a nested `Option` so a patch can also clear them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterUpdate {
    /// New status, if the patch touches it
    pub status: Option<CharacterStatus>,

    /// New species restriction (`Some(None)` clears it)
    pub species: Option<Option<String>>,

    /// New type restriction (`Some(None)` clears it)
    pub kind: Option<Option<String>>,
}

impl FilterUpdate {
    /// Patch that only changes the status
    pub fn status(status: CharacterStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Patch that only changes the species restriction
    pub fn species(species: Option<impl Into<String>>) -> Self {
        Self {
            species: Some(species.map(Into::into)),
            ..Self::default()
        }
    }

    /// Patch that only changes the type restriction
    pub fn kind(kind: Option<impl Into<String>>) -> Self {
        Self {
            kind: Some(kind.map(Into::into)),
            ..Self::default()
        }
    }

    /// Set the status on an existing patch
    pub fn with_status(mut self, status: CharacterStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the species restriction on an existing patch
    pub fn with_species(mut self, species: Option<impl Into<String>>) -> Self {
        self.species = Some(species.map(Into::into));
        self
    }

    /// Set the type restriction on an existing patch
    pub fn with_kind(mut self, kind: Option<impl Into<String>>) -> Self {
        self.kind = Some(kind.map(Into::into));
        self
    }

    /// Apply this patch to a filter selection, leaving untouched fields as-is
    pub fn apply(&self, filters: &mut Filters) {
        if let Some(status) = self.status {
            filters.status = status;
        }
        if let Some(species) = &self.species {
            filters.species = species.clone();
        }
        if let Some(kind) = &self.kind {
            filters.kind = kind.clone();
        }
    }
}
