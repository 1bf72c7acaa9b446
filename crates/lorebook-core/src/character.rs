//! Character entries returned by the remote directory

use serde::{Deserialize, Serialize};

/// One character as listed by the remote directory
///
/// This is the shape the fetch boundary must produce; the core never
/// constructs these itself. Ordering within a result list is whatever the
/// remote service returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSummary {
    /// Remote identifier
    pub id: u64,

    /// Display name
    pub name: String,

    /// Species label (e.g. "Human")
    pub species: String,

    /// Life status label as reported by the directory
    pub status: String,

    /// Name of the character's origin location
    pub origin: String,

    /// Portrait image URL
    pub image: String,

    /// Sub-type within the species, when the directory has one
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Creation timestamp string, verbatim from the directory
    pub created: String,
}
