//! Error types for the `arbor-zone` crate.

use arbor_types::CharacterId;

/// Errors that can occur while populating a zone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZoneError {
    /// An agent driving the same character is already in the zone.
    #[error("zone '{zone}' already contains agent {character_id}")]
    DuplicateAgent {
        /// Name of the zone.
        zone: String,
        /// The conflicting character.
        character_id: CharacterId,
    },
}
