//! Campaign domain model.
//!
//! # Responsibility
//! - Define the four tracked entity kinds: Game, NPC, Location, Quest.
//! - Define drafts (user-entered, not yet persisted values) and their
//!   normalization rules.
//!
//! # Invariants
//! - Every entity is identified by a random `EntityId` assigned at creation
//!   and never changed afterwards.
//! - Names are trimmed and never blank once normalized.

pub mod game;
pub mod npc;
pub mod record;

use rand::Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identifier shared by every entity kind.
pub type EntityId = i64;

/// Generates a fresh random identifier for a new entity.
pub fn new_entity_id() -> EntityId {
    rand::thread_rng().gen()
}

/// Validation failure for user-entered values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Name is empty after trimming.
    BlankName,
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "name must not be blank"),
        }
    }
}

impl Error for ModelValidationError {}

/// Trims a user-entered name and rejects blank values.
pub fn normalize_name(name: &str) -> Result<String, ModelValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ModelValidationError::BlankName);
    }
    Ok(trimmed.to_string())
}
