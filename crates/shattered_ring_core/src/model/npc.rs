//! Non-player character model.

use super::{new_entity_id, normalize_name, EntityId, ModelValidationError};
use serde::{Deserialize, Serialize};

pub type NpcId = EntityId;

/// Non-player character. Linked many-to-many to Locations and Quests through
/// store collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    pub id: NpcId,
    pub name: String,
    pub is_merchant: bool,
    pub notes: String,
}

/// NPC list row with the size of the NPC's reference collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcSummary {
    pub npc: Npc,
    pub location_count: u32,
    pub quest_count: u32,
}

/// Values entered in the NPC editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NpcDraft {
    pub name: String,
    pub is_merchant: bool,
    pub notes: String,
}

impl NpcDraft {
    /// Trims name and notes; rejects a blank name.
    pub fn normalized(self) -> Result<Self, ModelValidationError> {
        Ok(Self {
            name: normalize_name(&self.name)?,
            is_merchant: self.is_merchant,
            notes: self.notes.trim().to_string(),
        })
    }

    /// Materializes this draft as a new NPC with a generated id.
    pub fn into_npc(self) -> Npc {
        Npc {
            id: new_entity_id(),
            name: self.name,
            is_merchant: self.is_merchant,
            notes: self.notes,
        }
    }
}
