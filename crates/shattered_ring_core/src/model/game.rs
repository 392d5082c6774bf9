//! Game (campaign container) model.

use super::{new_entity_id, EntityId};
use serde::{Deserialize, Serialize};

pub type GameId = EntityId;

/// Top-level campaign container.
///
/// Membership of NPCs, Locations and Quests lives in the store's ordered
/// collections, not on this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub is_active: bool,
}

impl Game {
    /// Creates an active game with a generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_entity_id(),
            name: name.into(),
            is_active: true,
        }
    }
}

/// Game list row: the game plus the size of each of its collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub game: Game,
    pub npc_count: u32,
    pub location_count: u32,
    pub quest_count: u32,
}

/// Progress figures shown on the game detail screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDetail {
    pub game: Game,
    /// NPCs met so far.
    pub npc_count: u32,
    /// Locations discovered so far.
    pub location_count: u32,
    pub locations_cleared: u32,
    /// Quests accepted so far.
    pub quest_count: u32,
    pub quests_completed: u32,
}

/// Number of rows removed by a cascading game delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub npcs: u32,
    pub locations: u32,
    pub quests: u32,
}
