//! NPC use-case service.
//!
//! # Invariants
//! - NPC names are trimmed and non-blank; notes are trimmed.
//! - Deleting an NPC keeps the Locations and Quests it referenced.

use crate::model::game::GameId;
use crate::model::npc::{Npc, NpcDraft, NpcId, NpcSummary};
use crate::repo::npc_repo::NpcRepository;
use crate::repo::EntityKind;
use crate::service::{ServiceError, ServiceResult};
use log::info;

/// NPC service facade over a repository implementation.
pub struct NpcService<R: NpcRepository> {
    repo: R,
}

impl<R: NpcRepository> NpcService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an NPC in `game_id`'s collection.
    pub fn create_npc(&self, game_id: GameId, draft: NpcDraft) -> ServiceResult<Npc> {
        let npc = draft.normalized()?.into_npc();
        let id = self.repo.create_npc(game_id, &npc)?;
        info!("event=npc_create module=service status=ok npc_id={id} game_id={game_id}");
        self.read_back(id, "created npc not found in read-back")
    }

    /// Overwrites name, merchant flag and notes of an existing NPC.
    pub fn update_npc(&self, id: NpcId, draft: NpcDraft) -> ServiceResult<Npc> {
        let draft = draft.normalized()?;
        let npc = Npc {
            id,
            name: draft.name,
            is_merchant: draft.is_merchant,
            notes: draft.notes,
        };
        self.repo.update_npc(&npc)?;
        info!("event=npc_update module=service status=ok npc_id={id}");
        self.read_back(id, "updated npc not found in read-back")
    }

    pub fn get_npc(&self, id: NpcId) -> ServiceResult<Npc> {
        self.repo.get_npc(id)?.ok_or(ServiceError::NotFound {
            kind: EntityKind::Npc,
            id,
        })
    }

    /// Lists the game's NPCs in the order they were met.
    pub fn list_npcs(&self, game_id: GameId) -> ServiceResult<Vec<NpcSummary>> {
        Ok(self.repo.list_game_npcs(game_id)?)
    }

    pub fn delete_npc(&self, id: NpcId) -> ServiceResult<()> {
        self.repo.delete_npc(id)?;
        info!("event=npc_delete module=service status=ok npc_id={id}");
        Ok(())
    }

    fn read_back(&self, id: NpcId, details: &'static str) -> ServiceResult<Npc> {
        self.repo
            .get_npc(id)?
            .ok_or(ServiceError::InconsistentState(details))
    }
}
