//! Game use-case service.
//!
//! # Invariants
//! - New games start active.
//! - Deleting a game removes every NPC, Location and Quest it references in
//!   the same transaction as the game itself.

use crate::model::game::{CascadeReport, Game, GameDetail, GameId, GameSummary};
use crate::model::normalize_name;
use crate::repo::game_repo::GameRepository;
use crate::repo::EntityKind;
use crate::service::{ServiceError, ServiceResult};
use log::info;

/// Game service facade over a repository implementation.
pub struct GameService<R: GameRepository> {
    repo: R,
}

impl<R: GameRepository> GameService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an active game and returns it as committed.
    pub fn create_game(&self, name: &str) -> ServiceResult<Game> {
        let game = Game::new(normalize_name(name)?);
        let id = self.repo.create_game(&game)?;
        info!("event=game_create module=service status=ok game_id={id}");
        self.repo
            .get_game(id)?
            .ok_or(ServiceError::InconsistentState(
                "created game not found in read-back",
            ))
    }

    /// Lists games with the size of each collection, oldest first.
    pub fn list_games(&self) -> ServiceResult<Vec<GameSummary>> {
        Ok(self.repo.list_games()?)
    }

    pub fn game_detail(&self, id: GameId) -> ServiceResult<GameDetail> {
        self.repo.game_detail(id)?.ok_or(ServiceError::NotFound {
            kind: EntityKind::Game,
            id,
        })
    }

    pub fn rename_game(&self, id: GameId, name: &str) -> ServiceResult<Game> {
        let name = normalize_name(name)?;
        let game = self.repo.rename_game(id, &name)?;
        info!("event=game_update module=service status=ok field=name game_id={id}");
        Ok(game)
    }

    pub fn set_active(&self, id: GameId, is_active: bool) -> ServiceResult<Game> {
        let game = self.repo.set_game_active(id, is_active)?;
        info!("event=game_update module=service status=ok field=is_active game_id={id}");
        Ok(game)
    }

    /// Deletes the game together with all of its NPCs, Locations and Quests.
    pub fn delete_game(&self, id: GameId) -> ServiceResult<CascadeReport> {
        let report = self.repo.delete_game_cascade(id)?;
        info!(
            "event=game_delete module=service status=ok game_id={id} npcs={} locations={} quests={}",
            report.npcs, report.locations, report.quests
        );
        Ok(report)
    }
}
