//! Core domain logic for the Shattered Ring campaign tracker.
//! This crate is the single source of truth for campaign data invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::game::{CascadeReport, Game, GameDetail, GameId, GameSummary};
pub use model::npc::{Npc, NpcDraft, NpcId, NpcSummary};
pub use model::record::{
    Location, LocationDraft, LocationFlags, LocationId, Quest, QuestDraft, QuestFlags, QuestId,
    RecordDraft, RecordKind, TrackedRecord,
};
pub use model::{EntityId, ModelValidationError};
pub use repo::game_repo::{GameRepository, SqliteGameRepository};
pub use repo::npc_repo::{NpcRepository, SqliteNpcRepository};
pub use repo::record_repo::{
    RecordRepository, SqliteLocationRepository, SqliteQuestRepository, SqliteRecordRepository,
};
pub use repo::{EntityKind, RepoError, RepoResult};
pub use service::edit_session::{EditSession, ReuseDecision, SaveOutcome};
pub use service::game_service::GameService;
pub use service::npc_service::NpcService;
pub use service::record_service::{LocationService, QuestService, RecordService};
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
