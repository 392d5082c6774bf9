use rusqlite::Connection;
use shattered_ring_core::db::{open_db, open_db_in_memory};
use shattered_ring_core::{
    CascadeReport, EditSession, Game, GameDetail, GameId, GameRepository, GameService,
    GameSummary, LocationDraft, LocationFlags, LocationService, NpcDraft, NpcService, QuestDraft,
    QuestFlags, QuestService, RepoResult, SaveOutcome, ServiceError, SqliteGameRepository,
    SqliteLocationRepository, SqliteNpcRepository, SqliteQuestRepository,
};

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn npc_draft(name: &str) -> NpcDraft {
    NpcDraft {
        name: name.to_string(),
        ..NpcDraft::default()
    }
}

#[test]
fn deleting_campaign_leaves_no_orphans() {
    let conn = open_db_in_memory().unwrap();
    let games = GameService::new(SqliteGameRepository::new(&conn));
    let npcs = NpcService::new(SqliteNpcRepository::new(&conn));
    let locations = LocationService::new(SqliteLocationRepository::new(&conn));

    let game = games.create_game("Campaign A").unwrap();
    let bob = npcs.create_npc(game.id, npc_draft("Bob")).unwrap();
    let mut session = EditSession::create(
        game.id,
        Some(bob.id),
        LocationDraft::new("Tavern", LocationFlags::default(), ""),
    );
    assert!(matches!(
        locations.save(&mut session).unwrap(),
        SaveOutcome::Saved(_)
    ));

    let report = games.delete_game(game.id).unwrap();

    assert_eq!(
        report,
        CascadeReport {
            npcs: 1,
            locations: 1,
            quests: 0,
        }
    );
    for table in [
        "games",
        "npcs",
        "locations",
        "quests",
        "game_npcs",
        "game_locations",
        "game_quests",
        "npc_locations",
        "npc_quests",
    ] {
        assert_eq!(count_rows(&conn, table), 0, "{table} should be empty");
    }
}

#[test]
fn deleting_one_game_keeps_other_games_intact() {
    let conn = open_db_in_memory().unwrap();
    let games = GameService::new(SqliteGameRepository::new(&conn));
    let npcs = NpcService::new(SqliteNpcRepository::new(&conn));
    let quests = QuestService::new(SqliteQuestRepository::new(&conn));

    let doomed = games.create_game("Campaign A").unwrap();
    let kept = games.create_game("Campaign B").unwrap();
    npcs.create_npc(doomed.id, npc_draft("Bob")).unwrap();
    let alice = npcs.create_npc(kept.id, npc_draft("Alice")).unwrap();
    let mut session = EditSession::create(
        kept.id,
        Some(alice.id),
        QuestDraft::new("Find the ring", QuestFlags::default(), ""),
    );
    quests.save(&mut session).unwrap();

    games.delete_game(doomed.id).unwrap();

    let remaining = games.list_games().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].game.id, kept.id);
    assert_eq!(remaining[0].npc_count, 1);
    assert_eq!(remaining[0].quest_count, 1);
    assert_eq!(quests.list_for_npc(alice.id).unwrap().len(), 1);
}

#[test]
fn deleting_missing_game_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let games = GameService::new(SqliteGameRepository::new(&conn));

    let err = games.delete_game(12345).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { id: 12345, .. }));
}

#[test]
fn detail_counts_cleared_locations_and_completed_quests() {
    let conn = open_db_in_memory().unwrap();
    let games = GameService::new(SqliteGameRepository::new(&conn));
    let npcs = NpcService::new(SqliteNpcRepository::new(&conn));
    let locations = LocationService::new(SqliteLocationRepository::new(&conn));
    let quests = QuestService::new(SqliteQuestRepository::new(&conn));

    let game = games.create_game("Campaign A").unwrap();
    npcs.create_npc(game.id, npc_draft("Bob")).unwrap();
    npcs.create_npc(game.id, npc_draft("Alice")).unwrap();
    for (name, is_cleared) in [("Tavern", true), ("Crypt", false), ("Keep", true)] {
        let flags = LocationFlags {
            is_cleared,
            ..LocationFlags::default()
        };
        let mut session = EditSession::create(game.id, None, LocationDraft::new(name, flags, ""));
        locations.save(&mut session).unwrap();
    }
    for (name, is_complete) in [("Find the ring", false), ("Slay the rat", true)] {
        let mut session = EditSession::create(
            game.id,
            None,
            QuestDraft::new(name, QuestFlags { is_complete }, ""),
        );
        quests.save(&mut session).unwrap();
    }

    let detail = games.game_detail(game.id).unwrap();
    assert_eq!(detail.npc_count, 2);
    assert_eq!(detail.location_count, 3);
    assert_eq!(detail.locations_cleared, 2);
    assert_eq!(detail.quest_count, 2);
    assert_eq!(detail.quests_completed, 1);
}

#[test]
fn create_rename_and_deactivate_game() {
    let conn = open_db_in_memory().unwrap();
    let games = GameService::new(SqliteGameRepository::new(&conn));

    let game = games.create_game("  Campaign A ").unwrap();
    assert_eq!(game.name, "Campaign A");
    assert!(game.is_active);

    let renamed = games.rename_game(game.id, "Campaign Alpha").unwrap();
    assert_eq!(renamed.name, "Campaign Alpha");
    let inactive = games.set_active(game.id, false).unwrap();
    assert!(!inactive.is_active);
    assert_eq!(inactive.name, "Campaign Alpha");

    assert_eq!(
        games.rename_game(game.id, "").unwrap_err().code(),
        "invalid_input"
    );
}

#[test]
fn games_list_in_creation_order() {
    let conn = open_db_in_memory().unwrap();
    let games = GameService::new(SqliteGameRepository::new(&conn));
    let first = games.create_game("First").unwrap();
    let second = games.create_game("Second").unwrap();
    conn.execute(
        "UPDATE games SET created_at = created_at + 1000 WHERE id = ?1;",
        [second.id],
    )
    .unwrap();

    let listed = games
        .list_games()
        .unwrap()
        .into_iter()
        .map(|summary| summary.game.id)
        .collect::<Vec<_>>();
    assert_eq!(listed, vec![first.id, second.id]);
}

/// Game repository whose writes first let another connection commit.
struct InterleavedGames<'conn> {
    inner: SqliteGameRepository<'conn>,
    other: &'conn Connection,
}

impl InterleavedGames<'_> {
    fn deactivate_elsewhere(&self, id: GameId) {
        GameService::new(SqliteGameRepository::new(self.other))
            .set_active(id, false)
            .unwrap();
    }
}

impl GameRepository for InterleavedGames<'_> {
    fn create_game(&self, game: &Game) -> RepoResult<GameId> {
        self.inner.create_game(game)
    }

    fn rename_game(&self, id: GameId, name: &str) -> RepoResult<Game> {
        self.deactivate_elsewhere(id);
        self.inner.rename_game(id, name)
    }

    fn set_game_active(&self, id: GameId, is_active: bool) -> RepoResult<Game> {
        self.inner.set_game_active(id, is_active)
    }

    fn get_game(&self, id: GameId) -> RepoResult<Option<Game>> {
        self.inner.get_game(id)
    }

    fn list_games(&self) -> RepoResult<Vec<GameSummary>> {
        self.inner.list_games()
    }

    fn game_detail(&self, id: GameId) -> RepoResult<Option<GameDetail>> {
        self.inner.game_detail(id)
    }

    fn delete_game_cascade(&self, id: GameId) -> RepoResult<CascadeReport> {
        self.inner.delete_game_cascade(id)
    }
}

#[test]
fn rename_keeps_active_flag_committed_by_another_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("campaigns.sqlite3");
    let conn = open_db(&path).unwrap();
    let other = open_db(&path).unwrap();
    let game = GameService::new(SqliteGameRepository::new(&conn))
        .create_game("Campaign A")
        .unwrap();

    let games = GameService::new(InterleavedGames {
        inner: SqliteGameRepository::new(&conn),
        other: &other,
    });
    let renamed = games.rename_game(game.id, "Campaign B").unwrap();

    assert_eq!(renamed.name, "Campaign B");
    assert!(!renamed.is_active);
    let stored = GameService::new(SqliteGameRepository::new(&other))
        .game_detail(game.id)
        .unwrap();
    assert_eq!(stored.game.name, "Campaign B");
    assert!(!stored.game.is_active);
}

#[test]
fn renaming_missing_game_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let games = GameService::new(SqliteGameRepository::new(&conn));

    let err = games.rename_game(77, "Campaign A").unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { id: 77, .. }));
    assert_eq!(games.set_active(77, true).unwrap_err().code(), "not_found");
}
