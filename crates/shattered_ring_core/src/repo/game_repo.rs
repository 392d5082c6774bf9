//! Game repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist games and compute the counts shown on list/detail screens.
//! - Own the cascading delete of a game and every member of its collections.
//!
//! # Invariants
//! - A cascading delete removes the game, its NPCs, Locations and Quests in
//!   one write transaction; nothing is left behind on failure or success.
//! - Games list in creation order.

use crate::model::game::{CascadeReport, Game, GameDetail, GameId, GameSummary};
use crate::repo::{
    begin_write, bool_to_int, count_links, count_to_u32, int_to_bool, EntityKind, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};

const GAME_SELECT_SQL: &str = "SELECT id, name, is_active FROM games";

/// Repository interface for game operations.
pub trait GameRepository {
    fn create_game(&self, game: &Game) -> RepoResult<GameId>;
    /// Sets the name only; other columns keep their committed values.
    fn rename_game(&self, id: GameId, name: &str) -> RepoResult<Game>;
    /// Sets the active flag only; other columns keep their committed values.
    fn set_game_active(&self, id: GameId, is_active: bool) -> RepoResult<Game>;
    fn get_game(&self, id: GameId) -> RepoResult<Option<Game>>;
    fn list_games(&self) -> RepoResult<Vec<GameSummary>>;
    fn game_detail(&self, id: GameId) -> RepoResult<Option<GameDetail>>;
    /// Deletes the game and every NPC, Location and Quest it references.
    fn delete_game_cascade(&self, id: GameId) -> RepoResult<CascadeReport>;
}

/// SQLite-backed game repository.
pub struct SqliteGameRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGameRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl GameRepository for SqliteGameRepository<'_> {
    fn create_game(&self, game: &Game) -> RepoResult<GameId> {
        self.conn.execute(
            "INSERT INTO games (id, name, is_active) VALUES (?1, ?2, ?3);",
            params![game.id, game.name.as_str(), bool_to_int(game.is_active)],
        )?;
        Ok(game.id)
    }

    fn rename_game(&self, id: GameId, name: &str) -> RepoResult<Game> {
        update_column(self.conn, id, "name", Value::Text(name.to_string()))
    }

    fn set_game_active(&self, id: GameId, is_active: bool) -> RepoResult<Game> {
        update_column(
            self.conn,
            id,
            "is_active",
            Value::Integer(bool_to_int(is_active)),
        )
    }

    fn get_game(&self, id: GameId) -> RepoResult<Option<Game>> {
        load_game(self.conn, id)
    }

    fn list_games(&self) -> RepoResult<Vec<GameSummary>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{GAME_SELECT_SQL} ORDER BY created_at ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut games = Vec::new();
        while let Some(row) = rows.next()? {
            games.push(parse_game_row(row)?);
        }

        games
            .into_iter()
            .map(|game| {
                Ok(GameSummary {
                    npc_count: count_links(self.conn, "game_npcs", "game_id", game.id)?,
                    location_count: count_links(self.conn, "game_locations", "game_id", game.id)?,
                    quest_count: count_links(self.conn, "game_quests", "game_id", game.id)?,
                    game,
                })
            })
            .collect()
    }

    fn game_detail(&self, id: GameId) -> RepoResult<Option<GameDetail>> {
        let Some(game) = load_game(self.conn, id)? else {
            return Ok(None);
        };

        let (location_count, locations_cleared) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(l.is_cleared), 0)
             FROM game_locations gl
             INNER JOIN locations l ON l.id = gl.location_id
             WHERE gl.game_id = ?1;",
            [id],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;
        let (quest_count, quests_completed) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(q.is_complete), 0)
             FROM game_quests gq
             INNER JOIN quests q ON q.id = gq.quest_id
             WHERE gq.game_id = ?1;",
            [id],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;

        Ok(Some(GameDetail {
            npc_count: count_links(self.conn, "game_npcs", "game_id", id)?,
            location_count: count_to_u32(location_count, "game_locations")?,
            locations_cleared: count_to_u32(locations_cleared, "locations.is_cleared")?,
            quest_count: count_to_u32(quest_count, "game_quests")?,
            quests_completed: count_to_u32(quests_completed, "quests.is_complete")?,
            game,
        }))
    }

    fn delete_game_cascade(&self, id: GameId) -> RepoResult<CascadeReport> {
        let tx = begin_write(self.conn)?;
        if load_game(&tx, id)?.is_none() {
            return Err(RepoError::NotFound {
                kind: EntityKind::Game,
                id,
            });
        }

        // Members go first: deleting the game row would drop the link rows
        // that identify them.
        let npcs = tx.execute(
            "DELETE FROM npcs
             WHERE id IN (SELECT npc_id FROM game_npcs WHERE game_id = ?1);",
            [id],
        )?;
        let locations = tx.execute(
            "DELETE FROM locations
             WHERE id IN (SELECT location_id FROM game_locations WHERE game_id = ?1);",
            [id],
        )?;
        let quests = tx.execute(
            "DELETE FROM quests
             WHERE id IN (SELECT quest_id FROM game_quests WHERE game_id = ?1);",
            [id],
        )?;
        tx.execute("DELETE FROM games WHERE id = ?1;", [id])?;
        tx.commit()?;

        Ok(CascadeReport {
            npcs: count_to_u32(npcs as i64, "npcs")?,
            locations: count_to_u32(locations as i64, "locations")?,
            quests: count_to_u32(quests as i64, "quests")?,
        })
    }
}

/// Writes one column and re-reads the game inside the same write transaction.
fn update_column(conn: &Connection, id: GameId, column: &str, value: Value) -> RepoResult<Game> {
    let tx = begin_write(conn)?;
    let changed = tx.execute(
        &format!(
            "UPDATE games
             SET
                {column} = ?2,
                updated_at = (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
             WHERE id = ?1;"
        ),
        params![id, value],
    )?;
    if changed == 0 {
        return Err(RepoError::NotFound {
            kind: EntityKind::Game,
            id,
        });
    }
    let game = load_game(&tx, id)?.ok_or(RepoError::NotFound {
        kind: EntityKind::Game,
        id,
    })?;
    tx.commit()?;
    Ok(game)
}

fn load_game(conn: &Connection, id: GameId) -> RepoResult<Option<Game>> {
    let mut stmt = conn.prepare(&format!("{GAME_SELECT_SQL} WHERE id = ?1;"))?;
    let row = stmt
        .query_row([id], |row| Ok(parse_game_row(row)))
        .optional()?;
    row.transpose()
}

fn parse_game_row(row: &Row<'_>) -> RepoResult<Game> {
    Ok(Game {
        id: row.get("id")?,
        name: row.get("name")?,
        is_active: int_to_bool(row.get("is_active")?, "games.is_active")?,
    })
}
