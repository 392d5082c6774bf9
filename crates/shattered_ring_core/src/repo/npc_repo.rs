//! NPC repository contracts and SQLite implementation.
//!
//! # Invariants
//! - A new NPC is appended to its game's collection in the same transaction
//!   that inserts it.
//! - Deleting an NPC drops its references but never the Locations/Quests
//!   it referenced.

use crate::model::game::GameId;
use crate::model::npc::{Npc, NpcId, NpcSummary};
use crate::repo::{
    begin_write, bool_to_int, count_links, ensure_exists, int_to_bool, link_if_absent, EntityKind,
    RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(crate) const NPC_SELECT_SQL: &str = "SELECT n.id AS id, n.name AS name, n.is_merchant AS is_merchant, n.notes AS notes
FROM npcs n";

/// Repository interface for NPC operations.
pub trait NpcRepository {
    /// Inserts the NPC and appends it to the game's NPC collection.
    fn create_npc(&self, game_id: GameId, npc: &Npc) -> RepoResult<NpcId>;
    fn update_npc(&self, npc: &Npc) -> RepoResult<()>;
    fn get_npc(&self, id: NpcId) -> RepoResult<Option<Npc>>;
    /// Lists the game's NPCs in collection order.
    fn list_game_npcs(&self, game_id: GameId) -> RepoResult<Vec<NpcSummary>>;
    fn delete_npc(&self, id: NpcId) -> RepoResult<()>;
}

/// SQLite-backed NPC repository.
pub struct SqliteNpcRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNpcRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NpcRepository for SqliteNpcRepository<'_> {
    fn create_npc(&self, game_id: GameId, npc: &Npc) -> RepoResult<NpcId> {
        let tx = begin_write(self.conn)?;
        ensure_exists(&tx, "games", EntityKind::Game, game_id)?;
        tx.execute(
            "INSERT INTO npcs (id, name, is_merchant, notes) VALUES (?1, ?2, ?3, ?4);",
            params![
                npc.id,
                npc.name.as_str(),
                bool_to_int(npc.is_merchant),
                npc.notes.as_str(),
            ],
        )?;
        link_if_absent(&tx, "game_npcs", "game_id", "npc_id", game_id, npc.id)?;
        tx.commit()?;
        Ok(npc.id)
    }

    fn update_npc(&self, npc: &Npc) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE npcs
             SET
                name = ?2,
                is_merchant = ?3,
                notes = ?4,
                updated_at = (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
             WHERE id = ?1;",
            params![
                npc.id,
                npc.name.as_str(),
                bool_to_int(npc.is_merchant),
                npc.notes.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Npc,
                id: npc.id,
            });
        }
        Ok(())
    }

    fn get_npc(&self, id: NpcId) -> RepoResult<Option<Npc>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NPC_SELECT_SQL} WHERE n.id = ?1;"))?;
        let row = stmt
            .query_row([id], |row| Ok(parse_npc_row(row)))
            .optional()?;
        row.transpose()
    }

    fn list_game_npcs(&self, game_id: GameId) -> RepoResult<Vec<NpcSummary>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NPC_SELECT_SQL}
             INNER JOIN game_npcs gn ON gn.npc_id = n.id
             WHERE gn.game_id = ?1
             ORDER BY gn.position ASC;"
        ))?;
        let mut rows = stmt.query([game_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let npc = parse_npc_row(row)?;
            items.push(NpcSummary {
                location_count: count_links(self.conn, "npc_locations", "npc_id", npc.id)?,
                quest_count: count_links(self.conn, "npc_quests", "npc_id", npc.id)?,
                npc,
            });
        }
        Ok(items)
    }

    fn delete_npc(&self, id: NpcId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM npcs WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Npc,
                id,
            });
        }
        Ok(())
    }
}

pub(crate) fn parse_npc_row(row: &Row<'_>) -> RepoResult<Npc> {
    Ok(Npc {
        id: row.get("id")?,
        name: row.get("name")?,
        is_merchant: int_to_bool(row.get("is_merchant")?, "npcs.is_merchant")?,
        notes: row.get("notes")?,
    })
}
