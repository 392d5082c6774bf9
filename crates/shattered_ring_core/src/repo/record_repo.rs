//! Location/Quest repository contracts and one SQLite implementation shared
//! by both kinds.
//!
//! # Responsibility
//! - Provide name lookup, create-and-attach and reuse-and-attach writes.
//! - Keep per-kind table/column knowledge in `RecordTable`.
//!
//! # Invariants
//! - Name lookup is exact (case-sensitive) equality; the earliest created
//!   match wins.
//! - Attaching to a game or NPC collection is a no-op when the record is
//!   already a member (identifier equality).
//! - Create/reuse writes re-read game, NPC and record inside the write
//!   transaction and commit insert/update plus links together.

use crate::model::game::GameId;
use crate::model::npc::{Npc, NpcId};
use crate::model::record::{
    merge_reused_notes, Location, LocationFlags, Quest, QuestFlags, TrackedRecord,
};
use crate::model::EntityId;
use crate::repo::npc_repo::{parse_npc_row, NPC_SELECT_SQL};
use crate::repo::{
    begin_write, bool_to_int, ensure_exists, int_to_bool, link_if_absent, EntityKind, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::marker::PhantomData;

/// Storage layout of one record kind.
pub trait RecordTable: TrackedRecord {
    const ENTITY: EntityKind;
    const TABLE: &'static str;
    /// Link table of the owning game's collection.
    const GAME_LINK_TABLE: &'static str;
    /// Link table of NPC reference collections.
    const NPC_LINK_TABLE: &'static str;
    /// Member column name in both link tables.
    const LINK_COLUMN: &'static str;
    const FLAG_COLUMNS: &'static [&'static str];

    /// Flag values in `FLAG_COLUMNS` order.
    fn flag_values(flags: Self::Flags) -> Vec<bool>;
    fn parse_flags(row: &Row<'_>) -> RepoResult<Self::Flags>;
}

impl RecordTable for Location {
    const ENTITY: EntityKind = EntityKind::Location;
    const TABLE: &'static str = "locations";
    const GAME_LINK_TABLE: &'static str = "game_locations";
    const NPC_LINK_TABLE: &'static str = "npc_locations";
    const LINK_COLUMN: &'static str = "location_id";
    const FLAG_COLUMNS: &'static [&'static str] = &["is_cleared", "has_smith", "has_merchant"];

    fn flag_values(flags: LocationFlags) -> Vec<bool> {
        vec![flags.is_cleared, flags.has_smith, flags.has_merchant]
    }

    fn parse_flags(row: &Row<'_>) -> RepoResult<LocationFlags> {
        Ok(LocationFlags {
            is_cleared: int_to_bool(row.get("is_cleared")?, "locations.is_cleared")?,
            has_smith: int_to_bool(row.get("has_smith")?, "locations.has_smith")?,
            has_merchant: int_to_bool(row.get("has_merchant")?, "locations.has_merchant")?,
        })
    }
}

impl RecordTable for Quest {
    const ENTITY: EntityKind = EntityKind::Quest;
    const TABLE: &'static str = "quests";
    const GAME_LINK_TABLE: &'static str = "game_quests";
    const NPC_LINK_TABLE: &'static str = "npc_quests";
    const LINK_COLUMN: &'static str = "quest_id";
    const FLAG_COLUMNS: &'static [&'static str] = &["is_complete"];

    fn flag_values(flags: QuestFlags) -> Vec<bool> {
        vec![flags.is_complete]
    }

    fn parse_flags(row: &Row<'_>) -> RepoResult<QuestFlags> {
        Ok(QuestFlags {
            is_complete: int_to_bool(row.get("is_complete")?, "quests.is_complete")?,
        })
    }
}

/// Repository interface shared by Locations and Quests.
pub trait RecordRepository<R: TrackedRecord> {
    fn get_record(&self, id: EntityId) -> RepoResult<Option<R>>;
    /// Returns the first record whose name equals `name` exactly.
    fn find_by_name(&self, name: &str) -> RepoResult<Option<R>>;
    /// Lists the game's records in collection order.
    fn list_for_game(&self, game_id: GameId) -> RepoResult<Vec<R>>;
    /// Lists the records an NPC references, in collection order.
    fn list_for_npc(&self, npc_id: NpcId) -> RepoResult<Vec<R>>;
    /// Lists NPCs referencing the record.
    fn npcs_referencing(&self, id: EntityId) -> RepoResult<Vec<Npc>>;
    /// Inserts a new record and appends it to the game's collection and,
    /// when given, the NPC's collection.
    fn create_attached(&self, record: &R, game_id: GameId, npc_id: Option<NpcId>)
        -> RepoResult<R>;
    /// Overwrites the flags of an existing record, appends `new_notes` to its
    /// notes, and attaches it to the game (and NPC) unless already present.
    fn reuse_attached(
        &self,
        id: EntityId,
        flags: R::Flags,
        new_notes: &str,
        game_id: GameId,
        npc_id: Option<NpcId>,
    ) -> RepoResult<R>;
    /// Overwrites name, flags and notes of an existing record.
    fn update_record(&self, record: &R) -> RepoResult<R>;
    /// Adds the record to an NPC's collection. Returns `false` when the NPC
    /// already referenced it.
    fn attach_to_npc(&self, id: EntityId, npc_id: NpcId) -> RepoResult<bool>;
    fn delete_record(&self, id: EntityId) -> RepoResult<()>;
}

/// SQLite-backed repository for one record kind.
pub struct SqliteRecordRepository<'conn, R> {
    conn: &'conn Connection,
    _kind: PhantomData<R>,
}

pub type SqliteLocationRepository<'conn> = SqliteRecordRepository<'conn, Location>;
pub type SqliteQuestRepository<'conn> = SqliteRecordRepository<'conn, Quest>;

impl<'conn, R: RecordTable> SqliteRecordRepository<'conn, R> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _kind: PhantomData,
        }
    }
}

impl<R: RecordTable> RecordRepository<R> for SqliteRecordRepository<'_, R> {
    fn get_record(&self, id: EntityId) -> RepoResult<Option<R>> {
        load_record::<R>(self.conn, id)
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<R>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE r.name = ?1 ORDER BY r.created_at ASC, r.id ASC LIMIT 1;",
            select_sql::<R>()
        ))?;
        let row = stmt
            .query_row([name], |row| Ok(parse_record_row::<R>(row)))
            .optional()?;
        row.transpose()
    }

    fn list_for_game(&self, game_id: GameId) -> RepoResult<Vec<R>> {
        list_linked::<R>(self.conn, R::GAME_LINK_TABLE, "game_id", game_id)
    }

    fn list_for_npc(&self, npc_id: NpcId) -> RepoResult<Vec<R>> {
        list_linked::<R>(self.conn, R::NPC_LINK_TABLE, "npc_id", npc_id)
    }

    fn npcs_referencing(&self, id: EntityId) -> RepoResult<Vec<Npc>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NPC_SELECT_SQL}
             INNER JOIN {link} l ON l.npc_id = n.id
             WHERE l.{column} = ?1
             ORDER BY n.name ASC, n.id ASC;",
            link = R::NPC_LINK_TABLE,
            column = R::LINK_COLUMN,
        ))?;
        let mut rows = stmt.query([id])?;
        let mut npcs = Vec::new();
        while let Some(row) = rows.next()? {
            npcs.push(parse_npc_row(row)?);
        }
        Ok(npcs)
    }

    fn create_attached(
        &self,
        record: &R,
        game_id: GameId,
        npc_id: Option<NpcId>,
    ) -> RepoResult<R> {
        let tx = begin_write(self.conn)?;
        ensure_exists(&tx, "games", EntityKind::Game, game_id)?;
        if let Some(npc_id) = npc_id {
            ensure_exists(&tx, "npcs", EntityKind::Npc, npc_id)?;
        }

        let columns = std::iter::once("id")
            .chain(["name", "notes"])
            .chain(R::FLAG_COLUMNS.iter().copied())
            .collect::<Vec<_>>();
        let placeholders = (1..=columns.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>();
        let mut values = vec![
            Value::Integer(record.id()),
            Value::Text(record.name().to_string()),
            Value::Text(record.notes().to_string()),
        ];
        values.extend(flag_sql_values::<R>(record.flags()));
        tx.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({});",
                R::TABLE,
                columns.join(", "),
                placeholders.join(", ")
            ),
            params_from_iter(values),
        )?;

        attach_links::<R>(&tx, record.id(), game_id, npc_id)?;
        let created = require_record::<R>(&tx, record.id())?;
        tx.commit()?;
        Ok(created)
    }

    fn reuse_attached(
        &self,
        id: EntityId,
        flags: R::Flags,
        new_notes: &str,
        game_id: GameId,
        npc_id: Option<NpcId>,
    ) -> RepoResult<R> {
        let tx = begin_write(self.conn)?;
        let latest = require_record::<R>(&tx, id)?;
        ensure_exists(&tx, "games", EntityKind::Game, game_id)?;
        if let Some(npc_id) = npc_id {
            ensure_exists(&tx, "npcs", EntityKind::Npc, npc_id)?;
        }

        let notes = merge_reused_notes(latest.notes(), new_notes);
        write_fields::<R>(&tx, id, None, flags, &notes)?;
        attach_links::<R>(&tx, id, game_id, npc_id)?;
        let reused = require_record::<R>(&tx, id)?;
        tx.commit()?;
        Ok(reused)
    }

    fn update_record(&self, record: &R) -> RepoResult<R> {
        let tx = begin_write(self.conn)?;
        require_record::<R>(&tx, record.id())?;
        write_fields::<R>(
            &tx,
            record.id(),
            Some(record.name()),
            record.flags(),
            record.notes(),
        )?;
        let updated = require_record::<R>(&tx, record.id())?;
        tx.commit()?;
        Ok(updated)
    }

    fn attach_to_npc(&self, id: EntityId, npc_id: NpcId) -> RepoResult<bool> {
        let tx = begin_write(self.conn)?;
        require_record::<R>(&tx, id)?;
        ensure_exists(&tx, "npcs", EntityKind::Npc, npc_id)?;
        let added = link_if_absent(&tx, R::NPC_LINK_TABLE, "npc_id", R::LINK_COLUMN, npc_id, id)?;
        tx.commit()?;
        Ok(added)
    }

    fn delete_record(&self, id: EntityId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(&format!("DELETE FROM {} WHERE id = ?1;", R::TABLE), [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: R::ENTITY,
                id,
            });
        }
        Ok(())
    }
}

fn select_sql<R: RecordTable>() -> String {
    let flags = R::FLAG_COLUMNS
        .iter()
        .map(|column| format!("r.{column} AS {column}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT r.id AS id, r.name AS name, r.notes AS notes, {flags} FROM {} r",
        R::TABLE
    )
}

fn parse_record_row<R: RecordTable>(row: &Row<'_>) -> RepoResult<R> {
    let flags = R::parse_flags(row)?;
    Ok(R::assemble(
        row.get("id")?,
        row.get("name")?,
        flags,
        row.get("notes")?,
    ))
}

fn flag_sql_values<R: RecordTable>(flags: R::Flags) -> impl Iterator<Item = Value> {
    R::flag_values(flags)
        .into_iter()
        .map(|value| Value::Integer(bool_to_int(value)))
}

fn load_record<R: RecordTable>(conn: &Connection, id: EntityId) -> RepoResult<Option<R>> {
    let mut stmt = conn.prepare(&format!("{} WHERE r.id = ?1;", select_sql::<R>()))?;
    let row = stmt
        .query_row([id], |row| Ok(parse_record_row::<R>(row)))
        .optional()?;
    row.transpose()
}

fn require_record<R: RecordTable>(conn: &Connection, id: EntityId) -> RepoResult<R> {
    load_record::<R>(conn, id)?.ok_or(RepoError::NotFound {
        kind: R::ENTITY,
        id,
    })
}

fn list_linked<R: RecordTable>(
    conn: &Connection,
    link_table: &str,
    owner_column: &str,
    owner_id: EntityId,
) -> RepoResult<Vec<R>> {
    let mut stmt = conn.prepare(&format!(
        "{}
         INNER JOIN {link_table} l ON l.{member} = r.id
         WHERE l.{owner_column} = ?1
         ORDER BY l.position ASC;",
        select_sql::<R>(),
        member = R::LINK_COLUMN,
    ))?;
    let mut rows = stmt.query([owner_id])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_record_row::<R>(row)?);
    }
    Ok(items)
}

/// Writes flags and notes, plus the name when given.
fn write_fields<R: RecordTable>(
    conn: &Connection,
    id: EntityId,
    name: Option<&str>,
    flags: R::Flags,
    notes: &str,
) -> RepoResult<()> {
    let mut assignments = vec!["notes = ?2".to_string()];
    let mut values = vec![Value::Integer(id), Value::Text(notes.to_string())];
    if let Some(name) = name {
        values.push(Value::Text(name.to_string()));
        assignments.push(format!("name = ?{}", values.len()));
    }
    for (column, value) in R::FLAG_COLUMNS.iter().zip(flag_sql_values::<R>(flags)) {
        values.push(value);
        assignments.push(format!("{column} = ?{}", values.len()));
    }

    conn.execute(
        &format!(
            "UPDATE {}
             SET {}, updated_at = (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
             WHERE id = ?1;",
            R::TABLE,
            assignments.join(", ")
        ),
        params_from_iter(values),
    )?;
    Ok(())
}

fn attach_links<R: RecordTable>(
    conn: &Connection,
    id: EntityId,
    game_id: GameId,
    npc_id: Option<NpcId>,
) -> RepoResult<()> {
    if let Some(npc_id) = npc_id {
        link_if_absent(conn, R::NPC_LINK_TABLE, "npc_id", R::LINK_COLUMN, npc_id, id)?;
    }
    link_if_absent(conn, R::GAME_LINK_TABLE, "game_id", R::LINK_COLUMN, game_id, id)?;
    Ok(())
}
