//! Repository layer: use-case shaped access to the campaign store.
//!
//! # Responsibility
//! - Keep SQL and transaction handling inside the persistence boundary.
//! - Report semantic errors (`NotFound`) next to transport errors.
//!
//! # Invariants
//! - Every multi-statement write runs in one `IMMEDIATE` transaction, which
//!   also serializes writers.
//! - Mutations re-read their target inside the write transaction and fail
//!   with `NotFound` when it has been deleted in the meantime.

use crate::db::DbError;
use crate::model::EntityId;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod game_repo;
pub mod npc_repo;
pub mod record_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity kinds named by repository errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Game,
    Npc,
    Location,
    Quest,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Game => "game",
            Self::Npc => "npc",
            Self::Location => "location",
            Self::Quest => "quest",
        };
        f.write_str(label)
    }
}

/// Repository error for campaign persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Target row is missing, typically deleted by an earlier write.
    NotFound { kind: EntityKind, id: EntityId },
    /// Persisted row cannot be decoded into the domain model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Starts a write transaction that holds the database write lock from its
/// first statement.
pub(crate) fn begin_write(conn: &Connection) -> RepoResult<Transaction<'_>> {
    Ok(Transaction::new_unchecked(
        conn,
        TransactionBehavior::Immediate,
    )?)
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn count_to_u32(value: i64, what: &str) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid count `{value}` for {what}")))
}

pub(crate) fn row_exists(conn: &Connection, table: &str, id: EntityId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn ensure_exists(
    conn: &Connection,
    table: &str,
    kind: EntityKind,
    id: EntityId,
) -> RepoResult<()> {
    if row_exists(conn, table, id)? {
        Ok(())
    } else {
        Err(RepoError::NotFound { kind, id })
    }
}

/// Appends `member_id` to the end of an ordered collection unless the
/// collection already holds it. Returns whether a link was added.
pub(crate) fn link_if_absent(
    conn: &Connection,
    link_table: &str,
    owner_column: &str,
    member_column: &str,
    owner_id: EntityId,
    member_id: EntityId,
) -> RepoResult<bool> {
    let inserted = conn.execute(
        &format!(
            "INSERT OR IGNORE INTO {link_table} ({owner_column}, {member_column}, position)
             SELECT ?1, ?2, COALESCE(MAX(position) + 1, 0)
             FROM {link_table}
             WHERE {owner_column} = ?1;"
        ),
        params![owner_id, member_id],
    )?;
    Ok(inserted == 1)
}

/// Counts members of one owner's collection.
pub(crate) fn count_links(
    conn: &Connection,
    link_table: &str,
    owner_column: &str,
    owner_id: EntityId,
) -> RepoResult<u32> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {link_table} WHERE {owner_column} = ?1;"),
        [owner_id],
        |row| row.get(0),
    )?;
    count_to_u32(count, link_table)
}

#[cfg(test)]
mod tests {
    use super::{int_to_bool, RepoError};

    #[test]
    fn int_to_bool_rejects_out_of_range_values() {
        assert!(!int_to_bool(0, "t.c").unwrap());
        assert!(int_to_bool(1, "t.c").unwrap());
        let err = int_to_bool(7, "t.c").unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("t.c")));
    }
}
