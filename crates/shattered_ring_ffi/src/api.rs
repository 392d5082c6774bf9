//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose screen-level campaign operations to Dart via FRB.
//! - Flatten core results into envelopes with a stable `error_code`.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens its own migrated connection; no state is held between
//!   calls except the configured database path and recent save keys.
//! - Reads are `sync`; writes run on the FRB worker pool so the UI thread
//!   never waits on the write lock.
//! - A record editor's reuse decision travels in the save request, so a
//!   prompt answered in Dart is honored by the next save call.
//! - Resending an identical record save request never writes twice.

use log::{info, warn};
use rusqlite::Connection;
use shattered_ring_core::db::open_db;
use shattered_ring_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    EditSession, GameDetail, GameService, GameSummary, Location, LocationFlags, LocationService,
    Npc, NpcDraft, NpcService, NpcSummary, Quest, QuestFlags, QuestService, RecordDraft,
    RecordRepository, RecordService, RepoError, ReuseDecision, SaveOutcome, ServiceError,
    ServiceResult, SqliteGameRepository, SqliteLocationRepository, SqliteNpcRepository,
    SqliteQuestRepository, TrackedRecord,
};
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

const DB_FILE_NAME: &str = "shattered_ring.sqlite3";
const DB_PATH_ENV: &str = "SHATTERED_RING_DB_PATH";
const RECENT_SAVES_MAX: usize = 64;
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
/// `(request key, saved record id)` of the latest successful record saves.
static RECENT_SAVES: OnceLock<Mutex<VecDeque<(u64, i64)>>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Pins the database file used by every later call.
///
/// Without this call the path comes from `SHATTERED_RING_DB_PATH`, falling
/// back to `<temp_dir>/shattered_ring.sqlite3`.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - `db_path` must be absolute.
/// - Repeating the call with the same path is a no-op; a different path after
///   the first call (or after the first database access) is rejected.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_db_path(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = Path::new(trimmed);
    if !requested.is_absolute() {
        return format!("db_path must be an absolute path, got `{trimmed}`");
    }

    let active = DB_PATH.get_or_init(|| requested.to_path_buf());
    if active != requested {
        return format!(
            "database already configured at `{}`; refusing to switch",
            active.display()
        );
    }
    String::new()
}

/// Generic write response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the write committed.
    pub ok: bool,
    /// Id of the created or changed entity.
    pub id: Option<i64>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
    /// Stable failure code (`invalid_input|not_found|store_busy|...`).
    pub error_code: Option<String>,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: i64) -> Self {
        Self {
            ok: true,
            id: Some(id),
            message: message.into(),
            error_code: None,
        }
    }

    fn failure(call: &str, err: &ServiceError) -> Self {
        Self {
            ok: false,
            id: None,
            message: format!("{call} failed: {err}"),
            error_code: Some(err.code().to_string()),
        }
    }
}

/// Game row for list screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameItem {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub npc_count: u32,
    pub location_count: u32,
    pub quest_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameListResponse {
    pub ok: bool,
    pub items: Vec<GameItem>,
    pub message: String,
    pub error_code: Option<String>,
}

/// Statistics shown on the game detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDetailItem {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub npcs_met: u32,
    pub locations_discovered: u32,
    pub locations_cleared: u32,
    pub quests_accepted: u32,
    pub quests_completed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDetailResponse {
    pub ok: bool,
    pub detail: Option<GameDetailItem>,
    pub message: String,
    pub error_code: Option<String>,
}

/// NPC row with its collection sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpcItem {
    pub id: i64,
    pub name: String,
    pub is_merchant: bool,
    pub notes: String,
    pub location_count: u32,
    pub quest_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpcListResponse {
    pub ok: bool,
    pub items: Vec<NpcItem>,
    pub message: String,
    pub error_code: Option<String>,
}

/// NPC referencing a Location or Quest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpcRefItem {
    pub id: i64,
    pub name: String,
    pub is_merchant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpcRefListResponse {
    pub ok: bool,
    pub items: Vec<NpcRefItem>,
    pub message: String,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationItem {
    pub id: i64,
    pub name: String,
    pub is_cleared: bool,
    pub has_smith: bool,
    pub has_merchant: bool,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestItem {
    pub id: i64,
    pub name: String,
    pub is_complete: bool,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationListResponse {
    pub ok: bool,
    pub items: Vec<LocationItem>,
    pub message: String,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestListResponse {
    pub ok: bool,
    pub items: Vec<QuestItem>,
    pub message: String,
    pub error_code: Option<String>,
}

/// Save request from the Location editor.
///
/// `location_id` is set when editing an existing Location. After a reuse
/// prompt, resend the request with either `reuse_existing_id` (the prompted
/// id) or `create_new = true`. After `ok && !reuse_prompt`, later edits carry
/// the saved id in `location_id`. Resending an identical request that already
/// saved returns the committed Location without writing again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationSaveRequest {
    pub game_id: i64,
    pub npc_id: Option<i64>,
    pub location_id: Option<i64>,
    pub name: String,
    pub is_cleared: bool,
    pub has_smith: bool,
    pub has_merchant: bool,
    pub notes: String,
    pub reuse_existing_id: Option<i64>,
    pub create_new: bool,
}

/// Save request from the Quest editor; same reuse and resend protocol as
/// [`LocationSaveRequest`], with `quest_id` for edits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuestSaveRequest {
    pub game_id: i64,
    pub npc_id: Option<i64>,
    pub quest_id: Option<i64>,
    pub name: String,
    pub is_complete: bool,
    pub notes: String,
    pub reuse_existing_id: Option<i64>,
    pub create_new: bool,
}

/// Location editor save result.
///
/// With `reuse_prompt = true` nothing was written and `item` is the existing
/// Location the user must choose to reuse or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSaveResponse {
    pub ok: bool,
    pub reuse_prompt: bool,
    pub item: Option<LocationItem>,
    pub message: String,
    pub error_code: Option<String>,
}

/// Quest editor save result; see [`LocationSaveResponse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestSaveResponse {
    pub ok: bool,
    pub reuse_prompt: bool,
    pub item: Option<QuestItem>,
    pub message: String,
    pub error_code: Option<String>,
}

/// Creates an active game.
///
/// # FFI contract
/// - Async call (FRB worker pool), DB-backed write.
/// - Never panics; blank names fail with `invalid_input`.
pub fn game_create(name: String) -> ActionResponse {
    match with_conn(|conn| game_service(conn).create_game(&name)) {
        Ok(game) => ActionResponse::success("Game created.", game.id),
        Err(err) => action_failure("game_create", &err),
    }
}

/// Lists games in creation order with collection sizes.
///
/// # FFI contract
/// - Sync call, DB-backed read.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn game_list() -> GameListResponse {
    match with_conn(|conn| game_service(conn).list_games()) {
        Ok(games) => {
            let items = games.into_iter().map(to_game_item).collect::<Vec<_>>();
            GameListResponse {
                ok: true,
                message: format!("Found {} game(s).", items.len()),
                items,
                error_code: None,
            }
        }
        Err(err) => {
            log_failure("game_list", &err);
            GameListResponse {
                ok: false,
                items: Vec::new(),
                message: format!("game_list failed: {err}"),
                error_code: Some(err.code().to_string()),
            }
        }
    }
}

/// Loads detail statistics for one game.
///
/// # FFI contract
/// - Sync call, DB-backed read.
/// - Missing game returns `ok = false` with `not_found`.
#[flutter_rust_bridge::frb(sync)]
pub fn game_detail(game_id: i64) -> GameDetailResponse {
    match with_conn(|conn| game_service(conn).game_detail(game_id)) {
        Ok(detail) => GameDetailResponse {
            ok: true,
            detail: Some(to_game_detail_item(detail)),
            message: "Game loaded.".to_string(),
            error_code: None,
        },
        Err(err) => {
            log_failure("game_detail", &err);
            GameDetailResponse {
                ok: false,
                detail: None,
                message: format!("game_detail failed: {err}"),
                error_code: Some(err.code().to_string()),
            }
        }
    }
}

/// Renames a game.
///
/// # FFI contract
/// - Async call (FRB worker pool), DB-backed write.
/// - Never panics.
pub fn game_rename(game_id: i64, name: String) -> ActionResponse {
    match with_conn(|conn| game_service(conn).rename_game(game_id, &name)) {
        Ok(game) => ActionResponse::success("Game renamed.", game.id),
        Err(err) => action_failure("game_rename", &err),
    }
}

/// Sets whether a game is the running campaign.
///
/// # FFI contract
/// - Async call (FRB worker pool), DB-backed write.
/// - Never panics.
pub fn game_set_active(game_id: i64, is_active: bool) -> ActionResponse {
    match with_conn(|conn| game_service(conn).set_active(game_id, is_active)) {
        Ok(game) => ActionResponse::success("Game updated.", game.id),
        Err(err) => action_failure("game_set_active", &err),
    }
}

/// Deletes a game together with every NPC, Location and Quest it holds.
///
/// # FFI contract
/// - Async call (FRB worker pool), single write transaction.
/// - Never panics; the store is unchanged when `ok = false`.
pub fn game_delete(game_id: i64) -> ActionResponse {
    match with_conn(|conn| game_service(conn).delete_game(game_id)) {
        Ok(report) => ActionResponse::success(
            format!(
                "Game deleted with {} NPC(s), {} location(s), {} quest(s).",
                report.npcs, report.locations, report.quests
            ),
            game_id,
        ),
        Err(err) => action_failure("game_delete", &err),
    }
}

/// Creates an NPC in `game_id`, or updates `npc_id` when set.
///
/// # FFI contract
/// - Async call (FRB worker pool), DB-backed write.
/// - Never panics; blank names fail with `invalid_input`.
pub fn npc_save(
    game_id: i64,
    npc_id: Option<i64>,
    name: String,
    is_merchant: bool,
    notes: String,
) -> ActionResponse {
    let draft = NpcDraft {
        name,
        is_merchant,
        notes,
    };
    let result = with_conn(|conn| {
        let service = NpcService::new(SqliteNpcRepository::new(conn));
        match npc_id {
            Some(id) => service.update_npc(id, draft),
            None => service.create_npc(game_id, draft),
        }
    });
    match result {
        Ok(npc) => ActionResponse::success("NPC saved.", npc.id),
        Err(err) => action_failure("npc_save", &err),
    }
}

/// Deletes an NPC; Locations and Quests it referenced are kept.
///
/// # FFI contract
/// - Async call (FRB worker pool), DB-backed write.
/// - Never panics.
pub fn npc_delete(npc_id: i64) -> ActionResponse {
    match with_conn(|conn| NpcService::new(SqliteNpcRepository::new(conn)).delete_npc(npc_id)) {
        Ok(()) => ActionResponse::success("NPC deleted.", npc_id),
        Err(err) => action_failure("npc_delete", &err),
    }
}

/// Lists a game's NPCs in the order they were met.
///
/// # FFI contract
/// - Sync call, DB-backed read.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn npc_list(game_id: i64) -> NpcListResponse {
    match with_conn(|conn| NpcService::new(SqliteNpcRepository::new(conn)).list_npcs(game_id)) {
        Ok(npcs) => {
            let items = npcs.into_iter().map(to_npc_item).collect::<Vec<_>>();
            NpcListResponse {
                ok: true,
                message: format!("Found {} NPC(s).", items.len()),
                items,
                error_code: None,
            }
        }
        Err(err) => {
            log_failure("npc_list", &err);
            NpcListResponse {
                ok: false,
                items: Vec::new(),
                message: format!("npc_list failed: {err}"),
                error_code: Some(err.code().to_string()),
            }
        }
    }
}

/// Saves the Location editor.
///
/// # FFI contract
/// - Async call (FRB worker pool), DB-backed write.
/// - A name already in use returns `reuse_prompt = true` without writing.
/// - An identical resend of a saved request returns the committed record.
/// - Never panics.
pub fn location_save(request: LocationSaveRequest) -> LocationSaveResponse {
    let key = resend_key("location", request.location_id, &request);
    let draft = RecordDraft::new(
        request.name,
        LocationFlags {
            is_cleared: request.is_cleared,
            has_smith: request.has_smith,
            has_merchant: request.has_merchant,
        },
        request.notes,
    );
    let mut session = EditSession::<Location>::resume(
        request.game_id,
        request.npc_id,
        request.location_id,
        draft,
        decision_of(request.reuse_existing_id, request.create_new),
    );
    let result = with_conn(|conn| save_once(&location_service(conn), key, &mut session));
    let (ok, reuse_prompt, item, message, error_code) = match result {
        Ok(outcome) => save_envelope("location", outcome, to_location_item),
        Err(err) => save_failure("location_save", &err),
    };
    LocationSaveResponse {
        ok,
        reuse_prompt,
        item,
        message,
        error_code,
    }
}

/// Deletes a Location and drops it from every game and NPC.
///
/// # FFI contract
/// - Async call (FRB worker pool), DB-backed write.
/// - Never panics.
pub fn location_delete(location_id: i64) -> ActionResponse {
    match with_conn(|conn| location_service(conn).delete(location_id)) {
        Ok(()) => ActionResponse::success("Location deleted.", location_id),
        Err(err) => action_failure("location_delete", &err),
    }
}

/// Adds an existing Location to an NPC; no-op when already present.
///
/// # FFI contract
/// - Async call (FRB worker pool), DB-backed write.
/// - Never panics.
pub fn location_attach(location_id: i64, npc_id: i64) -> ActionResponse {
    match with_conn(|conn| location_service(conn).attach_to_npc(location_id, npc_id)) {
        Ok(added) => ActionResponse::success(attach_message("Location", added), location_id),
        Err(err) => action_failure("location_attach", &err),
    }
}

/// Lists a game's Locations, or an NPC's when `npc_id` is set.
///
/// # FFI contract
/// - Sync call, DB-backed read.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn location_list(game_id: i64, npc_id: Option<i64>) -> LocationListResponse {
    let (ok, items, message, error_code) = list_envelope(
        "location_list",
        with_conn(|conn| {
            let service = location_service(conn);
            match npc_id {
                Some(npc_id) => service.list_for_npc(npc_id),
                None => service.list_for_game(game_id),
            }
        }),
        to_location_item,
    );
    LocationListResponse {
        ok,
        items,
        message,
        error_code,
    }
}

/// Lists NPCs referencing a Location, by name.
///
/// # FFI contract
/// - Sync call, DB-backed read.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn location_npcs(location_id: i64) -> NpcRefListResponse {
    npc_ref_response(
        "location_npcs",
        with_conn(|conn| location_service(conn).npcs_referencing(location_id)),
    )
}

/// Saves the Quest editor.
///
/// # FFI contract
/// - Async call (FRB worker pool), DB-backed write.
/// - A name already in use returns `reuse_prompt = true` without writing.
/// - An identical resend of a saved request returns the committed record.
/// - Never panics.
pub fn quest_save(request: QuestSaveRequest) -> QuestSaveResponse {
    let key = resend_key("quest", request.quest_id, &request);
    let draft = RecordDraft::new(
        request.name,
        QuestFlags {
            is_complete: request.is_complete,
        },
        request.notes,
    );
    let mut session = EditSession::<Quest>::resume(
        request.game_id,
        request.npc_id,
        request.quest_id,
        draft,
        decision_of(request.reuse_existing_id, request.create_new),
    );
    let result = with_conn(|conn| save_once(&quest_service(conn), key, &mut session));
    let (ok, reuse_prompt, item, message, error_code) = match result {
        Ok(outcome) => save_envelope("quest", outcome, to_quest_item),
        Err(err) => save_failure("quest_save", &err),
    };
    QuestSaveResponse {
        ok,
        reuse_prompt,
        item,
        message,
        error_code,
    }
}

/// Deletes a Quest and drops it from every game and NPC.
///
/// # FFI contract
/// - Async call (FRB worker pool), DB-backed write.
/// - Never panics.
pub fn quest_delete(quest_id: i64) -> ActionResponse {
    match with_conn(|conn| quest_service(conn).delete(quest_id)) {
        Ok(()) => ActionResponse::success("Quest deleted.", quest_id),
        Err(err) => action_failure("quest_delete", &err),
    }
}

/// Adds an existing Quest to an NPC; no-op when already present.
///
/// # FFI contract
/// - Async call (FRB worker pool), DB-backed write.
/// - Never panics.
pub fn quest_attach(quest_id: i64, npc_id: i64) -> ActionResponse {
    match with_conn(|conn| quest_service(conn).attach_to_npc(quest_id, npc_id)) {
        Ok(added) => ActionResponse::success(attach_message("Quest", added), quest_id),
        Err(err) => action_failure("quest_attach", &err),
    }
}

/// Lists a game's Quests, or an NPC's when `npc_id` is set.
///
/// # FFI contract
/// - Sync call, DB-backed read.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn quest_list(game_id: i64, npc_id: Option<i64>) -> QuestListResponse {
    let (ok, items, message, error_code) = list_envelope(
        "quest_list",
        with_conn(|conn| {
            let service = quest_service(conn);
            match npc_id {
                Some(npc_id) => service.list_for_npc(npc_id),
                None => service.list_for_game(game_id),
            }
        }),
        to_quest_item,
    );
    QuestListResponse {
        ok,
        items,
        message,
        error_code,
    }
}

/// Lists NPCs referencing a Quest, by name.
///
/// # FFI contract
/// - Sync call, DB-backed read.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn quest_npcs(quest_id: i64) -> NpcRefListResponse {
    npc_ref_response(
        "quest_npcs",
        with_conn(|conn| quest_service(conn).npcs_referencing(quest_id)),
    )
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_conn<T>(f: impl FnOnce(&Connection) -> ServiceResult<T>) -> ServiceResult<T> {
    let conn =
        open_db(resolve_db_path()).map_err(|err| ServiceError::Repo(RepoError::Db(err)))?;
    f(&conn)
}

fn game_service(conn: &Connection) -> GameService<SqliteGameRepository<'_>> {
    GameService::new(SqliteGameRepository::new(conn))
}

fn location_service(conn: &Connection) -> LocationService<'_> {
    LocationService::new(SqliteLocationRepository::new(conn))
}

fn quest_service(conn: &Connection) -> QuestService<'_> {
    QuestService::new(SqliteQuestRepository::new(conn))
}

/// Identity of a save request for resend detection; `None` for edits of an
/// existing record, which are plain updates anyway.
fn resend_key(kind: &str, target: Option<i64>, request: &impl Hash) -> Option<u64> {
    if target.is_some() {
        return None;
    }
    let mut hasher = DefaultHasher::new();
    kind.hash(&mut hasher);
    request.hash(&mut hasher);
    Some(hasher.finish())
}

/// Runs a record save unless the identical request already saved in this
/// process, in which case the committed record is returned unchanged.
///
/// The registry lock is held across the write, so a double tap resolves to
/// one write.
fn save_once<R, Repo>(
    service: &RecordService<R, Repo>,
    key: Option<u64>,
    session: &mut EditSession<R>,
) -> ServiceResult<SaveOutcome<R>>
where
    R: TrackedRecord,
    Repo: RecordRepository<R>,
{
    let Some(key) = key else {
        return service.save(session);
    };
    let mut recent = RECENT_SAVES
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    let previous = recent
        .iter()
        .find(|(saved_key, _)| *saved_key == key)
        .map(|(_, id)| *id);
    if let Some(id) = previous {
        if let Some(record) = service.get(id)? {
            info!(
                "event=record_save module=ffi kind={} status=ok mode=resend record_id={id}",
                R::KIND.label()
            );
            return Ok(SaveOutcome::Saved(record));
        }
        recent.retain(|(saved_key, _)| *saved_key != key);
    }

    let outcome = service.save(session)?;
    if let SaveOutcome::Saved(record) = &outcome {
        if recent.len() == RECENT_SAVES_MAX {
            recent.pop_front();
        }
        recent.push_back((key, record.id()));
    }
    Ok(outcome)
}

fn decision_of(reuse_existing_id: Option<i64>, create_new: bool) -> ReuseDecision {
    match (reuse_existing_id, create_new) {
        (Some(id), _) => ReuseDecision::Reuse(id),
        (None, true) => ReuseDecision::CreateNew,
        (None, false) => ReuseDecision::Undecided,
    }
}

type SaveEnvelope<T> = (bool, bool, Option<T>, String, Option<String>);
type ListEnvelope<T> = (bool, Vec<T>, String, Option<String>);

fn save_envelope<R, T>(
    label: &str,
    outcome: SaveOutcome<R>,
    convert: fn(R) -> T,
) -> SaveEnvelope<T> {
    match outcome {
        SaveOutcome::Saved(record) => (
            true,
            false,
            Some(convert(record)),
            format!("Saved {label}."),
            None,
        ),
        SaveOutcome::ReusePrompt(existing) => (
            true,
            true,
            Some(convert(existing)),
            format!("A {label} with this name already exists."),
            None,
        ),
    }
}

fn save_failure<T>(call: &str, err: &ServiceError) -> SaveEnvelope<T> {
    log_failure(call, err);
    (
        false,
        false,
        None,
        format!("{call} failed: {err}"),
        Some(err.code().to_string()),
    )
}

fn list_envelope<R, T>(
    call: &str,
    result: ServiceResult<Vec<R>>,
    convert: fn(R) -> T,
) -> ListEnvelope<T> {
    match result {
        Ok(records) => {
            let items = records.into_iter().map(convert).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No results.".to_string()
            } else {
                format!("Found {} result(s).", items.len())
            };
            (true, items, message, None)
        }
        Err(err) => {
            log_failure(call, &err);
            (
                false,
                Vec::new(),
                format!("{call} failed: {err}"),
                Some(err.code().to_string()),
            )
        }
    }
}

fn npc_ref_response(call: &str, result: ServiceResult<Vec<Npc>>) -> NpcRefListResponse {
    let (ok, items, message, error_code) = list_envelope(call, result, to_npc_ref_item);
    NpcRefListResponse {
        ok,
        items,
        message,
        error_code,
    }
}

fn action_failure(call: &str, err: &ServiceError) -> ActionResponse {
    log_failure(call, err);
    ActionResponse::failure(call, err)
}

fn log_failure(call: &str, err: &ServiceError) {
    warn!(
        "event=ffi_call module=ffi status=error call={call} error_code={}",
        err.code()
    );
}

fn attach_message(label: &str, added: bool) -> String {
    if added {
        format!("{label} added to NPC.")
    } else {
        format!("{label} already referenced by NPC.")
    }
}

fn to_game_item(summary: GameSummary) -> GameItem {
    GameItem {
        id: summary.game.id,
        name: summary.game.name,
        is_active: summary.game.is_active,
        npc_count: summary.npc_count,
        location_count: summary.location_count,
        quest_count: summary.quest_count,
    }
}

fn to_game_detail_item(detail: GameDetail) -> GameDetailItem {
    GameDetailItem {
        id: detail.game.id,
        name: detail.game.name,
        is_active: detail.game.is_active,
        npcs_met: detail.npc_count,
        locations_discovered: detail.location_count,
        locations_cleared: detail.locations_cleared,
        quests_accepted: detail.quest_count,
        quests_completed: detail.quests_completed,
    }
}

fn to_npc_item(summary: NpcSummary) -> NpcItem {
    NpcItem {
        id: summary.npc.id,
        name: summary.npc.name,
        is_merchant: summary.npc.is_merchant,
        notes: summary.npc.notes,
        location_count: summary.location_count,
        quest_count: summary.quest_count,
    }
}

fn to_npc_ref_item(npc: Npc) -> NpcRefItem {
    NpcRefItem {
        id: npc.id,
        name: npc.name,
        is_merchant: npc.is_merchant,
    }
}

fn to_location_item(location: Location) -> LocationItem {
    LocationItem {
        id: location.id,
        name: location.name,
        is_cleared: location.is_cleared,
        has_smith: location.has_smith,
        has_merchant: location.has_merchant,
        notes: location.notes,
    }
}

fn to_quest_item(quest: Quest) -> QuestItem {
    QuestItem {
        id: quest.id,
        name: quest.name,
        is_complete: quest.is_complete,
        notes: quest.notes,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        configure_db_path, core_version, game_create, game_delete, game_detail, game_list,
        game_set_active, init_logging, location_attach, location_list, location_npcs,
        location_save, npc_delete, npc_list, npc_save, ping, quest_attach, quest_delete,
        quest_list, quest_npcs, quest_save, LocationSaveRequest, QuestSaveRequest,
    };
    use std::sync::OnceLock;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tempfile::TempDir;

    static TEST_DB_DIR: OnceLock<TempDir> = OnceLock::new();

    fn use_test_db() {
        let dir = TEST_DB_DIR.get_or_init(|| tempfile::tempdir().expect("create temp dir"));
        let path = dir.path().join("ffi-tests.sqlite3");
        let error = configure_db_path(path.to_string_lossy().into_owned());
        assert!(error.is_empty(), "{error}");
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }

    fn new_game() -> i64 {
        use_test_db();
        let created = game_create(unique_token("campaign"));
        assert!(created.ok, "{}", created.message);
        created.id.expect("game create should return id")
    }

    fn location_request(game_id: i64, npc_id: Option<i64>, name: &str) -> LocationSaveRequest {
        LocationSaveRequest {
            game_id,
            npc_id,
            location_id: None,
            name: name.to_string(),
            is_cleared: false,
            has_smith: false,
            has_merchant: false,
            notes: String::new(),
            reuse_existing_id: None,
            create_new: false,
        }
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn configure_db_path_rejects_relative_and_conflicting_paths() {
        use_test_db();
        assert!(!configure_db_path("campaigns.sqlite3".to_string()).is_empty());
        let error = configure_db_path("/somewhere/else.sqlite3".to_string());
        assert!(error.contains("refusing to switch"));
    }

    #[test]
    fn game_create_rejects_blank_name() {
        use_test_db();
        let response = game_create("   ".to_string());
        assert!(!response.ok);
        assert_eq!(response.error_code.as_deref(), Some("invalid_input"));
    }

    #[test]
    fn reuse_prompt_round_trip_through_requests() {
        let game_id = new_game();
        let name = unique_token("tavern");

        let mut request = location_request(game_id, None, &name);
        request.notes = "rats".to_string();
        let first = location_save(request);
        assert!(first.ok && !first.reuse_prompt, "{}", first.message);
        let existing = first.item.expect("saved location");

        let npc = npc_save(game_id, None, "Bob".to_string(), false, String::new());
        let npc_id = npc.id.expect("npc id");
        let mut second = location_request(game_id, Some(npc_id), &name);
        second.has_merchant = true;
        second.notes = "maps".to_string();
        let prompt = location_save(second.clone());
        assert!(prompt.ok && prompt.reuse_prompt);
        assert_eq!(prompt.item.as_ref().map(|item| item.id), Some(existing.id));

        second.reuse_existing_id = Some(existing.id);
        let reused = location_save(second);
        assert!(reused.ok && !reused.reuse_prompt, "{}", reused.message);
        let reused = reused.item.expect("reused location");
        assert_eq!(reused.id, existing.id);
        assert_eq!(reused.notes, "rats\nmaps");
        assert!(reused.has_merchant);

        let for_npc = location_list(game_id, Some(npc_id));
        assert_eq!(for_npc.items, vec![reused.clone()]);
        let attached = location_attach(reused.id, npc_id);
        assert!(attached.ok);
        assert_eq!(location_list(game_id, Some(npc_id)).items.len(), 1);
    }

    #[test]
    fn declined_prompt_creates_second_quest() {
        let game_id = new_game();
        let request = QuestSaveRequest {
            game_id,
            npc_id: None,
            quest_id: None,
            name: unique_token("ring"),
            is_complete: false,
            notes: String::new(),
            reuse_existing_id: None,
            create_new: false,
        };
        assert!(!quest_save(request.clone()).reuse_prompt);
        let second = QuestSaveRequest {
            notes: "a different ring".to_string(),
            ..request
        };
        assert!(quest_save(second.clone()).reuse_prompt);

        let created = quest_save(QuestSaveRequest {
            create_new: true,
            ..second
        });
        assert!(created.ok && !created.reuse_prompt, "{}", created.message);
        assert_eq!(quest_list(game_id, None).items.len(), 2);

        let quest_id = created.item.expect("created quest").id;
        assert!(quest_delete(quest_id).ok);
        assert_eq!(
            quest_delete(quest_id).error_code.as_deref(),
            Some("not_found")
        );
    }

    #[test]
    fn resent_reuse_request_appends_notes_once() {
        let game_id = new_game();
        let name = unique_token("smithy");
        let mut first = location_request(game_id, None, &name);
        first.notes = "old".to_string();
        let existing = location_save(first).item.expect("saved location");

        let mut reuse = location_request(game_id, None, &name);
        reuse.notes = "new".to_string();
        assert!(location_save(reuse.clone()).reuse_prompt);
        reuse.reuse_existing_id = Some(existing.id);

        let applied = location_save(reuse.clone());
        let resent = location_save(reuse);
        assert!(resent.ok && !resent.reuse_prompt, "{}", resent.message);
        assert_eq!(applied.item, resent.item);
        let stored = location_list(game_id, None).items;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].notes, "old\nnew");
    }

    #[test]
    fn resent_create_new_request_creates_once() {
        let game_id = new_game();
        let name = unique_token("oath");
        let mut request = QuestSaveRequest {
            game_id,
            npc_id: None,
            quest_id: None,
            name,
            is_complete: false,
            notes: "first".to_string(),
            reuse_existing_id: None,
            create_new: false,
        };
        assert!(quest_save(request.clone()).ok);
        request.notes = "second".to_string();
        assert!(quest_save(request.clone()).reuse_prompt);

        request.create_new = true;
        let created = quest_save(request.clone()).item.expect("created quest");
        let resent = quest_save(request).item.expect("resent quest");
        assert_eq!(created.id, resent.id);
        assert_eq!(quest_list(game_id, None).items.len(), 2);
    }

    #[test]
    fn record_npcs_lists_referencing_npcs_by_name() {
        let game_id = new_game();
        let bob = npc_save(game_id, None, "Bob".to_string(), false, String::new())
            .id
            .expect("npc id");
        let alice = npc_save(game_id, None, "Alice".to_string(), true, String::new())
            .id
            .expect("npc id");
        let quest = quest_save(QuestSaveRequest {
            game_id,
            npc_id: Some(bob),
            quest_id: None,
            name: unique_token("escort"),
            is_complete: false,
            notes: String::new(),
            reuse_existing_id: None,
            create_new: false,
        })
        .item
        .expect("saved quest");
        assert!(quest_attach(quest.id, alice).ok);

        let names = quest_npcs(quest.id)
            .items
            .into_iter()
            .map(|item| item.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Alice".to_string(), "Bob".to_string()]);

        let location = location_save(location_request(game_id, None, &unique_token("road")))
            .item
            .expect("saved location");
        let response = location_npcs(location.id);
        assert!(response.ok);
        assert!(response.items.is_empty());
    }

    #[test]
    fn game_delete_cascades_and_detail_reports_not_found() {
        let game_id = new_game();
        let npc = npc_save(game_id, None, "Bob".to_string(), true, String::new());
        let npc_id = npc.id.expect("npc id");
        let saved = location_save(location_request(
            game_id,
            Some(npc_id),
            &unique_token("crypt"),
        ));
        assert!(saved.ok, "{}", saved.message);

        let detail = game_detail(game_id).detail.expect("detail");
        assert_eq!(detail.npcs_met, 1);
        assert_eq!(detail.locations_discovered, 1);
        assert!(game_set_active(game_id, false).ok);

        let deleted = game_delete(game_id);
        assert!(deleted.ok, "{}", deleted.message);
        assert_eq!(
            game_detail(game_id).error_code.as_deref(),
            Some("not_found")
        );
        assert!(npc_list(game_id).items.is_empty());
        assert!(location_list(game_id, Some(npc_id)).items.is_empty());
        assert!(!game_list().items.iter().any(|item| item.id == game_id));
        assert_eq!(npc_delete(npc_id).error_code.as_deref(), Some("not_found"));
    }
}
