//! Location/Quest use-case service.
//!
//! # Responsibility
//! - Drive the reuse-or-create flow for new records.
//! - Provide list, attach and delete operations for both record kinds.
//!
//! # Invariants
//! - A record name already in use triggers exactly one reuse prompt per
//!   edit session; an unused name never does.
//! - `save` returns only after the write committed, with the committed
//!   record; a list refresh issued afterwards always includes it.

use crate::model::game::GameId;
use crate::model::npc::{Npc, NpcId};
use crate::model::record::{Location, Quest, TrackedRecord};
use crate::model::EntityId;
use crate::repo::record_repo::{RecordRepository, SqliteRecordRepository};
use crate::service::edit_session::{EditSession, SaveOutcome, SavePlan};
use crate::service::{ServiceError, ServiceResult};
use log::{info, warn};
use std::marker::PhantomData;

/// Record service facade over a repository implementation.
pub struct RecordService<R, Repo> {
    repo: Repo,
    _kind: PhantomData<R>,
}

pub type LocationService<'conn> = RecordService<Location, SqliteRecordRepository<'conn, Location>>;
pub type QuestService<'conn> = RecordService<Quest, SqliteRecordRepository<'conn, Quest>>;

impl<R: TrackedRecord, Repo: RecordRepository<R>> RecordService<R, Repo> {
    pub fn new(repo: Repo) -> Self {
        Self {
            repo,
            _kind: PhantomData,
        }
    }

    /// Saves the session's draft.
    ///
    /// # Contract
    /// - Session with a target: overwrites that record.
    /// - New record, no decision yet: looks up the name; a hit suspends the
    ///   save and returns `SaveOutcome::ReusePrompt`, a miss creates.
    /// - `ReuseDecision::Reuse`: overwrites the existing record's flags,
    ///   appends the draft notes to its notes, attaches it where missing.
    /// - `ReuseDecision::CreateNew`: creates without looking up.
    pub fn save(&self, session: &mut EditSession<R>) -> ServiceResult<SaveOutcome<R>> {
        let draft = session.draft().normalized()?;
        let kind = R::KIND.label();

        let (saved, mode) = match session.plan() {
            SavePlan::Update(id) => {
                let record = R::assemble(id, draft.name, draft.flags, draft.notes);
                (self.repo.update_record(&record)?, "update")
            }
            SavePlan::LookupByName => match self.repo.find_by_name(&draft.name)? {
                Some(existing) => {
                    info!(
                        "event=record_save module=service kind={kind} status=prompt existing_id={}",
                        existing.id()
                    );
                    session.suspend(existing.clone());
                    return Ok(SaveOutcome::ReusePrompt(existing));
                }
                None => (self.create(session, draft.to_record())?, "create"),
            },
            SavePlan::Reuse(id) => {
                let reused = self
                    .repo
                    .reuse_attached(
                        id,
                        draft.flags,
                        &draft.notes,
                        session.game_id(),
                        session.npc_id(),
                    )
                    .map_err(|err| {
                        warn!(
                            "event=record_save module=service kind={kind} status=error mode=reuse record_id={id} error={err}"
                        );
                        err
                    })?;
                (reused, "reuse")
            }
            SavePlan::Create => (self.create(session, draft.to_record())?, "create"),
        };

        info!(
            "event=record_save module=service kind={kind} status=ok mode={mode} record_id={} game_id={} npc_id={:?}",
            saved.id(),
            session.game_id(),
            session.npc_id()
        );
        session.complete(&saved);
        Ok(SaveOutcome::Saved(saved))
    }

    pub fn get(&self, id: EntityId) -> ServiceResult<Option<R>> {
        Ok(self.repo.get_record(id)?)
    }

    /// Lists the game's records in the order they were added.
    pub fn list_for_game(&self, game_id: GameId) -> ServiceResult<Vec<R>> {
        Ok(self.repo.list_for_game(game_id)?)
    }

    /// Lists the records an NPC references, in the order they were added.
    pub fn list_for_npc(&self, npc_id: NpcId) -> ServiceResult<Vec<R>> {
        Ok(self.repo.list_for_npc(npc_id)?)
    }

    /// Lists NPCs that reference the record.
    pub fn npcs_referencing(&self, id: EntityId) -> ServiceResult<Vec<Npc>> {
        Ok(self.repo.npcs_referencing(id)?)
    }

    /// Adds an existing record to an NPC's collection; no-op when present.
    pub fn attach_to_npc(&self, id: EntityId, npc_id: NpcId) -> ServiceResult<bool> {
        let added = self.repo.attach_to_npc(id, npc_id)?;
        info!(
            "event=record_attach module=service kind={} status=ok record_id={id} npc_id={npc_id} added={added}",
            R::KIND.label()
        );
        Ok(added)
    }

    pub fn delete(&self, id: EntityId) -> ServiceResult<()> {
        self.repo.delete_record(id)?;
        info!(
            "event=record_delete module=service kind={} status=ok record_id={id}",
            R::KIND.label()
        );
        Ok(())
    }

    fn create(&self, session: &EditSession<R>, record: R) -> ServiceResult<R> {
        let created = self
            .repo
            .create_attached(&record, session.game_id(), session.npc_id())?;
        if created.id() != record.id() {
            return Err(ServiceError::InconsistentState(
                "created record read back under a different id",
            ));
        }
        Ok(created)
    }
}
