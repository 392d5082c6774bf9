//! State of one open Location/Quest editor.
//!
//! # Responsibility
//! - Decide what a save does: update, name lookup, reuse, or create.
//! - Hold the sticky reuse decision for the lifetime of the editor.
//!
//! # Invariants
//! - A session with a target record never performs a name lookup.
//! - Once a reuse decision is recorded, later saves never look up by name.
//! - After a successful save the session targets the saved record and its
//!   draft mirrors the committed values, so saving again is a plain update.

use crate::model::game::GameId;
use crate::model::npc::NpcId;
use crate::model::record::{RecordDraft, TrackedRecord};
use crate::model::EntityId;

/// Answer to "a record with this name already exists".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReuseDecision {
    /// No prompt has been answered in this session.
    Undecided,
    /// Attach the existing record with this id instead of creating one.
    Reuse(EntityId),
    /// Create a new record even though the name is taken.
    CreateNew,
}

/// Result of one save attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome<R> {
    /// Write committed; carries the record as re-read after commit.
    Saved(R),
    /// Save suspended until `EditSession::answer_reuse` is called.
    ReusePrompt(R),
}

/// Next step `RecordService::save` takes for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SavePlan {
    Update(EntityId),
    LookupByName,
    Reuse(EntityId),
    Create,
}

/// Editor session for one Location or Quest.
#[derive(Debug, Clone)]
pub struct EditSession<R: TrackedRecord> {
    game_id: GameId,
    npc_id: Option<NpcId>,
    target: Option<EntityId>,
    draft: RecordDraft<R::Flags>,
    decision: ReuseDecision,
    prompt: Option<R>,
}

impl<R: TrackedRecord> EditSession<R> {
    /// Opens an editor for a new record in `game_id`, optionally added to
    /// `npc_id`'s collection as well.
    pub fn create(game_id: GameId, npc_id: Option<NpcId>, draft: RecordDraft<R::Flags>) -> Self {
        Self::resume(game_id, npc_id, None, draft, ReuseDecision::Undecided)
    }

    /// Opens an editor on an existing record.
    pub fn edit(game_id: GameId, record: &R) -> Self {
        Self::resume(
            game_id,
            None,
            Some(record.id()),
            draft_of(record),
            ReuseDecision::Undecided,
        )
    }

    /// Rebuilds a session from plain values carried across calls.
    pub fn resume(
        game_id: GameId,
        npc_id: Option<NpcId>,
        target: Option<EntityId>,
        draft: RecordDraft<R::Flags>,
        decision: ReuseDecision,
    ) -> Self {
        Self {
            game_id,
            npc_id,
            target,
            draft,
            decision,
            prompt: None,
        }
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    pub fn npc_id(&self) -> Option<NpcId> {
        self.npc_id
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    pub fn decision(&self) -> ReuseDecision {
        self.decision
    }

    pub fn draft(&self) -> &RecordDraft<R::Flags> {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut RecordDraft<R::Flags> {
        &mut self.draft
    }

    /// Existing record the pending prompt is about, if a save is suspended.
    pub fn pending_prompt(&self) -> Option<&R> {
        self.prompt.as_ref()
    }

    /// Records the answer to the pending prompt. Returns `false` when no
    /// prompt is pending.
    pub fn answer_reuse(&mut self, reuse: bool) -> bool {
        let Some(existing) = self.prompt.take() else {
            return false;
        };
        self.decision = if reuse {
            ReuseDecision::Reuse(existing.id())
        } else {
            ReuseDecision::CreateNew
        };
        true
    }

    pub(crate) fn plan(&self) -> SavePlan {
        if let Some(id) = self.target {
            return SavePlan::Update(id);
        }
        match self.decision {
            ReuseDecision::Undecided => SavePlan::LookupByName,
            ReuseDecision::Reuse(id) => SavePlan::Reuse(id),
            ReuseDecision::CreateNew => SavePlan::Create,
        }
    }

    pub(crate) fn suspend(&mut self, existing: R) {
        self.prompt = Some(existing);
    }

    pub(crate) fn complete(&mut self, saved: &R) {
        self.target = Some(saved.id());
        self.draft = draft_of(saved);
        self.prompt = None;
    }
}

fn draft_of<R: TrackedRecord>(record: &R) -> RecordDraft<R::Flags> {
    RecordDraft {
        name: record.name().to_string(),
        flags: record.flags(),
        notes: record.notes().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{EditSession, ReuseDecision, SavePlan};
    use crate::model::record::{Location, LocationDraft, LocationFlags, TrackedRecord};

    fn tavern(id: i64) -> Location {
        Location::assemble(id, "Tavern".to_string(), LocationFlags::default(), String::new())
    }

    #[test]
    fn new_session_plans_a_name_lookup() {
        let session: EditSession<Location> =
            EditSession::create(1, None, LocationDraft::new("Tavern", Default::default(), ""));
        assert_eq!(session.plan(), SavePlan::LookupByName);
    }

    #[test]
    fn editing_existing_record_never_looks_up() {
        let session = EditSession::edit(1, &tavern(9));
        assert_eq!(session.plan(), SavePlan::Update(9));
    }

    #[test]
    fn reuse_answer_is_sticky() {
        let mut session: EditSession<Location> =
            EditSession::create(1, None, LocationDraft::new("Tavern", Default::default(), ""));
        session.suspend(tavern(42));
        assert!(session.answer_reuse(true));
        assert_eq!(session.decision(), ReuseDecision::Reuse(42));
        assert_eq!(session.plan(), SavePlan::Reuse(42));
        assert!(session.pending_prompt().is_none());
        assert_eq!(session.plan(), SavePlan::Reuse(42));
    }

    #[test]
    fn declining_reuse_plans_a_create() {
        let mut session: EditSession<Location> =
            EditSession::create(1, None, LocationDraft::new("Tavern", Default::default(), ""));
        session.suspend(tavern(42));
        assert!(session.answer_reuse(false));
        assert_eq!(session.plan(), SavePlan::Create);
    }

    #[test]
    fn answer_without_prompt_is_ignored() {
        let mut session: EditSession<Location> =
            EditSession::create(1, None, LocationDraft::new("Tavern", Default::default(), ""));
        assert!(!session.answer_reuse(true));
        assert_eq!(session.decision(), ReuseDecision::Undecided);
    }

    #[test]
    fn completed_session_targets_saved_record() {
        let mut session: EditSession<Location> =
            EditSession::create(1, None, LocationDraft::new("Tavern", Default::default(), "x"));
        let mut saved = tavern(5);
        saved.notes = "old\nx".to_string();
        session.complete(&saved);
        assert_eq!(session.target(), Some(5));
        assert_eq!(session.draft().notes, "old\nx");
        assert_eq!(session.plan(), SavePlan::Update(5));
    }
}
