//! Location and Quest models.
//!
//! # Responsibility
//! - Define the two record kinds that take part in name-based reuse.
//! - Expose them through one `TrackedRecord` trait so storage and the edit
//!   flow are written once for both kinds.
//!
//! # Invariants
//! - A record's name is a soft key: equal names are allowed in storage.
//! - Reusing a record appends new notes after the old ones, separated by a
//!   single `\n`.

use super::{new_entity_id, normalize_name, EntityId, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub type LocationId = EntityId;
pub type QuestId = EntityId;

/// Record kinds participating in reuse-or-create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Location,
    Quest,
}

impl RecordKind {
    /// Stable lowercase label used in logs and FFI payloads.
    pub fn label(self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Quest => "quest",
        }
    }
}

/// Shared shape of Locations and Quests: id, name, kind-specific flags, notes.
pub trait TrackedRecord: Clone + Debug {
    /// Kind-specific boolean attributes.
    type Flags: Copy + Debug + Default + PartialEq;

    const KIND: RecordKind;

    fn assemble(id: EntityId, name: String, flags: Self::Flags, notes: String) -> Self;
    fn id(&self) -> EntityId;
    fn name(&self) -> &str;
    fn flags(&self) -> Self::Flags;
    fn notes(&self) -> &str;
}

/// Values entered in a Location or Quest editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDraft<F> {
    pub name: String,
    pub flags: F,
    pub notes: String,
}

impl<F: Copy> RecordDraft<F> {
    pub fn new(name: impl Into<String>, flags: F, notes: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags,
            notes: notes.into(),
        }
    }

    /// Trims name and notes; rejects a blank name.
    pub fn normalized(&self) -> Result<Self, ModelValidationError> {
        Ok(Self {
            name: normalize_name(&self.name)?,
            flags: self.flags,
            notes: self.notes.trim().to_string(),
        })
    }

    /// Materializes this draft as a new record with a generated id.
    pub fn to_record<R: TrackedRecord<Flags = F>>(&self) -> R {
        R::assemble(
            new_entity_id(),
            self.name.clone(),
            self.flags,
            self.notes.clone(),
        )
    }
}

/// Notes kept when an existing record is reused from a new entry.
pub fn merge_reused_notes(old_notes: &str, new_notes: &str) -> String {
    format!("{old_notes}\n{new_notes}")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFlags {
    pub is_cleared: bool,
    pub has_smith: bool,
    pub has_merchant: bool,
}

/// A place in the campaign world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub is_cleared: bool,
    /// The location has a smith (anvil) available.
    pub has_smith: bool,
    pub has_merchant: bool,
    pub notes: String,
}

impl TrackedRecord for Location {
    type Flags = LocationFlags;

    const KIND: RecordKind = RecordKind::Location;

    fn assemble(id: EntityId, name: String, flags: LocationFlags, notes: String) -> Self {
        Self {
            id,
            name,
            is_cleared: flags.is_cleared,
            has_smith: flags.has_smith,
            has_merchant: flags.has_merchant,
            notes,
        }
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn flags(&self) -> LocationFlags {
        LocationFlags {
            is_cleared: self.is_cleared,
            has_smith: self.has_smith,
            has_merchant: self.has_merchant,
        }
    }

    fn notes(&self) -> &str {
        &self.notes
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestFlags {
    pub is_complete: bool,
}

/// A quest accepted during the campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub name: String,
    pub is_complete: bool,
    pub notes: String,
}

impl TrackedRecord for Quest {
    type Flags = QuestFlags;

    const KIND: RecordKind = RecordKind::Quest;

    fn assemble(id: EntityId, name: String, flags: QuestFlags, notes: String) -> Self {
        Self {
            id,
            name,
            is_complete: flags.is_complete,
            notes,
        }
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn flags(&self) -> QuestFlags {
        QuestFlags {
            is_complete: self.is_complete,
        }
    }

    fn notes(&self) -> &str {
        &self.notes
    }
}

pub type LocationDraft = RecordDraft<LocationFlags>;
pub type QuestDraft = RecordDraft<QuestFlags>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_notes_keep_old_text_first() {
        assert_eq!(merge_reused_notes("old", "new"), "old\nnew");
        assert_eq!(merge_reused_notes("old", ""), "old\n");
    }

    #[test]
    fn draft_normalization_trims_name_and_notes() {
        let draft = LocationDraft::new(" Tavern ", LocationFlags::default(), "  rats \n");
        let normalized = draft.normalized().unwrap();
        assert_eq!(normalized.name, "Tavern");
        assert_eq!(normalized.notes, "rats");
    }

    #[test]
    fn draft_to_record_copies_flags() {
        let flags = QuestFlags { is_complete: true };
        let quest: Quest = QuestDraft::new("Find the ring", flags, "").to_record();
        assert_eq!(quest.name, "Find the ring");
        assert!(quest.is_complete);
        assert_eq!(quest.flags(), flags);
    }

    #[test]
    fn serialized_names_match_ffi_labels() {
        assert_eq!(
            serde_json::to_string(&RecordKind::Location).unwrap(),
            "\"location\""
        );
        let location = Location::assemble(
            7,
            "Tavern".to_string(),
            LocationFlags {
                has_smith: true,
                ..LocationFlags::default()
            },
            String::new(),
        );
        let value = serde_json::to_value(&location).unwrap();
        assert_eq!(value["has_smith"], true);
        assert_eq!(value["is_cleared"], false);
        assert_eq!(RecordKind::Quest.label(), "quest");
    }
}
