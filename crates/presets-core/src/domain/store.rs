//! The preset store: an ordered, name-unique collection of snapshots.
//!
//! [`PresetStore`] is the single owner of every [`Snapshot`].  All mutations go
//! through it so that the two store invariants hold at all times:
//!
//! 1. Identifiers are unique and never reused.
//! 2. Names are unique.  Saving under an existing name *replaces* that
//!    snapshot's content instead of creating a second one.
//!
//! The store is not internally synchronised; the host serialises writers.
//! Timestamps are passed in by the caller so every operation stays pure.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use super::output::LiveOutput;
use super::snapshot::{validate_name, PresetId, Shortcut, Snapshot};
use crate::differ::ProjectionRecord;

/// Errors produced by store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No snapshot has the given identifier.
    #[error("preset not found: {0}")]
    NotFound(PresetId),

    /// Another snapshot already uses the requested name (rename only).
    #[error("a preset named {0:?} already exists")]
    NameCollision(String),

    /// Preset names must contain at least one non-whitespace character.
    #[error("preset name must not be empty")]
    EmptyName,

    /// An enabled output was captured without a current mode.
    #[error("enabled output {0} has no current mode")]
    EnabledOutputWithoutMode(String),
}

/// What a [`PresetStore::save`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new snapshot was appended.
    Created(PresetId),
    /// An existing snapshot with the same name had its content replaced.
    Replaced(PresetId),
}

impl SaveOutcome {
    pub fn id(self) -> PresetId {
        match self {
            SaveOutcome::Created(id) | SaveOutcome::Replaced(id) => id,
        }
    }
}

/// Ordered collection of snapshots with name-uniqueness.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetStore {
    snapshots: Vec<Snapshot>,
}

impl PresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from previously persisted snapshots.
    ///
    /// See [`PresetStore::replace_all`] for how duplicates are handled.
    pub fn from_snapshots(snapshots: Vec<Snapshot>) -> Self {
        let mut store = Self::new();
        store.replace_all(snapshots);
        store
    }

    // ── Mutations ─────────────────────────────────────────────────────────────

    /// Captures `live` under `name`, creating a new snapshot or replacing the
    /// content of the one that already has this name.
    ///
    /// # Errors
    ///
    /// Propagates capture validation errors from [`Snapshot::capture`].
    pub fn save(
        &mut self,
        name: &str,
        description: &str,
        live: &[LiveOutput],
        now: DateTime<Utc>,
    ) -> Result<SaveOutcome, StoreError> {
        let snapshot = Snapshot::capture(name, description, live, now)?;
        Ok(self.insert_captured(snapshot))
    }

    /// Inserts a freshly captured snapshot with create-or-replace-by-name
    /// semantics.
    ///
    /// On replace the existing identifier, creation timestamp and list
    /// position are kept; every other field comes from `snapshot`.  Only
    /// [`PresetStore::save`] calls this, so a created snapshot always carries
    /// a new identifier.
    fn insert_captured(&mut self, mut snapshot: Snapshot) -> SaveOutcome {
        match self.position_by_name(snapshot.name()) {
            Some(idx) => {
                let existing = &self.snapshots[idx];
                snapshot.adopt_identity(existing.id(), existing.created());
                let id = snapshot.id();
                self.snapshots[idx] = snapshot;
                SaveOutcome::Replaced(id)
            }
            None => {
                let id = snapshot.id();
                self.snapshots.push(snapshot);
                SaveOutcome::Created(id)
            }
        }
    }

    /// Removes a snapshot and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown identifier.
    pub fn delete(&mut self, id: PresetId) -> Result<Snapshot, StoreError> {
        let idx = self.position(id).ok_or(StoreError::NotFound(id))?;
        Ok(self.snapshots.remove(idx))
    }

    /// Renames a snapshot.  Renaming to its own current name is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyName`], [`StoreError::NameCollision`] when a
    /// different snapshot already holds the name, or [`StoreError::NotFound`].
    pub fn rename(&mut self, id: PresetId, name: &str) -> Result<(), StoreError> {
        let name = validate_name(name)?;
        let idx = self.position(id).ok_or(StoreError::NotFound(id))?;
        if let Some(other) = self.position_by_name(&name) {
            if other != idx {
                return Err(StoreError::NameCollision(name));
            }
        }
        self.snapshots[idx].set_name(name);
        Ok(())
    }

    pub fn set_description(&mut self, id: PresetId, description: &str) -> Result<(), StoreError> {
        self.get_mut(id)?.set_description(description.to_string());
        Ok(())
    }

    /// Sets or clears (`None`) the snapshot's shortcut.
    ///
    /// Uniqueness across snapshots is not checked here; the shortcut registry
    /// enforces it when the binding is registered.
    pub fn set_shortcut(
        &mut self,
        id: PresetId,
        shortcut: Option<Shortcut>,
    ) -> Result<(), StoreError> {
        self.get_mut(id)?.set_shortcut(shortcut);
        Ok(())
    }

    /// Records a successful apply.
    pub fn mark_applied(&mut self, id: PresetId, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.get_mut(id)?.set_last_applied(now);
        Ok(())
    }

    /// Replaces the whole content, e.g. after the presets file changed on disk.
    ///
    /// Snapshots repeating an earlier identifier or name are dropped with a
    /// warning so the store invariants survive a hand-edited file.
    pub fn replace_all(&mut self, snapshots: Vec<Snapshot>) {
        let mut ids = HashSet::with_capacity(snapshots.len());
        let mut names = HashSet::with_capacity(snapshots.len());
        self.snapshots = snapshots
            .into_iter()
            .filter(|s| {
                if !ids.insert(s.id()) {
                    warn!(id = %s.id(), "dropping preset with duplicate id");
                    return false;
                }
                if !names.insert(s.name().to_string()) {
                    warn!(preset = s.name(), "dropping preset with duplicate name");
                    return false;
                }
                true
            })
            .collect();
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn get(&self, id: PresetId) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.id() == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.name() == name.trim())
    }

    pub fn exists_by_name(&self, name: &str) -> bool {
        self.find_by_name(name).is_some()
    }

    pub fn contains(&self, id: PresetId) -> bool {
        self.get(id).is_some()
    }

    /// All snapshots, in insertion order.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Flattened view of the store used for change detection.
    pub fn projection(&self) -> Vec<ProjectionRecord> {
        self.snapshots.iter().map(ProjectionRecord::from).collect()
    }

    fn get_mut(&mut self, id: PresetId) -> Result<&mut Snapshot, StoreError> {
        self.snapshots
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn position(&self, id: PresetId) -> Option<usize> {
        self.snapshots.iter().position(|s| s.id() == id)
    }

    fn position_by_name(&self, name: &str) -> Option<usize> {
        self.snapshots.iter().position(|s| s.name() == name)
    }
}
