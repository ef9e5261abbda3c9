//! PresetService: the single owner of the preset store inside the daemon.
//!
//! Every query and mutation from the command bridge goes through this
//! service.  It pairs the [`PresetStore`] with the last hardware state it was
//! told about, so records can be annotated with live availability and
//! currency.
//!
//! # Mutation pipeline
//!
//! ```text
//! mutate store ─▶ persist ─▶ resync shortcuts ─▶ diff + publish
//! ```
//!
//! A failed persist is reported as [`PresetEvent::PersistenceFailed`] but does
//! not roll the store back: the in-memory store stays the source of truth and
//! the next successful save writes it out in full.
//!
//! # Events
//!
//! Subscribers receive [`PresetEvent`]s over a bounded `mpsc` channel created
//! by [`PresetService::new`].  If the channel is full the event is dropped
//! with a warning rather than blocking the caller.

use std::path::PathBuf;

use chrono::Utc;
use presets_core::{
    DocumentError, LiveOutput, PartialApply, PresetId, PresetStore, SaveOutcome, Shortcut,
    Snapshot, StoreError,
};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

use super::publish_changes::{ChangePublisher, PresetRecord};
use super::sync_shortcuts::{ShortcutRegistry, ShortcutSync};

/// Capacity of the event channel returned by [`PresetService::new`].
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Errors produced by a [`PresetRepository`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing presets at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored document could not be encoded or decoded.
    #[error("invalid presets document at {path}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },
}

/// Persistence port: loads and stores the complete preset list.
///
/// A missing backing store loads as an empty list.
#[cfg_attr(test, mockall::automock)]
pub trait PresetRepository: Send {
    fn load(&self) -> Result<Vec<Snapshot>, RepositoryError>;
    fn save(&self, presets: &[Snapshot]) -> Result<(), RepositoryError>;
}

/// Notifications pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum PresetEvent {
    /// The listed presets changed (or were deleted) and should be re-rendered.
    PresetsChanged(Vec<PresetRecord>),
    /// A preset was applied successfully.
    PresetApplied(PresetId),
    /// Part of an apply could not be honoured exactly.
    PartialApply { id: PresetId, warning: PartialApply },
    /// An apply request failed; nothing was recorded as applied.
    ApplyFailed { id: PresetId, reason: String },
    /// Writing the presets failed; the in-memory store is unchanged.
    PersistenceFailed(String),
    /// Reading the presets failed; the in-memory store is unchanged.
    LoadingFailed(String),
}

/// Owns the preset store and drives persistence, shortcuts and publishing.
pub struct PresetService {
    store: PresetStore,
    live: Option<Vec<LiveOutput>>,
    repository: Box<dyn PresetRepository>,
    registry: Box<dyn ShortcutRegistry>,
    shortcuts: ShortcutSync,
    publisher: ChangePublisher,
    events: mpsc::Sender<PresetEvent>,
}

impl PresetService {
    /// Creates an empty service.  Call [`PresetService::reload`] to populate it.
    pub fn new(
        repository: Box<dyn PresetRepository>,
        registry: Box<dyn ShortcutRegistry>,
    ) -> (Self, mpsc::Receiver<PresetEvent>) {
        let (events, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let service = Self {
            store: PresetStore::new(),
            live: None,
            repository,
            registry,
            shortcuts: ShortcutSync::new(),
            publisher: ChangePublisher::new(),
            events,
        };
        (service, rx)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Every preset, annotated with live availability and currency.
    pub fn presets(&self) -> Vec<PresetRecord> {
        ChangePublisher::all_records(&self.store, self.live_state())
    }

    pub fn preset(&self, id: PresetId) -> Option<PresetRecord> {
        self.store
            .get(id)
            .map(|s| PresetRecord::from_snapshot(s, self.live_state()))
    }

    pub fn preset_exists(&self, name: &str) -> bool {
        self.store.exists_by_name(name)
    }

    pub fn snapshot(&self, id: PresetId) -> Option<&Snapshot> {
        self.store.get(id)
    }

    pub fn store(&self) -> &PresetStore {
        &self.store
    }

    /// The last hardware state passed to [`PresetService::update_live_state`].
    pub fn live_state(&self) -> Option<&[LiveOutput]> {
        self.live.as_deref()
    }

    /// Returns `true` if the preset's shortcut is currently registered.
    pub fn shortcut_bound(&self, id: PresetId) -> bool {
        self.shortcuts.is_bound(id)
    }

    // ── Mutations ─────────────────────────────────────────────────────────────

    /// Captures `live` under `name`, replacing any preset with that name.
    pub fn save(
        &mut self,
        name: &str,
        description: &str,
        live: &[LiveOutput],
    ) -> Result<SaveOutcome, StoreError> {
        let outcome = self.store.save(name, description, live, Utc::now())?;
        info!(preset = name, ?outcome, "preset saved");
        self.commit();
        Ok(outcome)
    }

    pub fn delete(&mut self, id: PresetId) -> Result<(), StoreError> {
        let removed = self.store.delete(id)?;
        info!(preset = removed.name(), "preset deleted");
        self.commit();
        Ok(())
    }

    pub fn rename(&mut self, id: PresetId, name: &str) -> Result<(), StoreError> {
        self.store.rename(id, name)?;
        self.commit();
        Ok(())
    }

    pub fn set_description(&mut self, id: PresetId, description: &str) -> Result<(), StoreError> {
        self.store.set_description(id, description)?;
        self.commit();
        Ok(())
    }

    pub fn set_shortcut(
        &mut self,
        id: PresetId,
        shortcut: Option<Shortcut>,
    ) -> Result<(), StoreError> {
        self.store.set_shortcut(id, shortcut)?;
        self.commit();
        Ok(())
    }

    /// Records a successful apply of `id` at the current time.
    pub fn mark_applied(&mut self, id: PresetId) -> Result<(), StoreError> {
        self.store.mark_applied(id, Utc::now())?;
        self.commit();
        Ok(())
    }

    /// Replaces the observed hardware state and republishes every preset,
    /// since any of them may have become (un)available or (not) current.
    pub fn update_live_state(&mut self, outputs: Vec<LiveOutput>) {
        debug!(outputs = outputs.len(), "live state updated");
        self.live = Some(outputs);
        if !self.store.is_empty() {
            self.emit(PresetEvent::PresetsChanged(self.presets()));
        }
    }

    /// Re-reads the presets from the repository.
    ///
    /// On failure the store is left untouched and
    /// [`PresetEvent::LoadingFailed`] is emitted.
    pub fn reload(&mut self) -> Result<(), RepositoryError> {
        match self.repository.load() {
            Ok(snapshots) => {
                self.store.replace_all(snapshots);
                info!(presets = self.store.len(), "presets loaded");
                self.shortcuts.sync(&self.store, self.registry.as_mut());
                self.publish_changes();
                Ok(())
            }
            Err(e) => {
                error!("failed to load presets: {e}");
                self.emit(PresetEvent::LoadingFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Releases every registered shortcut.
    pub fn release_shortcuts(&mut self) {
        self.shortcuts.clear(self.registry.as_mut());
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn commit(&mut self) {
        if let Err(e) = self.repository.save(self.store.snapshots()) {
            error!("failed to save presets: {e}");
            self.emit(PresetEvent::PersistenceFailed(e.to_string()));
        }
        self.shortcuts.sync(&self.store, self.registry.as_mut());
        self.publish_changes();
    }

    fn publish_changes(&mut self) {
        let changes = self.publisher.detect(&self.store);
        if changes.is_empty() {
            return;
        }
        let records = ChangePublisher::records(&changes, &self.store, self.live_state());
        self.emit(PresetEvent::PresetsChanged(records));
    }

    pub(crate) fn emit(&self, event: PresetEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(?event, "event channel full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("no event subscriber");
            }
        }
    }
}
