//! Change publishing: differ change-sets → subscriber records.
//!
//! The [`ChangePublisher`] remembers the projection it saw last.  Each call to
//! [`ChangePublisher::detect`] diffs the store's fresh projection against it
//! and keeps the fresh one for next time.
//!
//! Records are rebuilt from the live store at publish time, so availability
//! and currency always reflect the hardware state of *now*, never the state
//! the cached projection was taken under.

use chrono::{DateTime, Utc};
use presets_core::{
    diff, is_available, is_current, ChangeSet, LiveOutput, PresetId, PresetStore,
    ProjectionRecord, Shortcut, Snapshot,
};
use serde::Serialize;

/// Summary of one preset as published to subscribers.
///
/// A deleted preset is published as `{ id, deleted: true }` with every other
/// field left at its empty value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetRecord {
    pub id: PresetId,
    pub deleted: bool,
    pub name: String,
    pub description: String,
    /// Normalised key combination, `""` when the preset has none.
    pub shortcut: String,
    pub created: Option<DateTime<Utc>>,
    pub last_applied: Option<DateTime<Utc>>,
    pub output_count: usize,
    pub available: bool,
    pub current: bool,
}

impl PresetRecord {
    /// Builds a full record, evaluating the matcher against `live`.
    pub fn from_snapshot(snapshot: &Snapshot, live: Option<&[LiveOutput]>) -> Self {
        Self {
            id: snapshot.id(),
            deleted: false,
            name: snapshot.name().to_string(),
            description: snapshot.description().to_string(),
            shortcut: snapshot
                .shortcut()
                .map(Shortcut::to_string)
                .unwrap_or_default(),
            created: Some(snapshot.created()),
            last_applied: snapshot.last_applied(),
            output_count: snapshot.output_count(),
            available: is_available(snapshot, live),
            current: is_current(snapshot, live),
        }
    }

    pub fn deleted(id: PresetId) -> Self {
        Self {
            id,
            deleted: true,
            name: String::new(),
            description: String::new(),
            shortcut: String::new(),
            created: None,
            last_applied: None,
            output_count: 0,
            available: false,
            current: false,
        }
    }
}

/// Caches the previous projection and reports what changed since.
#[derive(Debug, Default)]
pub struct ChangePublisher {
    previous: Vec<ProjectionRecord>,
}

impl ChangePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diffs the store against the cached projection and updates the cache.
    pub fn detect(&mut self, store: &PresetStore) -> ChangeSet {
        let current = store.projection();
        let changes = diff(&self.previous, &current);
        self.previous = current;
        changes
    }

    /// Records for every identifier in `changes`.
    ///
    /// Presets still in the store come first, in store order; removed
    /// identifiers follow as deleted records, sorted for a stable output.
    pub fn records(
        changes: &ChangeSet,
        store: &PresetStore,
        live: Option<&[LiveOutput]>,
    ) -> Vec<PresetRecord> {
        let mut records: Vec<PresetRecord> = store
            .snapshots()
            .iter()
            .filter(|s| changes.contains(&s.id()))
            .map(|s| PresetRecord::from_snapshot(s, live))
            .collect();

        let mut removed: Vec<PresetId> = changes.removed.iter().copied().collect();
        removed.sort();
        records.extend(removed.into_iter().map(PresetRecord::deleted));
        records
    }

    /// Full records for every preset in the store.
    pub fn all_records(store: &PresetStore, live: Option<&[LiveOutput]>) -> Vec<PresetRecord> {
        store
            .snapshots()
            .iter()
            .map(|s| PresetRecord::from_snapshot(s, live))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presets_core::Mode;

    fn panel() -> Vec<LiveOutput> {
        vec![LiveOutput {
            id: "edid".to_string(),
            name: "eDP-1".to_string(),
            connected: true,
            enabled: true,
            current_mode: Some(Mode::new("m", 1920, 1080, 60.0)),
            ..LiveOutput::default()
        }]
    }

    #[test]
    fn test_detect_first_call_reports_everything_as_added() {
        let mut store = PresetStore::new();
        let id = store.save("A", "", &[], Utc::now()).unwrap().id();
        let mut publisher = ChangePublisher::new();

        let changes = publisher.detect(&store);

        assert!(changes.added.contains(&id));
    }

    #[test]
    fn test_detect_second_call_without_changes_is_empty() {
        let mut store = PresetStore::new();
        store.save("A", "", &[], Utc::now()).unwrap();
        let mut publisher = ChangePublisher::new();
        publisher.detect(&store);

        assert!(publisher.detect(&store).is_empty());
    }

    #[test]
    fn test_records_rederive_live_flags_at_publish_time() {
        // Arrange
        let live = panel();
        let mut store = PresetStore::new();
        let id = store.save("Laptop", "", &live, Utc::now()).unwrap().id();
        let mut publisher = ChangePublisher::new();
        let changes = publisher.detect(&store);

        // Act
        let without_state = ChangePublisher::records(&changes, &store, None);
        let with_state = ChangePublisher::records(&changes, &store, Some(&live));

        // Assert
        assert_eq!(without_state[0].id, id);
        assert!(!without_state[0].available);
        assert!(with_state[0].available);
        assert!(with_state[0].current);
        assert_eq!(with_state[0].output_count, 1);
    }

    #[test]
    fn test_records_mark_removed_ids_as_deleted() {
        let mut store = PresetStore::new();
        let id = store.save("A", "", &[], Utc::now()).unwrap().id();
        let mut publisher = ChangePublisher::new();
        publisher.detect(&store);
        store.delete(id).unwrap();

        let changes = publisher.detect(&store);
        let records = ChangePublisher::records(&changes, &store, None);

        assert_eq!(records, vec![PresetRecord::deleted(id)]);
    }

    #[test]
    fn test_record_serializes_shortcut_as_plain_string() {
        let mut store = PresetStore::new();
        let id = store.save("A", "", &[], Utc::now()).unwrap().id();
        store
            .set_shortcut(id, Some(Shortcut::parse("meta+2").unwrap()))
            .unwrap();

        let records = ChangePublisher::all_records(&store, None);
        let json = serde_json::to_value(&records[0]).unwrap();

        assert_eq!(json["shortcut"], "Meta+2");
        assert_eq!(json["deleted"], false);
        assert!(json["lastApplied"].is_null());
    }
}
