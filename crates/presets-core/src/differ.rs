//! Change detection between two projections of the preset store.
//!
//! A *projection* is the store flattened to one [`ProjectionRecord`] per
//! snapshot, holding only the fields subscribers treat as preset data: name,
//! description, shortcut and last-applied timestamp.  Availability and
//! currency are deliberately absent.  They follow the hardware, not the
//! preset, and are re-derived by the publisher at publish time.
//!
//! [`diff`] runs in O(n) using hash lookups on both sides.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::domain::snapshot::{PresetId, Shortcut, Snapshot};

/// One snapshot, flattened to the fields compared by [`diff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionRecord {
    pub id: PresetId,
    pub name: String,
    pub description: String,
    pub shortcut: Option<Shortcut>,
    pub last_applied: Option<DateTime<Utc>>,
}

impl From<&Snapshot> for ProjectionRecord {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            id: snapshot.id(),
            name: snapshot.name().to_string(),
            description: snapshot.description().to_string(),
            shortcut: snapshot.shortcut().cloned(),
            last_applied: snapshot.last_applied(),
        }
    }
}

/// Identifiers that need republishing, grouped by kind of change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: HashSet<PresetId>,
    pub modified: HashSet<PresetId>,
    /// Present before, absent now; published as deleted.
    pub removed: HashSet<PresetId>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }

    /// Every changed identifier, regardless of kind.
    pub fn all(&self) -> HashSet<PresetId> {
        self.added
            .iter()
            .chain(&self.modified)
            .chain(&self.removed)
            .copied()
            .collect()
    }

    pub fn contains(&self, id: &PresetId) -> bool {
        self.added.contains(id) || self.modified.contains(id) || self.removed.contains(id)
    }
}

/// Compares two projections and returns the identifiers whose compared
/// fields differ, were added, or were removed.
///
/// Order inside either projection is irrelevant.  If a projection repeats an
/// identifier, the last record wins.
pub fn diff(previous: &[ProjectionRecord], current: &[ProjectionRecord]) -> ChangeSet {
    let before: HashMap<PresetId, &ProjectionRecord> =
        previous.iter().map(|r| (r.id, r)).collect();
    let after: HashMap<PresetId, &ProjectionRecord> = current.iter().map(|r| (r.id, r)).collect();

    let mut changes = ChangeSet::default();

    for (id, record) in &after {
        match before.get(id) {
            None => {
                changes.added.insert(*id);
            }
            Some(old) if *old != *record => {
                changes.modified.insert(*id);
            }
            Some(_) => {}
        }
    }

    changes.removed.extend(before.keys().filter(|id| !after.contains_key(*id)));

    changes
}
