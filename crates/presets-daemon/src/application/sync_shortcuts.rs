//! Keeps global shortcut bindings in step with the presets.
//!
//! Presets store at most one [`Shortcut`] each, and nothing in the store stops
//! two presets from holding the same combination.  Global uniqueness is the
//! job of the [`ShortcutRegistry`] behind this module: when a combination is
//! already bound, registration fails and the second preset simply stays
//! unbound until the conflict goes away.
//!
//! [`ShortcutSync`] remembers what it registered and, after each store change,
//! only touches the bindings that actually changed.

use std::collections::HashMap;

use presets_core::{PresetId, PresetStore, Shortcut};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors reported by a shortcut backend.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShortcutError {
    /// The combination is already bound to another preset.
    #[error("{shortcut} is already bound to preset {holder}")]
    AlreadyBound { shortcut: Shortcut, holder: PresetId },

    /// The platform backend rejected the request.
    #[error("shortcut backend error: {0}")]
    Backend(String),
}

/// Capability interface for registering global key bindings.
///
/// Implemented by the platform integration; the daemon never talks to a
/// platform action object directly.
#[cfg_attr(test, mockall::automock)]
pub trait ShortcutRegistry: Send {
    /// Binds `shortcut` so that pressing it applies preset `id`.
    fn register(&mut self, id: PresetId, shortcut: &Shortcut) -> Result<(), ShortcutError>;

    /// Removes whatever binding preset `id` holds.  Unknown ids are a no-op.
    fn unregister(&mut self, id: PresetId) -> Result<(), ShortcutError>;
}

/// Tracks the bindings currently registered on behalf of presets.
#[derive(Debug, Default)]
pub struct ShortcutSync {
    bound: HashMap<PresetId, Shortcut>,
}

impl ShortcutSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if preset `id` currently owns a registered binding.
    pub fn is_bound(&self, id: PresetId) -> bool {
        self.bound.contains_key(&id)
    }

    /// Brings `registry` in line with the shortcuts stored in `store`.
    ///
    /// Stale bindings are removed before new ones are added, so a combination
    /// moved from one preset to another is free by the time it is re-bound.
    pub fn sync(&mut self, store: &PresetStore, registry: &mut dyn ShortcutRegistry) {
        let desired: HashMap<PresetId, &Shortcut> = store
            .snapshots()
            .iter()
            .filter_map(|s| s.shortcut().map(|sc| (s.id(), sc)))
            .collect();

        let stale: Vec<PresetId> = self
            .bound
            .iter()
            .filter(|(id, shortcut)| desired.get(*id) != Some(shortcut))
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            if let Err(e) = registry.unregister(id) {
                warn!(preset = %id, "failed to unregister shortcut: {e}");
            }
            self.bound.remove(&id);
        }

        for snapshot in store.snapshots() {
            let Some(shortcut) = snapshot.shortcut() else {
                continue;
            };
            if self.bound.contains_key(&snapshot.id()) {
                continue;
            }
            match registry.register(snapshot.id(), shortcut) {
                Ok(()) => {
                    debug!(preset = snapshot.name(), %shortcut, "shortcut registered");
                    self.bound.insert(snapshot.id(), shortcut.clone());
                }
                Err(e) => {
                    warn!(preset = snapshot.name(), %shortcut, "shortcut not registered: {e}");
                }
            }
        }
    }

    /// Unregisters every binding, e.g. on shutdown.
    pub fn clear(&mut self, registry: &mut dyn ShortcutRegistry) {
        for (id, _) in self.bound.drain() {
            if let Err(e) = registry.unregister(id) {
                warn!(preset = %id, "failed to unregister shortcut: {e}");
            }
        }
    }
}
