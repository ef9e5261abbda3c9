//! Shortcut registry backends.
//!
//! [`InMemoryShortcutRegistry`] keeps the bindings in a map and enforces that
//! each key combination is bound to at most one preset.  It stands in for a
//! platform global-accelerator service, which would implement the same
//! [`ShortcutRegistry`] trait.

use std::collections::HashMap;

use presets_core::{PresetId, Shortcut};
use tracing::debug;

use crate::application::sync_shortcuts::{ShortcutError, ShortcutRegistry};

/// Process-local registry with global uniqueness of combinations.
#[derive(Debug, Default)]
pub struct InMemoryShortcutRegistry {
    by_preset: HashMap<PresetId, Shortcut>,
    by_combo: HashMap<Shortcut, PresetId>,
}

impl InMemoryShortcutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The preset a combination would trigger, if bound.
    pub fn lookup(&self, shortcut: &Shortcut) -> Option<PresetId> {
        self.by_combo.get(shortcut).copied()
    }

    pub fn len(&self) -> usize {
        self.by_preset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_preset.is_empty()
    }
}

impl ShortcutRegistry for InMemoryShortcutRegistry {
    fn register(&mut self, id: PresetId, shortcut: &Shortcut) -> Result<(), ShortcutError> {
        if let Some(&holder) = self.by_combo.get(shortcut) {
            if holder != id {
                return Err(ShortcutError::AlreadyBound {
                    shortcut: shortcut.clone(),
                    holder,
                });
            }
            return Ok(());
        }

        if let Some(previous) = self.by_preset.insert(id, shortcut.clone()) {
            self.by_combo.remove(&previous);
        }
        self.by_combo.insert(shortcut.clone(), id);
        debug!(preset = %id, %shortcut, "binding added");
        Ok(())
    }

    fn unregister(&mut self, id: PresetId) -> Result<(), ShortcutError> {
        if let Some(shortcut) = self.by_preset.remove(&id) {
            self.by_combo.remove(&shortcut);
            debug!(preset = %id, %shortcut, "binding removed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn combo(s: &str) -> Shortcut {
        Shortcut::parse(s).unwrap()
    }

    #[test]
    fn test_register_binds_combo_to_preset() {
        let mut registry = InMemoryShortcutRegistry::new();
        let id = Uuid::new_v4();

        registry.register(id, &combo("Meta+1")).unwrap();

        assert_eq!(registry.lookup(&combo("meta+1")), Some(id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_rejects_combo_held_by_other_preset() {
        let mut registry = InMemoryShortcutRegistry::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        registry.register(first, &combo("Meta+1")).unwrap();

        let result = registry.register(second, &combo("Meta+1"));

        assert_eq!(
            result,
            Err(ShortcutError::AlreadyBound {
                shortcut: combo("Meta+1"),
                holder: first
            })
        );
    }

    #[test]
    fn test_register_same_binding_twice_is_ok() {
        let mut registry = InMemoryShortcutRegistry::new();
        let id = Uuid::new_v4();
        registry.register(id, &combo("Meta+1")).unwrap();
        assert!(registry.register(id, &combo("Meta+1")).is_ok());
    }

    #[test]
    fn test_register_new_combo_replaces_old_one() {
        let mut registry = InMemoryShortcutRegistry::new();
        let id = Uuid::new_v4();
        registry.register(id, &combo("Meta+1")).unwrap();

        registry.register(id, &combo("Meta+2")).unwrap();

        assert_eq!(registry.lookup(&combo("Meta+1")), None);
        assert_eq!(registry.lookup(&combo("Meta+2")), Some(id));
    }

    #[test]
    fn test_unregister_frees_combo() {
        let mut registry = InMemoryShortcutRegistry::new();
        let id = Uuid::new_v4();
        registry.register(id, &combo("Meta+1")).unwrap();

        registry.unregister(id).unwrap();

        assert!(registry.is_empty());
        assert!(registry.register(Uuid::new_v4(), &combo("Meta+1")).is_ok());
    }
}
