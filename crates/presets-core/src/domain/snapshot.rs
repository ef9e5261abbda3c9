//! Snapshot ("preset") domain entity.
//!
//! A [`Snapshot`] is a named, timestamped list of [`OutputSpec`]s captured from
//! a live hardware state.  Its identifier and creation timestamp are fixed at
//! creation; everything else is mutated only through the
//! [`PresetStore`](super::store::PresetStore), which owns every snapshot.
//! Consumers get `&Snapshot` views or clones, never a long-lived `&mut`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::output::{LiveOutput, OutputSpec};
use super::store::StoreError;

/// Unique identifier for a preset, derived from UUID v4.
pub type PresetId = Uuid;

/// Errors produced while parsing a key combination.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShortcutParseError {
    /// The combination is empty or contains an empty `+`-separated part.
    #[error("empty key in shortcut: {0:?}")]
    EmptyPart(String),

    /// The same modifier appears twice.
    #[error("duplicate modifier {modifier} in shortcut {combo:?}")]
    DuplicateModifier { modifier: &'static str, combo: String },

    /// Only modifiers were given.
    #[error("shortcut {0:?} has no non-modifier key")]
    MissingKey(String),

    /// More than one non-modifier key was given.
    #[error("shortcut {0:?} has more than one non-modifier key")]
    MultipleKeys(String),
}

/// Modifier names in canonical output order.
const MODIFIERS: [&str; 4] = ["Ctrl", "Alt", "Shift", "Meta"];

/// A normalised keyboard shortcut such as `Ctrl+Alt+1`.
///
/// Parsing is case-insensitive and accepts common aliases (`Control`,
/// `Super`, `Win`); the stored form always lists modifiers as
/// `Ctrl+Alt+Shift+Meta` followed by the key, so two spellings of the same
/// combination compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Shortcut(String);

impl Shortcut {
    /// Parses and normalises a key combination.
    ///
    /// # Errors
    ///
    /// Returns a [`ShortcutParseError`] describing the first problem found.
    pub fn parse(combo: &str) -> Result<Self, ShortcutParseError> {
        let mut present = [false; 4];
        let mut key: Option<String> = None;

        for raw in combo.split('+') {
            let part = raw.trim();
            if part.is_empty() {
                return Err(ShortcutParseError::EmptyPart(combo.to_string()));
            }
            match modifier_index(part) {
                Some(idx) => {
                    if present[idx] {
                        return Err(ShortcutParseError::DuplicateModifier {
                            modifier: MODIFIERS[idx],
                            combo: combo.to_string(),
                        });
                    }
                    present[idx] = true;
                }
                None => {
                    if key.is_some() {
                        return Err(ShortcutParseError::MultipleKeys(combo.to_string()));
                    }
                    key = Some(normalize_key(part));
                }
            }
        }

        let key = key.ok_or_else(|| ShortcutParseError::MissingKey(combo.to_string()))?;
        let mut parts: Vec<&str> = MODIFIERS
            .iter()
            .zip(present)
            .filter_map(|(name, on)| on.then_some(*name))
            .collect();
        parts.push(&key);
        Ok(Self(parts.join("+")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Shortcut {
    type Err = ShortcutParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn modifier_index(part: &str) -> Option<usize> {
    match part.to_ascii_lowercase().as_str() {
        "ctrl" | "control" => Some(0),
        "alt" => Some(1),
        "shift" => Some(2),
        "meta" | "super" | "win" | "logo" => Some(3),
        _ => None,
    }
}

fn normalize_key(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) if part.chars().count() == 1 => first.to_uppercase().collect(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The persisted form of a shortcut is a plain string; `""` means "none".
mod shortcut_field {
    use super::Shortcut;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Shortcut>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_ref().map(Shortcut::as_str).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Shortcut>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Shortcut::parse(&raw).map(Some).map_err(D::Error::custom)
    }
}

/// A named, persisted snapshot of a multi-output display arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    id: PresetId,
    name: String,
    #[serde(default)]
    description: String,
    created: DateTime<Utc>,
    #[serde(rename = "lastUsed", default)]
    last_applied: Option<DateTime<Utc>>,
    #[serde(default)]
    outputs: Vec<OutputSpec>,
    #[serde(default)]
    output_ids: Vec<String>,
    #[serde(default, with = "shortcut_field")]
    shortcut: Option<Shortcut>,
}

impl Snapshot {
    /// Captures the connected, enabled outputs of a live state into a new snapshot.
    ///
    /// Disconnected and disabled outputs are not stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyName`] for a blank name and
    /// [`StoreError::EnabledOutputWithoutMode`] when an enabled output reports
    /// no current mode.
    pub fn capture(
        name: &str,
        description: &str,
        live: &[LiveOutput],
        now: DateTime<Utc>,
    ) -> Result<Self, StoreError> {
        let outputs = live
            .iter()
            .filter(|o| o.is_active())
            .map(|o| OutputSpec {
                id: o.id.clone(),
                name: o.name.clone(),
                display_name: o.display_name.clone(),
                enabled: true,
                position: o.position,
                scale: o.scale,
                rotation: o.rotation,
                flip: o.flip,
                mode: o.current_mode.clone(),
                priority: o.priority,
                primary: o.primary,
                attributes: o.attributes.clone(),
            })
            .collect();
        Self::from_outputs(name, description, outputs, now)
    }

    /// Builds a snapshot from an explicit list of output specs.
    ///
    /// `output_ids` is derived from the enabled outputs, in order.
    ///
    /// # Errors
    ///
    /// Same as [`Snapshot::capture`].
    pub fn from_outputs(
        name: &str,
        description: &str,
        outputs: Vec<OutputSpec>,
        now: DateTime<Utc>,
    ) -> Result<Self, StoreError> {
        let name = validate_name(name)?;
        if let Some(bad) = outputs.iter().find(|o| o.enabled && o.mode.is_none()) {
            return Err(StoreError::EnabledOutputWithoutMode(bad.name.clone()));
        }
        let output_ids = outputs
            .iter()
            .filter(|o| o.enabled)
            .map(|o| o.id.clone())
            .collect();

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            description: description.to_string(),
            created: now,
            last_applied: None,
            outputs,
            output_ids,
            shortcut: None,
        })
    }

    pub fn id(&self) -> PresetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// When the snapshot was last successfully applied, if ever.
    pub fn last_applied(&self) -> Option<DateTime<Utc>> {
        self.last_applied
    }

    pub fn outputs(&self) -> &[OutputSpec] {
        &self.outputs
    }

    /// Physical identifiers of the enabled outputs, for quick pre-checks.
    pub fn output_ids(&self) -> &[String] {
        &self.output_ids
    }

    pub fn shortcut(&self) -> Option<&Shortcut> {
        self.shortcut.as_ref()
    }

    pub fn output_count(&self) -> usize {
        self.output_ids.len()
    }

    /// Iterates over the outputs this snapshot requires to be lit.
    pub fn enabled_outputs(&self) -> impl Iterator<Item = &OutputSpec> {
        self.outputs.iter().filter(|o| o.enabled)
    }

    // ── Store-only mutators ───────────────────────────────────────────────────

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_description(&mut self, description: String) {
        self.description = description;
    }

    pub(crate) fn set_shortcut(&mut self, shortcut: Option<Shortcut>) {
        self.shortcut = shortcut;
    }

    pub(crate) fn set_last_applied(&mut self, at: DateTime<Utc>) {
        self.last_applied = Some(at);
    }

    /// Takes over the identity of the snapshot this one replaces.
    pub(crate) fn adopt_identity(&mut self, id: PresetId, created: DateTime<Utc>) {
        self.id = id;
        self.created = created;
    }
}

/// Trims a preset name and rejects blank ones.
pub(crate) fn validate_name(name: &str) -> Result<String, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::EmptyName);
    }
    Ok(trimmed.to_string())
}
