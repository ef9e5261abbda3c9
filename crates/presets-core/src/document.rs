//! Persisted layout of the preset set.
//!
//! ```text
//! { "version": 1, "presets": [ <Snapshot>, ... ] }
//! ```
//!
//! Snapshots are serialised with every field, including the nested output
//! list, so a document round-trips losslessly.  Timestamps are RFC 3339
//! strings and a missing shortcut is the empty string.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::snapshot::Snapshot;

/// Layout version written by this crate.
pub const CURRENT_VERSION: u32 = 1;

/// Errors produced while encoding or decoding a preset document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The text is not a valid preset document.
    #[error("malformed preset document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The document was written by a newer (or unknown) layout.
    #[error("unsupported preset document version: {0}")]
    UnsupportedVersion(u32),
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

/// The top-level persisted object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub presets: Vec<Snapshot>,
}

/// Serialises `presets` as a pretty-printed document at [`CURRENT_VERSION`].
///
/// # Errors
///
/// Returns [`DocumentError::Malformed`] if serialisation fails.
pub fn encode_document(presets: &[Snapshot]) -> Result<String, DocumentError> {
    #[derive(Serialize)]
    struct Borrowed<'a> {
        version: u32,
        presets: &'a [Snapshot],
    }

    Ok(serde_json::to_string_pretty(&Borrowed {
        version: CURRENT_VERSION,
        presets,
    })?)
}

/// Parses a document and returns its snapshots in stored order.
///
/// # Errors
///
/// Returns [`DocumentError::Malformed`] for invalid JSON or fields, and
/// [`DocumentError::UnsupportedVersion`] for any version other than
/// [`CURRENT_VERSION`].
pub fn decode_document(text: &str) -> Result<Vec<Snapshot>, DocumentError> {
    let document: PresetDocument = serde_json::from_str(text)?;
    if document.version != CURRENT_VERSION {
        return Err(DocumentError::UnsupportedVersion(document.version));
    }
    Ok(document.presets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::output::{LiveOutput, Mode, Rotation};
    use crate::domain::snapshot::Shortcut;
    use crate::domain::store::PresetStore;
    use chrono::{TimeZone, Utc};

    fn sample_store() -> PresetStore {
        let now = Utc.with_ymd_and_hms(2024, 5, 4, 12, 30, 0).unwrap();
        let live = vec![LiveOutput {
            id: "edid-1".to_string(),
            name: "DP-1".to_string(),
            display_name: "Dell U2720Q".to_string(),
            connected: true,
            enabled: true,
            rotation: Rotation::Left,
            scale: 1.5,
            current_mode: Some(Mode::new("3", 3840, 2160, 59.997)),
            ..LiveOutput::default()
        }];
        let mut store = PresetStore::new();
        let id = store.save("Desk", "4k portrait", &live, now).unwrap().id();
        store
            .set_shortcut(id, Some(Shortcut::parse("Meta+Shift+D").unwrap()))
            .unwrap();
        store.mark_applied(id, now).unwrap();
        store.save("Bare", "", &[], now).unwrap();
        store
    }

    #[test]
    fn test_document_round_trip_is_lossless() {
        let store = sample_store();

        let text = encode_document(store.snapshots()).unwrap();
        let restored = decode_document(&text).unwrap();

        assert_eq!(restored.as_slice(), store.snapshots());
    }

    #[test]
    fn test_document_writes_version_and_camel_case_fields() {
        let store = sample_store();

        let text = encode_document(store.snapshots()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["version"], 1);
        let first = &value["presets"][0];
        assert_eq!(first["shortcut"], "Meta+Shift+D");
        assert!(first["lastUsed"].is_string());
        assert_eq!(first["outputIds"][0], "edid-1");
        assert_eq!(first["outputs"][0]["rotation"], "left");
        assert_eq!(value["presets"][1]["shortcut"], "");
        assert!(value["presets"][1]["lastUsed"].is_null());
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let result = decode_document(r#"{"version": 2, "presets": []}"#);
        assert!(matches!(result, Err(DocumentError::UnsupportedVersion(2))));
    }

    #[test]
    fn test_decode_missing_fields_default_to_empty_v1() {
        assert!(decode_document("{}").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        assert!(matches!(
            decode_document("not json"),
            Err(DocumentError::Malformed(_))
        ));
    }
}
