//! # presets-core
//!
//! Shared library for Display Presets containing the preset store, the
//! live-state matcher, the change differ, the apply planner and the
//! persisted document format.
//!
//! This crate is used by the daemon and by anything else that needs to reason
//! about presets.  It has zero dependencies on OS APIs, display servers, IPC
//! transports, or the file system.
//!
//! # Architecture overview (for beginners)
//!
//! A *preset* is a named snapshot of a multi-monitor arrangement: which outputs
//! were on, where they sat, at what resolution, scale and rotation.  Users save
//! presets ("Docked", "Presentation", "Laptop only") and later re-apply them.
//!
//! This crate (`presets-core`) is the foundation.  It defines:
//!
//! - **`domain`** – The data model (`OutputSpec`, `Snapshot`, `LiveOutput`)
//!   and the [`PresetStore`], the ordered collection that owns every snapshot.
//!
//! - **`matcher`** – Decides whether a snapshot *could* be applied to the
//!   hardware that is plugged in right now ("available") and whether the
//!   hardware already looks exactly like the snapshot ("current").
//!
//! - **`differ`** – Compares two successive flattened views of the store and
//!   reports which preset identifiers must be republished to subscribers.
//!
//! - **`planner`** – Turns a snapshot into an ordered list of per-output
//!   mutations for an external "apply" collaborator.
//!
//! - **`document`** – The versioned JSON layout presets are persisted in.

pub mod differ;
pub mod document;
pub mod domain;
pub mod matcher;
pub mod planner;

// Re-export the most-used types at the crate root so callers can write
// `presets_core::PresetStore` instead of `presets_core::domain::store::PresetStore`.
pub use differ::{diff, ChangeSet, ProjectionRecord};
pub use document::{decode_document, encode_document, DocumentError, PresetDocument};
pub use domain::output::{
    Flip, LiveOutput, Mode, OutputAttributes, OutputSpec, Position, Rotation,
};
pub use domain::snapshot::{PresetId, Shortcut, ShortcutParseError, Snapshot};
pub use domain::store::{PresetStore, SaveOutcome, StoreError};
pub use matcher::{check_current, is_available, is_current, Mismatch};
pub use planner::{plan, ApplyPlan, OutputMutation, OutputSettings, PartialApply};
