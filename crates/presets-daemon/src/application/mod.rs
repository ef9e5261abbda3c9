//! Application layer use cases for the presets daemon.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (`presets_core`: pure store, matcher, differ and planner) and the
//! infrastructure (files, hardware tools, shortcut backends).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a user goal (e.g., "apply the
//!   Docked preset and remember when it was last used").
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so the infrastructure can be swapped without changing this code.
//! - **Contain no file system access and no hardware calls** of their own.
//!
//! # Sub-modules
//!
//! - **`preset_service`** – Owns the preset store and the last observed
//!   hardware state; every query and mutation goes through it.
//!
//! - **`publish_changes`** – Turns the differ's change-set into the records
//!   pushed to subscribers.
//!
//! - **`sync_shortcuts`** – Keeps the global shortcut registry in step with
//!   the shortcuts stored on presets.
//!
//! - **`apply_preset`** – Validates availability, plans, hands the plan to
//!   the executor and records the successful apply.

pub mod apply_preset;
pub mod preset_service;
pub mod publish_changes;
pub mod sync_shortcuts;
