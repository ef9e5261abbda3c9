//! Domain entities for Display Presets.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain** (or "entities" layer).  Domain code:
//!
//! - Contains the core business rules of the application.
//! - Has **no** imports from OS APIs, display servers, IPC libraries, or UI
//!   frameworks.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! Here the domain is the vocabulary of outputs and snapshots, plus the store
//! that owns the snapshots.  The matcher, differ and planner (siblings of this
//! module) are pure functions over these types.

/// Output descriptions: stored [`output::OutputSpec`] and observed [`output::LiveOutput`].
pub mod output;

/// A named snapshot of a display arrangement.
///
/// See [`snapshot::Snapshot`] for the main type.
pub mod snapshot;

/// The ordered, name-unique collection of snapshots.
pub mod store;
