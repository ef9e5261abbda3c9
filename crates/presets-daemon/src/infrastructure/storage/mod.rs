//! Storage infrastructure: configuration and presets file persistence.
//!
//! - `config` reads the daemon's TOML settings from the platform-appropriate
//!   directory, falling back to defaults on first run.
//! - `presets_file` implements [`PresetRepository`] on top of the versioned
//!   JSON document defined in `presets_core::document`.
//!
//! [`PresetRepository`]: crate::application::preset_service::PresetRepository

pub mod config;
pub mod presets_file;
