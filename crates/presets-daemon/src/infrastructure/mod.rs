//! Infrastructure layer for the presets daemon.
//!
//! Contains the adapters behind the application ports: the TOML daemon
//! configuration, the JSON presets file, the hardware state reader and plan
//! writer, the shortcut registry, the file monitor, and the command bridge
//! the CLI talks to.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `presets_core`, but MUST NOT be imported by the `application` or domain
//! layers.

pub mod command_bridge;
pub mod hardware;
pub mod monitor;
pub mod shortcuts;
pub mod storage;
