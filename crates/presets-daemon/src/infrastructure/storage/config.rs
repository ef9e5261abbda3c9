//! Daemon settings file.
//!
//! `config.toml` lives in the platform config directory
//! (`$XDG_CONFIG_HOME/display-presets` on Linux, `%APPDATA%\DisplayPresets`
//! on Windows, `~/Library/Application Support/DisplayPresets` on macOS):
//!
//! ```toml
//! [daemon]
//! log_level = "debug"
//! presets_file = "/home/me/presets.json"
//!
//! [monitor]
//! debounce_ms = 500
//! poll_interval_ms = 1000
//! hardware_state_file = "/run/user/1000/outputs.json"
//! ```
//!
//! Every key is optional.  A missing file is the same as an empty one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the presets file placed next to the config file by default.
pub const DEFAULT_PRESETS_FILE_NAME: &str = "presets.json";

/// Shortest poll interval accepted from the config.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Schema ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// `[daemon]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Presets file; `presets.json` beside the config file when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presets_file: Option<PathBuf>,
}

/// `[monitor]` section, read by the `watch` command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorConfig {
    /// Quiet period before a burst of file changes is acted on.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// JSON list of live outputs written by an external hardware tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_state_file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_debounce_ms() -> u64 {
    500
}
fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            presets_file: None,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            hardware_state_file: None,
        }
    }
}

impl AppConfig {
    /// The presets file to use, given the path the config was loaded from.
    pub fn presets_file(&self, config_path: &Path) -> PathBuf {
        match &self.daemon.presets_file {
            Some(path) => path.clone(),
            None => config_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(DEFAULT_PRESETS_FILE_NAME),
        }
    }
}

impl MonitorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms).max(MIN_POLL_INTERVAL)
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Default location of `config.toml`.
///
/// # Errors
///
/// [`ConfigError::NoPlatformConfigDir`] when neither the platform variable
/// nor `HOME` is set.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Reads the config at `path`; a missing file yields the defaults.
///
/// # Errors
///
/// [`ConfigError::Io`] for read failures other than "not found",
/// [`ConfigError::Parse`] for malformed TOML.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("DisplayPresets"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("display-presets"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("DisplayPresets")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("presets_cfg_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_presets_file_sits_beside_config_when_unset() {
        let cfg = AppConfig::default();

        let path = cfg.presets_file(Path::new("/etc/display-presets/config.toml"));

        assert_eq!(path, PathBuf::from("/etc/display-presets/presets.json"));
    }

    #[test]
    fn test_presets_file_bare_config_name_resolves_relative() {
        let cfg = AppConfig::default();
        let path = cfg.presets_file(Path::new("config.toml"));
        assert_eq!(path, PathBuf::from(DEFAULT_PRESETS_FILE_NAME));
    }

    #[test]
    fn test_presets_file_configured_path_wins() {
        let cfg: AppConfig = toml::from_str("[daemon]\npresets_file = \"/data/p.json\"\n").unwrap();

        let path = cfg.presets_file(Path::new("/etc/display-presets/config.toml"));

        assert_eq!(path, PathBuf::from("/data/p.json"));
    }

    #[test]
    fn test_monitor_durations_follow_config() {
        let cfg: AppConfig =
            toml::from_str("[monitor]\ndebounce_ms = 250\npoll_interval_ms = 0\n").unwrap();

        assert_eq!(cfg.monitor.debounce(), Duration::from_millis(250));
        assert_eq!(cfg.monitor.poll_interval(), MIN_POLL_INTERVAL);
        assert_eq!(cfg.daemon.log_level, "info");
        assert!(cfg.monitor.hardware_state_file.is_none());
    }

    #[test]
    fn test_unset_optional_paths_are_not_written_back() {
        let text = toml::to_string(&AppConfig::default()).unwrap();

        assert!(!text.contains("presets_file"));
        assert!(!text.contains("hardware_state_file"));
        assert_eq!(toml::from_str::<AppConfig>(&text).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_load_config_missing_file_gives_defaults() {
        let dir = temp_dir();

        let cfg = load_config(&dir.join("config.toml")).unwrap();

        assert_eq!(cfg, AppConfig::default());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_reads_hardware_state_file() {
        // Arrange
        let dir = temp_dir();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            "[monitor]\nhardware_state_file = \"/run/outputs.json\"\n",
        )
        .unwrap();

        // Act
        let cfg = load_config(&path).unwrap();

        // Assert
        assert_eq!(
            cfg.monitor.hardware_state_file,
            Some(PathBuf::from("/run/outputs.json"))
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_malformed_toml_is_parse_error() {
        let dir = temp_dir();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[monitor\ndebounce_ms = ").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_directory_is_io_error() {
        let dir = temp_dir();

        assert!(matches!(load_config(&dir), Err(ConfigError::Io { .. })));
        std::fs::remove_dir_all(&dir).ok();
    }
}
