//! File monitoring with debounce.
//!
//! Editors, sync tools and hardware helpers tend to touch a file several
//! times in a row.  [`FileWatch`] notices modification-time changes, and a
//! [`Debouncer`] per file waits for a quiet period before the change is acted
//! on, so a burst of writes triggers a single reload.
//!
//! [`run_watch`] ties both to the command bridge: a presets file change feeds
//! `reload`, a hardware state change feeds `refresh_live_state`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, info};

use super::command_bridge::{refresh_live_state, reload_presets, AppState};

/// Coalesces bursts of notifications into one, after a quiet period.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    last_event: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            last_event: None,
        }
    }

    /// Records a notification; restarts the quiet period.
    pub fn notify(&mut self, now: Instant) {
        self.last_event = Some(now);
    }

    /// Returns `true` once per burst, when the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.last_event {
            Some(at) if now.saturating_duration_since(at) >= self.quiet => {
                self.last_event = None;
                true
            }
            _ => false,
        }
    }
}

/// Detects changes of one file's modification time.
///
/// Creation and deletion count as changes too.
#[derive(Debug, Clone)]
pub struct FileWatch {
    path: PathBuf,
    last_seen: Option<SystemTime>,
}

impl FileWatch {
    /// Starts watching; the current state of the file is the baseline.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last_seen = modified(&path);
        Self { path, last_seen }
    }

    /// Returns `true` if the file changed since the previous call.
    pub fn changed(&mut self) -> bool {
        let now = modified(&self.path);
        if now != self.last_seen {
            self.last_seen = now;
            true
        } else {
            false
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Files and timings for [`run_watch`].
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub presets_file: PathBuf,
    pub hardware_state_file: Option<PathBuf>,
    pub debounce: Duration,
    pub poll_interval: Duration,
}

/// Polls the watched files until `running` is cleared.
pub async fn run_watch(state: Arc<AppState>, settings: WatchSettings, running: Arc<AtomicBool>) {
    let mut presets = (FileWatch::new(&settings.presets_file), Debouncer::new(settings.debounce));
    let mut hardware = settings
        .hardware_state_file
        .as_ref()
        .map(|path| (FileWatch::new(path), Debouncer::new(settings.debounce)));

    info!(
        presets = %settings.presets_file.display(),
        hardware = ?settings.hardware_state_file,
        "watching for changes"
    );

    let mut ticker = tokio::time::interval(settings.poll_interval);
    while running.load(Ordering::Relaxed) {
        ticker.tick().await;
        let now = Instant::now();

        if presets.0.changed() {
            debug!("presets file changed");
            presets.1.notify(now);
        }
        if presets.1.poll(now) {
            reload_presets(Arc::clone(&state)).await;
        }

        if let Some((watch, debounce)) = hardware.as_mut() {
            if watch.changed() {
                debug!("hardware state changed");
                debounce.notify(now);
            }
            if debounce.poll(now) {
                refresh_live_state(Arc::clone(&state)).await;
            }
        }
    }

    info!("watch stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const QUIET: Duration = Duration::from_millis(500);

    #[test]
    fn test_debouncer_idle_never_fires() {
        let mut debouncer = Debouncer::new(QUIET);
        assert!(!debouncer.poll(Instant::now()));
    }

    #[test]
    fn test_debouncer_fires_once_after_quiet_period() {
        // Arrange
        let start = Instant::now();
        let mut debouncer = Debouncer::new(QUIET);

        // Act
        debouncer.notify(start);

        // Assert
        assert!(!debouncer.poll(start + Duration::from_millis(499)));
        assert!(debouncer.poll(start + QUIET));
        assert!(!debouncer.poll(start + QUIET * 2));
    }

    #[test]
    fn test_debouncer_burst_restarts_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(QUIET);

        debouncer.notify(start);
        debouncer.notify(start + Duration::from_millis(300));
        debouncer.notify(start + Duration::from_millis(600));

        assert!(!debouncer.poll(start + Duration::from_millis(900)));
        assert!(debouncer.poll(start + Duration::from_millis(1100)));
    }

    #[test]
    fn test_file_watch_detects_creation_and_deletion() {
        let path = std::env::temp_dir().join(format!("watch_{}.json", Uuid::new_v4()));
        let mut watch = FileWatch::new(&path);
        assert!(!watch.changed());

        std::fs::write(&path, "{}").unwrap();
        assert!(watch.changed());
        assert!(!watch.changed());

        std::fs::remove_file(&path).unwrap();
        assert!(watch.changed());
    }
}
