//! Hardware adapters.
//!
//! The daemon never drives a display server itself.  An external tool writes
//! the current output list as JSON, and another one consumes the ordered
//! mutation plan this crate produces:
//!
//! - [`FileHardwareProvider`] reads a JSON array of [`LiveOutput`].
//! - [`StaticHardwareProvider`] serves a fixed, replaceable list (headless use
//!   and tests).
//! - [`PlanFileExecutor`] writes the plan as pretty JSON to a file or stderr.
//! - [`RecordingExecutor`] records plans instead of executing them.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use presets_core::{LiveOutput, OutputMutation};
use serde::Serialize;
use tracing::debug;

use crate::application::apply_preset::{ApplyExecutor, HardwareError, HardwareStateProvider};

// ── State providers ───────────────────────────────────────────────────────────

/// Reads the live outputs from a JSON file on every call.
#[derive(Debug, Clone)]
pub struct FileHardwareProvider {
    path: PathBuf,
}

impl FileHardwareProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl HardwareStateProvider for FileHardwareProvider {
    async fn current_state(&self) -> Result<Vec<LiveOutput>, HardwareError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| HardwareError(format!("{}: {e}", self.path.display())))?;
        let outputs: Vec<LiveOutput> = serde_json::from_str(&text)
            .map_err(|e| HardwareError(format!("{}: {e}", self.path.display())))?;
        debug!(outputs = outputs.len(), "hardware state read");
        Ok(outputs)
    }
}

/// Serves a fixed output list.  `None` means no hardware source is configured.
#[derive(Debug, Default)]
pub struct StaticHardwareProvider {
    outputs: Mutex<Option<Vec<LiveOutput>>>,
}

impl StaticHardwareProvider {
    pub fn new(outputs: Vec<LiveOutput>) -> Self {
        Self {
            outputs: Mutex::new(Some(outputs)),
        }
    }

    /// A provider that always fails with "no hardware state source".
    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// Replaces the served list, e.g. to simulate a hot-plug.
    pub fn set(&self, outputs: Vec<LiveOutput>) {
        if let Ok(mut guard) = self.outputs.lock() {
            *guard = Some(outputs);
        }
    }
}

#[async_trait]
impl HardwareStateProvider for StaticHardwareProvider {
    async fn current_state(&self) -> Result<Vec<LiveOutput>, HardwareError> {
        let guard = self
            .outputs
            .lock()
            .map_err(|_| HardwareError("state lock poisoned".to_string()))?;
        guard
            .clone()
            .ok_or_else(|| HardwareError("no hardware state source configured".to_string()))
    }
}

// ── Executors ─────────────────────────────────────────────────────────────────

/// Where [`PlanFileExecutor`] writes the plan.
///
/// Stdout is reserved for command results, so the fallback is stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanTarget {
    Stderr,
    File(PathBuf),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanDocument<'a> {
    mutations: &'a [OutputMutation],
}

/// Hands the plan to an external mode-setting tool by writing it as JSON.
#[derive(Debug, Clone)]
pub struct PlanFileExecutor {
    target: PlanTarget,
}

impl PlanFileExecutor {
    pub fn new(target: PlanTarget) -> Self {
        Self { target }
    }
}

#[async_trait]
impl ApplyExecutor for PlanFileExecutor {
    async fn execute(&self, mutations: &[OutputMutation]) -> Result<(), String> {
        let text = serde_json::to_string_pretty(&PlanDocument { mutations })
            .map_err(|e| format!("failed to encode plan: {e}"))?;

        match &self.target {
            PlanTarget::Stderr => {
                let mut out = std::io::stderr().lock();
                writeln!(out, "{text}").map_err(|e| format!("failed to write plan: {e}"))
            }
            PlanTarget::File(path) => tokio::fs::write(path, text)
                .await
                .map_err(|e| format!("failed to write plan to {}: {e}", path.display())),
        }
    }
}

/// Records every plan it receives; optionally rejects them all.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    plans: Mutex<Vec<Vec<OutputMutation>>>,
    reject_with: Option<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// An executor that rejects every transaction with `reason`.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            plans: Mutex::new(Vec::new()),
            reject_with: Some(reason.into()),
        }
    }

    /// Plans received so far, in order.
    pub fn plans(&self) -> Vec<Vec<OutputMutation>> {
        self.plans.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ApplyExecutor for RecordingExecutor {
    async fn execute(&self, mutations: &[OutputMutation]) -> Result<(), String> {
        if let Ok(mut plans) = self.plans.lock() {
            plans.push(mutations.to_vec());
        }
        match &self.reject_with {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }
}
