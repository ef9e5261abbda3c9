//! ApplyPresetUseCase: turns a stored preset into a hardware transaction.
//!
//! ```text
//! lookup ─▶ fresh hardware state ─▶ availability gate ─▶ plan ─▶ execute ─▶ mark applied
//! ```
//!
//! The hardware state is always re-read right before planning so the plan is
//! built against what is plugged in *now*.  The executor commits the whole
//! mutation list as one transaction; if it refuses, nothing counts as applied
//! and the last-applied timestamp is left alone.
//!
//! # Architecture
//!
//! This use case depends only on the [`HardwareStateProvider`] and
//! [`ApplyExecutor`] traits.  Infrastructure implementations are injected at
//! construction time, making the use case fully unit-testable.

use std::sync::Arc;

use async_trait::async_trait;
use presets_core::{is_available, plan, LiveOutput, OutputMutation, PartialApply, PresetId};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::preset_service::{PresetEvent, PresetService};

/// The hardware state could not be read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("hardware state unavailable: {0}")]
pub struct HardwareError(pub String);

/// Supplies the outputs currently reported by the hardware.
///
/// Reading may involve I/O, so the call is asynchronous.
#[async_trait]
pub trait HardwareStateProvider: Send + Sync {
    async fn current_state(&self) -> Result<Vec<LiveOutput>, HardwareError>;
}

/// Commits an ordered list of output mutations as one transaction.
///
/// Returns `Err(reason)` when the whole transaction was rejected.
#[async_trait]
pub trait ApplyExecutor: Send + Sync {
    async fn execute(&self, mutations: &[OutputMutation]) -> Result<(), String>;
}

/// Error type for the apply use case.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplyError {
    #[error("preset not found: {0}")]
    NotFound(PresetId),

    #[error(transparent)]
    Hardware(#[from] HardwareError),

    /// An output the preset needs is not connected.
    #[error("preset {0} is not available with the connected outputs")]
    Unavailable(PresetId),

    /// The executor rejected the plan; nothing was applied.
    #[error("apply transaction failed: {0}")]
    TransactionFailed(String),
}

/// Summary of a successful apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub id: PresetId,
    pub mutations: usize,
    pub warnings: Vec<PartialApply>,
}

/// The Apply Preset use case.
pub struct ApplyPresetUseCase {
    hardware: Arc<dyn HardwareStateProvider>,
    executor: Arc<dyn ApplyExecutor>,
}

impl ApplyPresetUseCase {
    pub fn new(hardware: Arc<dyn HardwareStateProvider>, executor: Arc<dyn ApplyExecutor>) -> Self {
        Self { hardware, executor }
    }

    /// Applies preset `id`.
    ///
    /// Every failure is also emitted as [`PresetEvent::ApplyFailed`] so
    /// subscribers that did not issue the request still hear about it.
    ///
    /// # Errors
    ///
    /// See [`ApplyError`].
    pub async fn execute(
        &self,
        service: &mut PresetService,
        id: PresetId,
    ) -> Result<ApplyReport, ApplyError> {
        let result = self.run(service, id).await;
        if let Err(e) = &result {
            warn!(preset = %id, "apply failed: {e}");
            service.emit(PresetEvent::ApplyFailed {
                id,
                reason: e.to_string(),
            });
        }
        result
    }

    async fn run(&self, service: &mut PresetService, id: PresetId) -> Result<ApplyReport, ApplyError> {
        if service.snapshot(id).is_none() {
            return Err(ApplyError::NotFound(id));
        }

        let live = self.hardware.current_state().await?;
        service.update_live_state(live);

        let snapshot = service.snapshot(id).ok_or(ApplyError::NotFound(id))?;
        if !is_available(snapshot, service.live_state()) {
            return Err(ApplyError::Unavailable(id));
        }

        let planned = plan(snapshot, service.live_state().unwrap_or_default());
        let name = snapshot.name().to_string();

        for warning in &planned.warnings {
            warn!(preset = %name, "partial apply: {warning}");
            service.emit(PresetEvent::PartialApply {
                id,
                warning: warning.clone(),
            });
        }

        self.executor
            .execute(&planned.mutations)
            .await
            .map_err(ApplyError::TransactionFailed)?;

        service
            .mark_applied(id)
            .map_err(|_| ApplyError::NotFound(id))?;
        service.emit(PresetEvent::PresetApplied(id));
        info!(preset = %name, mutations = planned.mutations.len(), "preset applied");

        Ok(ApplyReport {
            id,
            mutations: planned.mutations.len(),
            warnings: planned.warnings,
        })
    }
}
