//! Command bridge: exposes application-layer operations to front ends.
//!
//! Every command is an `async fn` taking the shared [`AppState`] and returning
//! a [`CommandResult`].  The CLI dispatches through these functions, and any
//! other front end (an IPC service, a settings panel) can do the same without
//! touching the application layer directly.
//!
//! # Data Transfer Objects (DTOs)
//!
//! Identifiers travel as strings and timestamps as RFC 3339 text.  DTOs such
//! as [`PresetDto`] contain only JSON-friendly fields, so front ends never see
//! internal types.
//!
//! # `CommandResult<T>` wrapper
//!
//! All commands return `CommandResult<T>` rather than `Result<T, E>`, so every
//! response has the same shape:
//! `{ success: bool, data: T | null, error: string | null }`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use presets_core::{OutputSpec, PresetId, SaveOutcome, Shortcut};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::application::apply_preset::{
    ApplyExecutor, ApplyPresetUseCase, ApplyReport, HardwareStateProvider,
};
use crate::application::preset_service::PresetService;
use crate::application::publish_changes::PresetRecord;

// ── Shared application state ──────────────────────────────────────────────────

/// State shared between command invocations.
///
/// The service sits behind an async Tokio mutex: commands run in an async
/// context, and an apply holds the lock across the executor call so no other
/// mutation can interleave with it.
pub struct AppState {
    pub service: Mutex<PresetService>,
    pub hardware: Arc<dyn HardwareStateProvider>,
    apply: ApplyPresetUseCase,
}

impl AppState {
    pub fn new(
        service: PresetService,
        hardware: Arc<dyn HardwareStateProvider>,
        executor: Arc<dyn ApplyExecutor>,
    ) -> Arc<Self> {
        Arc::new(Self {
            service: Mutex::new(service),
            apply: ApplyPresetUseCase::new(Arc::clone(&hardware), executor),
            hardware,
        })
    }
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// One preset as returned to front ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetDto {
    pub id: String,
    pub name: String,
    pub description: String,
    pub shortcut: String,
    /// `false` when the shortcut is set but another preset holds the combo.
    pub shortcut_registered: bool,
    pub created: Option<DateTime<Utc>>,
    pub last_applied: Option<DateTime<Utc>>,
    pub output_count: usize,
    pub available: bool,
    pub current: bool,
}

impl PresetDto {
    fn from_record(record: PresetRecord, shortcut_registered: bool) -> Self {
        Self {
            id: record.id.to_string(),
            name: record.name,
            description: record.description,
            shortcut: record.shortcut,
            shortcut_registered,
            created: record.created,
            last_applied: record.last_applied,
            output_count: record.output_count,
            available: record.available,
            current: record.current,
        }
    }
}

/// A preset together with its stored outputs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetDetailDto {
    #[serde(flatten)]
    pub preset: PresetDto,
    pub outputs: Vec<OutputSpec>,
    pub output_ids: Vec<String>,
}

/// Result of a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResultDto {
    pub id: String,
    /// `true` when an existing preset with the same name was overwritten.
    pub replaced: bool,
}

/// Unified response wrapper used by all commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

fn parse_id(id: &str) -> Result<PresetId, String> {
    id.trim()
        .parse::<PresetId>()
        .map_err(|e| format!("invalid preset id {id:?}: {e}"))
}

macro_rules! try_cmd {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => return CommandResult::err(e.to_string()),
        }
    };
}

// ── Queries ───────────────────────────────────────────────────────────────────

/// Returns every preset with live availability and currency.
pub async fn list_presets(state: Arc<AppState>) -> CommandResult<Vec<PresetDto>> {
    let service = state.service.lock().await;
    let dtos = service
        .presets()
        .into_iter()
        .map(|r| {
            let bound = service.shortcut_bound(r.id);
            PresetDto::from_record(r, bound)
        })
        .collect();
    CommandResult::ok(dtos)
}

/// Returns one preset including its stored outputs.
pub async fn get_preset(state: Arc<AppState>, id: String) -> CommandResult<PresetDetailDto> {
    let id = try_cmd!(parse_id(&id));
    let service = state.service.lock().await;
    let (Some(record), Some(snapshot)) = (service.preset(id), service.snapshot(id)) else {
        return CommandResult::err(format!("preset not found: {id}"));
    };
    CommandResult::ok(PresetDetailDto {
        preset: PresetDto::from_record(record, service.shortcut_bound(id)),
        outputs: snapshot.outputs().to_vec(),
        output_ids: snapshot.output_ids().to_vec(),
    })
}

pub async fn preset_exists(state: Arc<AppState>, name: String) -> CommandResult<bool> {
    let service = state.service.lock().await;
    CommandResult::ok(service.preset_exists(&name))
}

// ── Mutations ─────────────────────────────────────────────────────────────────

/// Captures the current hardware state under `name`.
pub async fn save_preset(
    state: Arc<AppState>,
    name: String,
    description: String,
) -> CommandResult<SaveResultDto> {
    let outputs = try_cmd!(state.hardware.current_state().await);
    let mut service = state.service.lock().await;
    service.update_live_state(outputs.clone());
    let outcome = try_cmd!(service.save(&name, &description, &outputs));
    CommandResult::ok(SaveResultDto {
        id: outcome.id().to_string(),
        replaced: matches!(outcome, SaveOutcome::Replaced(_)),
    })
}

pub async fn delete_preset(state: Arc<AppState>, id: String) -> CommandResult<()> {
    let id = try_cmd!(parse_id(&id));
    let mut service = state.service.lock().await;
    try_cmd!(service.delete(id));
    CommandResult::ok(())
}

pub async fn rename_preset(state: Arc<AppState>, id: String, name: String) -> CommandResult<()> {
    let id = try_cmd!(parse_id(&id));
    let mut service = state.service.lock().await;
    try_cmd!(service.rename(id, &name));
    CommandResult::ok(())
}

pub async fn set_description(
    state: Arc<AppState>,
    id: String,
    description: String,
) -> CommandResult<()> {
    let id = try_cmd!(parse_id(&id));
    let mut service = state.service.lock().await;
    try_cmd!(service.set_description(id, &description));
    CommandResult::ok(())
}

/// Sets the preset's shortcut; `None` or an empty string clears it.
pub async fn set_shortcut(
    state: Arc<AppState>,
    id: String,
    combo: Option<String>,
) -> CommandResult<PresetDto> {
    let id = try_cmd!(parse_id(&id));
    let shortcut = match combo.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(text) => Some(try_cmd!(Shortcut::parse(text))),
    };

    let mut service = state.service.lock().await;
    try_cmd!(service.set_shortcut(id, shortcut.clone()));
    let bound = service.shortcut_bound(id);
    if shortcut.is_some() && !bound {
        warn!(preset = %id, "shortcut stored but not registered");
    }
    match service.preset(id) {
        Some(record) => CommandResult::ok(PresetDto::from_record(record, bound)),
        None => CommandResult::err(format!("preset not found: {id}")),
    }
}

// ── Apply ─────────────────────────────────────────────────────────────────────

pub async fn apply_preset(state: Arc<AppState>, id: String) -> CommandResult<ApplyReport> {
    let id = try_cmd!(parse_id(&id));
    let mut service = state.service.lock().await;
    let report = try_cmd!(state.apply.execute(&mut service, id).await);
    CommandResult::ok(report)
}

// ── Host notifications ────────────────────────────────────────────────────────

/// Re-reads the presets file.  Returns the number of presets loaded.
pub async fn reload_presets(state: Arc<AppState>) -> CommandResult<usize> {
    let mut service = state.service.lock().await;
    try_cmd!(service.reload());
    CommandResult::ok(service.store().len())
}

/// Re-reads the hardware state.  Returns the number of outputs seen.
pub async fn refresh_live_state(state: Arc<AppState>) -> CommandResult<usize> {
    match state.hardware.current_state().await {
        Ok(outputs) => {
            let count = outputs.len();
            state.service.lock().await.update_live_state(outputs);
            CommandResult::ok(count)
        }
        Err(e) => {
            error!("failed to read hardware state: {e}");
            CommandResult::err(e.to_string())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::preset_service::MockPresetRepository;
    use crate::infrastructure::hardware::{RecordingExecutor, StaticHardwareProvider};
    use crate::infrastructure::shortcuts::InMemoryShortcutRegistry;
    use presets_core::{LiveOutput, Mode};

    fn panel() -> LiveOutput {
        let mode = Mode::new("m", 1920, 1080, 60.0);
        LiveOutput {
            id: "edid".to_string(),
            name: "eDP-1".to_string(),
            connected: true,
            enabled: true,
            current_mode: Some(mode.clone()),
            modes: vec![mode],
            ..LiveOutput::default()
        }
    }

    /// Test-isolated state: nothing touches the real presets file.
    fn make_state(hardware: StaticHardwareProvider) -> Arc<AppState> {
        let mut repository = MockPresetRepository::new();
        repository.expect_load().returning(|| Ok(Vec::new()));
        repository.expect_save().returning(|_| Ok(()));
        let (service, _rx) = PresetService::new(
            Box::new(repository),
            Box::new(InMemoryShortcutRegistry::new()),
        );
        AppState::new(
            service,
            Arc::new(hardware),
            Arc::new(RecordingExecutor::new()),
        )
    }

    #[tokio::test]
    async fn test_list_presets_returns_empty_list_initially() {
        let state = make_state(StaticHardwareProvider::new(vec![panel()]));

        let result = list_presets(state).await;

        assert!(result.success);
        assert_eq!(result.data.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_save_then_get_returns_outputs() {
        // Arrange
        let state = make_state(StaticHardwareProvider::new(vec![panel()]));

        // Act
        let saved = save_preset(Arc::clone(&state), "Laptop".into(), "".into()).await;
        let id = saved.data.unwrap().id;
        let detail = get_preset(state, id.clone()).await;

        // Assert
        assert!(detail.success, "error: {:?}", detail.error);
        let detail = detail.data.unwrap();
        assert_eq!(detail.preset.id, id);
        assert!(detail.preset.available);
        assert!(detail.preset.current);
        assert_eq!(detail.outputs.len(), 1);
    }

    #[tokio::test]
    async fn test_save_without_hardware_source_fails() {
        let state = make_state(StaticHardwareProvider::unconfigured());

        let result = save_preset(state, "Laptop".into(), "".into()).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("no hardware state source"));
    }

    #[tokio::test]
    async fn test_save_same_name_reports_replaced() {
        let state = make_state(StaticHardwareProvider::new(vec![panel()]));
        let first = save_preset(Arc::clone(&state), "Work".into(), "".into()).await;
        let second = save_preset(state, "Work".into(), "again".into()).await;

        let (first, second) = (first.data.unwrap(), second.data.unwrap());
        assert!(!first.replaced);
        assert!(second.replaced);
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_commands_reject_invalid_uuid() {
        let state = make_state(StaticHardwareProvider::new(vec![]));

        let result = delete_preset(state, "not-a-uuid".into()).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("invalid preset id"));
    }

    #[tokio::test]
    async fn test_set_shortcut_conflict_is_stored_but_unregistered() {
        let state = make_state(StaticHardwareProvider::new(vec![panel()]));
        let a = save_preset(Arc::clone(&state), "A".into(), "".into()).await.data.unwrap().id;
        let b = save_preset(Arc::clone(&state), "B".into(), "".into()).await.data.unwrap().id;

        let first = set_shortcut(Arc::clone(&state), a, Some("meta+1".into())).await;
        let second = set_shortcut(state, b, Some("Meta+1".into())).await;

        let (first, second) = (first.data.unwrap(), second.data.unwrap());
        assert!(first.shortcut_registered);
        assert_eq!(second.shortcut, "Meta+1");
        assert!(!second.shortcut_registered);
    }

    #[tokio::test]
    async fn test_set_shortcut_rejects_malformed_combo() {
        let state = make_state(StaticHardwareProvider::new(vec![panel()]));
        let id = save_preset(Arc::clone(&state), "A".into(), "".into()).await.data.unwrap().id;

        let result = set_shortcut(state, id, Some("Ctrl+Alt".into())).await;

        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_apply_preset_returns_report() {
        let state = make_state(StaticHardwareProvider::new(vec![panel()]));
        let id = save_preset(Arc::clone(&state), "A".into(), "".into()).await.data.unwrap().id;

        let result = apply_preset(Arc::clone(&state), id.clone()).await;

        assert!(result.success, "error: {:?}", result.error);
        assert_eq!(result.data.unwrap().mutations, 1);
        let listed = list_presets(state).await.data.unwrap();
        assert!(listed[0].last_applied.is_some());
    }

    #[tokio::test]
    async fn test_refresh_live_state_counts_outputs() {
        let state = make_state(StaticHardwareProvider::new(vec![panel(), panel()]));
        let result = refresh_live_state(state).await;
        assert_eq!(result.data, Some(2));
    }

    #[test]
    fn test_command_result_ok_sets_success_true() {
        let r: CommandResult<i32> = CommandResult::ok(42);
        assert!(r.success);
        assert_eq!(r.data.unwrap(), 42);
        assert!(r.error.is_none());
    }

    #[test]
    fn test_command_result_err_sets_success_false() {
        let r: CommandResult<i32> = CommandResult::err("something went wrong");
        assert!(!r.success);
        assert!(r.data.is_none());
        assert_eq!(r.error.unwrap(), "something went wrong");
    }
}
