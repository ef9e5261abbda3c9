//! Apply planner: snapshot + live state → ordered per-output mutations.
//!
//! The plan is handed to an external executor that commits it as one atomic
//! hardware transaction.  Planning itself never fails; anything that cannot be
//! honoured exactly (a stored mode the output no longer offers) is reported as
//! a [`PartialApply`] warning while the rest of the plan proceeds.
//!
//! Live outputs the snapshot does not mention get no mutation at all.
//! Applying a preset never switches off a screen the preset does not know.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::output::{Flip, LiveOutput, Position, Rotation};
use crate::domain::snapshot::Snapshot;

/// Settings applied to an output that the plan enables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSettings {
    pub position: Position,
    /// `None` leaves the current mode unchanged.
    pub mode_id: Option<String>,
    pub rotation: Rotation,
    pub flip: Flip,
    pub scale: f64,
    pub primary: bool,
}

/// One instruction for the apply executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputMutation {
    /// Connector name the mutation targets.
    pub output_name: String,
    /// Identifier of the live output matched by name.
    pub output_id: String,
    pub enabled: bool,
    /// Present only when `enabled` is `true`.
    pub settings: Option<OutputSettings>,
}

/// Why a mutation could not fully reproduce the stored output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "reason")]
pub enum PartialApply {
    /// The stored mode id is not among the live output's supported modes.
    ModeUnavailable { output: String, mode_id: String },
    /// The stored output is enabled but carries no mode.
    NoStoredMode { output: String },
}

impl std::fmt::Display for PartialApply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartialApply::ModeUnavailable { output, mode_id } => {
                write!(f, "{output}: mode {mode_id} is no longer supported, keeping current mode")
            }
            PartialApply::NoStoredMode { output } => {
                write!(f, "{output}: preset has no mode for this output, keeping current mode")
            }
        }
    }
}

/// Result of [`plan`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyPlan {
    /// In the snapshot's output order.
    pub mutations: Vec<OutputMutation>,
    pub warnings: Vec<PartialApply>,
}

impl ApplyPlan {
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Builds the mutation list that turns `live` into `snapshot`.
pub fn plan(snapshot: &Snapshot, live: &[LiveOutput]) -> ApplyPlan {
    let mut by_name: HashMap<&str, &LiveOutput> = HashMap::with_capacity(live.len());
    for output in live {
        by_name.entry(output.name.as_str()).or_insert(output);
    }

    let mut result = ApplyPlan::default();

    for spec in snapshot.outputs() {
        let Some(target) = by_name.get(spec.name.as_str()) else {
            debug!(output = %spec.name, "output not present, skipping");
            continue;
        };

        let settings = spec.enabled.then(|| {
            let mode_id = match &spec.mode {
                Some(mode) if target.supports_mode(&mode.id) => Some(mode.id.clone()),
                Some(mode) => {
                    result.warnings.push(PartialApply::ModeUnavailable {
                        output: spec.name.clone(),
                        mode_id: mode.id.clone(),
                    });
                    None
                }
                None => {
                    result.warnings.push(PartialApply::NoStoredMode {
                        output: spec.name.clone(),
                    });
                    None
                }
            };
            OutputSettings {
                position: spec.position,
                mode_id,
                rotation: spec.rotation,
                flip: spec.flip,
                scale: spec.scale,
                primary: spec.primary,
            }
        });

        result.mutations.push(OutputMutation {
            output_name: spec.name.clone(),
            output_id: target.id.clone(),
            enabled: spec.enabled,
            settings,
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::output::{Mode, OutputSpec};
    use chrono::Utc;

    fn spec(name: &str, enabled: bool, mode_id: &str) -> OutputSpec {
        OutputSpec {
            id: format!("id-{name}"),
            name: name.to_string(),
            enabled,
            position: Position::new(1920, 0),
            scale: 1.5,
            rotation: Rotation::Right,
            primary: true,
            mode: enabled.then(|| Mode::new(mode_id, 1920, 1080, 60.0)),
            ..OutputSpec::default()
        }
    }

    fn live(name: &str, modes: &[&str]) -> LiveOutput {
        LiveOutput {
            id: format!("live-{name}"),
            name: name.to_string(),
            connected: true,
            enabled: true,
            modes: modes
                .iter()
                .map(|id| Mode::new(*id, 1920, 1080, 60.0))
                .collect(),
            ..LiveOutput::default()
        }
    }

    fn snapshot(outputs: Vec<OutputSpec>) -> Snapshot {
        Snapshot::from_outputs("plan", "", outputs, Utc::now()).unwrap()
    }

    #[test]
    fn test_plan_enabled_output_carries_full_settings() {
        let snap = snapshot(vec![spec("DP-1", true, "m1")]);

        let result = plan(&snap, &[live("DP-1", &["m1", "m2"])]);

        assert!(!result.is_partial());
        let mutation = &result.mutations[0];
        assert_eq!(mutation.output_id, "live-DP-1");
        assert!(mutation.enabled);
        let settings = mutation.settings.as_ref().unwrap();
        assert_eq!(settings.mode_id.as_deref(), Some("m1"));
        assert_eq!(settings.position, Position::new(1920, 0));
        assert_eq!(settings.rotation, Rotation::Right);
        assert!(settings.primary);
    }

    #[test]
    fn test_plan_disabled_output_has_no_settings() {
        let snap = snapshot(vec![spec("HDMI-1", false, "")]);

        let result = plan(&snap, &[live("HDMI-1", &[])]);

        assert_eq!(result.mutations.len(), 1);
        assert!(!result.mutations[0].enabled);
        assert!(result.mutations[0].settings.is_none());
    }

    #[test]
    fn test_plan_unsupported_mode_leaves_mode_and_warns() {
        let snap = snapshot(vec![spec("DP-1", true, "gone")]);

        let result = plan(&snap, &[live("DP-1", &["m1"])]);

        assert!(result.mutations[0].settings.as_ref().unwrap().mode_id.is_none());
        assert_eq!(
            result.warnings,
            vec![PartialApply::ModeUnavailable {
                output: "DP-1".to_string(),
                mode_id: "gone".to_string()
            }]
        );
    }

    #[test]
    fn test_plan_leaves_unmentioned_live_outputs_alone() {
        let snap = snapshot(vec![spec("DP-1", true, "m1")]);

        let result = plan(&snap, &[live("DP-1", &["m1"]), live("HDMI-1", &["m1"])]);

        assert_eq!(result.mutations.len(), 1);
        assert!(result.mutations.iter().all(|m| m.output_name != "HDMI-1"));
    }

    #[test]
    fn test_plan_skips_snapshot_outputs_not_present() {
        let snap = snapshot(vec![spec("DP-1", true, "m1"), spec("DP-2", false, "")]);

        let result = plan(&snap, &[live("DP-1", &["m1"])]);

        assert_eq!(result.mutations.len(), 1);
    }

    #[test]
    fn test_plan_follows_snapshot_order() {
        let snap = snapshot(vec![spec("B", true, "m"), spec("A", true, "m")]);

        let result = plan(&snap, &[live("A", &["m"]), live("B", &["m"])]);

        let names: Vec<_> = result.mutations.iter().map(|m| m.output_name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }
}
