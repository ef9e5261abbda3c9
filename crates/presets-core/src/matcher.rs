//! Live-state matcher.
//!
//! Two verdicts are computed for a snapshot against the outputs the hardware
//! reports right now:
//!
//! - **available**: every output the snapshot wants lit is plugged in, so the
//!   snapshot *could* be applied.
//! - **current**: the hardware already looks like the snapshot, within a small
//!   tolerance for the continuous quantities (refresh rate and scale).
//!
//! # Matching by name
//!
//! Outputs are paired by connector name (`"eDP-1"`, `"HDMI-1"`), not by the
//! EDID-derived identifier.  Identifier hashes can change when a driver
//! reprobes a monitor while the connector name stays put.  The flip side is a
//! known limitation: if a monitor moves to another connector, a snapshot that
//! names the old connector reports it as missing.
//!
//! # Never failing
//!
//! Neither verdict returns an error.  With no live state (`None`) or with
//! inconsistent input, both answer `false`.  [`check_current`] exposes *why* a
//! snapshot is not current, which the host logs at debug level.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::debug;

use crate::domain::output::{Flip, LiveOutput, OutputSpec, Position, Rotation};
use crate::domain::snapshot::Snapshot;

/// Largest refresh-rate difference, in Hz, still considered equal.
pub const REFRESH_TOLERANCE_HZ: f64 = 0.1;

/// Largest scale-factor difference still considered equal.
pub const SCALE_TOLERANCE: f64 = 0.01;

/// The first reason a snapshot is not current.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Mismatch {
    #[error("no live hardware state has been observed yet")]
    NoLiveState,

    #[error("{output}: enabled on the hardware but not part of the preset")]
    UnexpectedEnabledOutput { output: String },

    #[error("{output}: enabled is {live} on the hardware, {stored} in the preset")]
    Enabled { output: String, live: bool, stored: bool },

    #[error("{output}: priority is {live} on the hardware, {stored} in the preset")]
    Priority { output: String, live: u32, stored: u32 },

    #[error("{output}: position is {live:?} on the hardware, {stored:?} in the preset")]
    Position { output: String, live: Position, stored: Position },

    #[error("{output}: enabled on the hardware without a current mode")]
    MissingLiveMode { output: String },

    #[error("{output}: enabled in the preset without a mode")]
    MissingStoredMode { output: String },

    #[error("{output}: mode size is {live:?} on the hardware, {stored:?} in the preset")]
    ModeSize { output: String, live: (u32, u32), stored: (u32, u32) },

    #[error("{output}: refresh rate is {live} Hz on the hardware, {stored} Hz in the preset")]
    RefreshRate { output: String, live: f64, stored: f64 },

    #[error("{output}: scale is {live} on the hardware, {stored} in the preset")]
    Scale { output: String, live: f64, stored: f64 },

    #[error("{output}: transform is {live:?} on the hardware, {stored:?} in the preset")]
    Transform {
        output: String,
        live: (Rotation, Flip),
        stored: (Rotation, Flip),
    },

    #[error("{output}: required by the preset but not connected and enabled")]
    MissingOutput { output: String },
}

/// Returns `true` if every enabled output of `snapshot` is connected.
///
/// Disabled outputs in the snapshot impose no requirement, and live outputs
/// the snapshot does not mention are ignored.
pub fn is_available(snapshot: &Snapshot, live: Option<&[LiveOutput]>) -> bool {
    let Some(live) = live else {
        return false;
    };

    let connected: HashSet<&str> = live
        .iter()
        .filter(|o| o.connected)
        .map(|o| o.name.as_str())
        .collect();

    match snapshot
        .enabled_outputs()
        .find(|spec| !connected.contains(spec.name.as_str()))
    {
        Some(missing) => {
            debug!(
                preset = snapshot.name(),
                output = %missing.name,
                "preset unavailable: required output not connected"
            );
            false
        }
        None => true,
    }
}

/// Returns `true` if the live state matches `snapshot` in both directions.
pub fn is_current(snapshot: &Snapshot, live: Option<&[LiveOutput]>) -> bool {
    match check_current(snapshot, live) {
        Ok(()) => true,
        Err(mismatch) => {
            debug!(preset = snapshot.name(), %mismatch, "preset is not current");
            false
        }
    }
}

/// Like [`is_current`], but reports the first mismatch found.
///
/// The forward pass walks the connected live outputs and compares each one
/// with the same-named spec.  The reverse pass makes sure every enabled spec
/// has a connected, enabled live counterpart.
pub fn check_current(snapshot: &Snapshot, live: Option<&[LiveOutput]>) -> Result<(), Mismatch> {
    let live = live.ok_or(Mismatch::NoLiveState)?;

    // Duplicate names in a malformed snapshot: the first spec wins.
    let mut specs: HashMap<&str, &OutputSpec> = HashMap::with_capacity(snapshot.outputs().len());
    for spec in snapshot.outputs() {
        specs.entry(spec.name.as_str()).or_insert(spec);
    }

    for output in live.iter().filter(|o| o.connected) {
        match specs.get(output.name.as_str()) {
            None if output.enabled => {
                return Err(Mismatch::UnexpectedEnabledOutput {
                    output: output.name.clone(),
                });
            }
            None => {}
            Some(spec) => compare_output(spec, output)?,
        }
    }

    let lit: HashSet<&str> = live
        .iter()
        .filter(|o| o.is_active())
        .map(|o| o.name.as_str())
        .collect();
    if let Some(missing) = snapshot
        .enabled_outputs()
        .find(|spec| !lit.contains(spec.name.as_str()))
    {
        return Err(Mismatch::MissingOutput {
            output: missing.name.clone(),
        });
    }

    Ok(())
}

fn compare_output(spec: &OutputSpec, live: &LiveOutput) -> Result<(), Mismatch> {
    let output = || live.name.clone();

    if spec.enabled != live.enabled {
        return Err(Mismatch::Enabled {
            output: output(),
            live: live.enabled,
            stored: spec.enabled,
        });
    }
    if !spec.enabled {
        return Ok(());
    }

    if spec.priority != live.priority {
        return Err(Mismatch::Priority {
            output: output(),
            live: live.priority,
            stored: spec.priority,
        });
    }
    if spec.position != live.position {
        return Err(Mismatch::Position {
            output: output(),
            live: live.position,
            stored: spec.position,
        });
    }

    let live_mode = live
        .current_mode
        .as_ref()
        .ok_or_else(|| Mismatch::MissingLiveMode { output: output() })?;
    let stored_mode = spec
        .mode
        .as_ref()
        .ok_or_else(|| Mismatch::MissingStoredMode { output: output() })?;

    if !live_mode.same_size(stored_mode) {
        return Err(Mismatch::ModeSize {
            output: output(),
            live: (live_mode.width, live_mode.height),
            stored: (stored_mode.width, stored_mode.height),
        });
    }
    if (live_mode.refresh_rate - stored_mode.refresh_rate).abs() > REFRESH_TOLERANCE_HZ {
        return Err(Mismatch::RefreshRate {
            output: output(),
            live: live_mode.refresh_rate,
            stored: stored_mode.refresh_rate,
        });
    }
    if (live.scale - spec.scale).abs() > SCALE_TOLERANCE {
        return Err(Mismatch::Scale {
            output: output(),
            live: live.scale,
            stored: spec.scale,
        });
    }
    if (live.rotation, live.flip) != (spec.rotation, spec.flip) {
        return Err(Mismatch::Transform {
            output: output(),
            live: (live.rotation, live.flip),
            stored: (spec.rotation, spec.flip),
        });
    }

    Ok(())
}
