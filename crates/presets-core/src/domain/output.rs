//! Output descriptions.
//!
//! Two shapes describe a display output:
//!
//! - [`OutputSpec`] is the *declared* state stored inside a snapshot.
//! - [`LiveOutput`] is the *observed* state reported by the hardware
//!   configuration library at one instant.  It is supplied fresh on every
//!   evaluation and never cached inside this crate.
//!
//! Both share the geometric vocabulary defined here: [`Position`], [`Mode`],
//! [`Rotation`] and [`Flip`].

use serde::{Deserialize, Serialize};

/// Top-left corner of an output in the global compositor coordinate space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A display mode: pixel size plus refresh rate.
///
/// `id` is the hardware library's identifier for the mode.  It is what the
/// planner looks up among a live output's supported modes; the matcher only
/// compares the size and refresh rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mode {
    pub id: String,
    pub width: u32,
    pub height: u32,
    /// Refresh rate in Hz.
    pub refresh_rate: f64,
}

impl Mode {
    pub fn new(id: impl Into<String>, width: u32, height: u32, refresh_rate: f64) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            refresh_rate,
        }
    }

    /// Returns `true` if both modes have exactly the same pixel size.
    pub fn same_size(&self, other: &Mode) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// Output rotation, clockwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    /// No rotation.
    #[default]
    None,
    /// Rotated 90°.
    Left,
    /// Rotated 180°.
    Inverted,
    /// Rotated 270°.
    Right,
}

/// Mirroring applied on top of the rotation.
///
/// Hardware that cannot flip always reports both flags as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flip {
    #[serde(default)]
    pub horizontal: bool,
    #[serde(default)]
    pub vertical: bool,
}

/// Variable refresh rate policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VrrPolicy {
    Never,
    Always,
    #[default]
    Automatic,
}

/// RGB quantisation range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RgbRange {
    #[default]
    Automatic,
    Full,
    Limited,
}

/// Secondary output settings.
///
/// Captured with a snapshot and persisted with it, but never compared for
/// currency and never emitted by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputAttributes {
    pub overscan: u32,
    pub vrr_policy: VrrPolicy,
    pub rgb_range: RgbRange,
    pub hdr: bool,
    pub sdr_brightness: u32,
    pub wide_color_gamut: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icc_profile_path: String,
    /// Backlight / DDC brightness in `0.0..=1.0`.
    pub brightness: f64,
    pub auto_rotate: bool,
    /// Explicit logical size in compositor units, when the output has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_size: Option<(f64, f64)>,
}

impl Default for OutputAttributes {
    fn default() -> Self {
        Self {
            overscan: 0,
            vrr_policy: VrrPolicy::default(),
            rgb_range: RgbRange::default(),
            hdr: false,
            sdr_brightness: 200,
            wide_color_gamut: false,
            icc_profile_path: String::new(),
            brightness: 1.0,
            auto_rotate: false,
            logical_size: None,
        }
    }
}

/// One output as declared inside a snapshot.
///
/// Invariant: an enabled `OutputSpec` always has a `mode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSpec {
    /// Stable hash of the physical identity (EDID), not the connector name.
    pub id: String,
    /// Connector name, e.g. `"eDP-1"`.  Matching against live outputs uses this.
    pub name: String,
    /// Human label such as `"Dell U2720Q"`; presentation only.
    #[serde(default)]
    pub display_name: String,
    pub enabled: bool,
    #[serde(rename = "pos")]
    pub position: Position,
    pub scale: f64,
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default)]
    pub flip: Flip,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    /// Ordering rank among enabled outputs (1 = highest).
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub attributes: OutputAttributes,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            display_name: String::new(),
            enabled: false,
            position: Position::default(),
            scale: 1.0,
            rotation: Rotation::None,
            flip: Flip::default(),
            mode: None,
            priority: 0,
            primary: false,
            attributes: OutputAttributes::default(),
        }
    }
}

/// One output as currently observed on the hardware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveOutput {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    pub connected: bool,
    pub enabled: bool,
    #[serde(rename = "pos")]
    pub position: Position,
    pub scale: f64,
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default)]
    pub flip: Flip,
    /// `None` when the output reports no active mode.
    #[serde(default)]
    pub current_mode: Option<Mode>,
    /// Every mode the output advertises.
    #[serde(default)]
    pub modes: Vec<Mode>,
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub attributes: OutputAttributes,
}

impl LiveOutput {
    /// Returns `true` if the output is both plugged in and lit.
    pub fn is_active(&self) -> bool {
        self.connected && self.enabled
    }

    /// Returns `true` if `mode_id` is among the modes this output advertises.
    pub fn supports_mode(&self, mode_id: &str) -> bool {
        self.modes.iter().any(|m| m.id == mode_id)
    }
}

impl Default for LiveOutput {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            display_name: String::new(),
            connected: false,
            enabled: false,
            position: Position::default(),
            scale: 1.0,
            rotation: Rotation::None,
            flip: Flip::default(),
            current_mode: None,
            modes: Vec::new(),
            priority: 0,
            primary: false,
            attributes: OutputAttributes::default(),
        }
    }
}
