//! Built-in rotations and sequences used when configuration leaves them out.
//!
//! `Meta` buttons always run a macro sequence; without macro mode they replay
//! [`DEFAULT_META_ACTIONS`]. Hosts that enable cycle mode without their own
//! presets seed it from [`POMODORO_PRESETS`].

use alloc::vec::Vec;
use core::time::Duration;

use super::{CyclePreset, MacroAction, MacroActionKind};

/// Pause between steps of the built-in meta sequence.
pub const META_STEP_DELAY: Duration = Duration::from_millis(300);

/// Steps replayed by a `Meta` button when macro mode is off.
pub const DEFAULT_META_ACTIONS: [(MacroActionKind, &str, Duration); 3] = [
    (MacroActionKind::Log, "Gather context", META_STEP_DELAY),
    (MacroActionKind::Toggle, "Focus mode", META_STEP_DELAY),
    (MacroActionKind::Log, "Share summary", META_STEP_DELAY),
];

/// Label, badge, and color triples of the default cycle rotation.
pub const POMODORO_PRESETS: [(&str, &str, &str); 3] = [
    ("Focus", "25m", "#2563eb"),
    ("Short break", "5m", "#16a34a"),
    ("Long break", "15m", "#9333ea"),
];

/// Returns an owned copy of [`DEFAULT_META_ACTIONS`].
#[must_use]
pub fn default_meta_actions() -> Vec<MacroAction> {
    DEFAULT_META_ACTIONS
        .iter()
        .map(|&(kind, label, delay)| MacroAction::new(kind, label, delay))
        .collect()
}

/// Returns an owned copy of [`POMODORO_PRESETS`].
#[must_use]
pub fn pomodoro_presets() -> Vec<CyclePreset> {
    POMODORO_PRESETS
        .iter()
        .map(|&(label, badge, color)| CyclePreset::new(label, badge, color))
        .collect()
}
