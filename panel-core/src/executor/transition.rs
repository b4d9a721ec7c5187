//! Behavior-specific state transitions applied when a press completes.

use alloc::format;
use alloc::string::String;

use crate::behavior::{Behavior, ButtonDefinition};
use crate::presentation::MODE_LABELS;
use crate::state::{CYCLE_STEPS, RuntimeState};

/// Templates rotated through by `Template` buttons.
pub const TEMPLATE_NAMES: [&str; 3] = ["Daily note", "Meeting notes", "Project brief"];

/// Applies the transition for `definition.behavior` to `state`.
///
/// Returns the line pushed onto the macro log, if the behavior records one.
pub(crate) fn apply<I>(
    definition: &ButtonDefinition,
    state: &mut RuntimeState<I>,
    playlist: &[String],
) -> Option<String> {
    let line = match &definition.behavior {
        Behavior::Custom => return None,
        Behavior::Cycle => {
            let previous = state.cycle_step % CYCLE_STEPS;
            state.cycle_step = (previous + 1) % CYCLE_STEPS;
            state.timer_running = previous == 0;
            String::from(match previous {
                0 => "Pomodoro started",
                1 => "Pomodoro paused",
                _ => "Break skipped",
            })
        }
        Behavior::CreatePage => format!("Page created: {}", definition.label),
        Behavior::Template => {
            let name = TEMPLATE_NAMES[state.dynamic_label_index % TEMPLATE_NAMES.len()];
            state.dynamic_label_index = (state.dynamic_label_index + 1) % TEMPLATE_NAMES.len();
            format!("Template applied: {name}")
        }
        Behavior::Counter => {
            state.counter_value = state.counter_value.saturating_add(1);
            format!("Count: {}", state.counter_value)
        }
        Behavior::ModeSwitcher => {
            state.mode_index = (state.mode_index + 1) % MODE_LABELS.len();
            format!("Mode: {}", MODE_LABELS[state.mode_index])
        }
        Behavior::ThemeToggle => {
            state.theme_mode = state.theme_mode.flipped();
            format!("Theme: {}", state.theme_mode)
        }
        Behavior::Playlist { .. } => {
            if playlist.is_empty() {
                String::from("Playlist is empty")
            } else {
                state.playlist_index = (state.playlist_index + 1) % playlist.len();
                format!("Now showing: {}", playlist[state.playlist_index])
            }
        }
        Behavior::Navigation => match definition.link() {
            Some(url) => format!("Navigated to {url}"),
            None => String::from("No destination configured"),
        },
        Behavior::Meta => String::from("Meta sequence finished"),
        Behavior::Secret => String::from("Secret action ran"),
    };

    state.macro_log.push(line.clone());
    Some(line)
}
