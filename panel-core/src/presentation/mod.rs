//! Derived presentation for a button.
//!
//! [`resolve`] is a pure function of the definition, its runtime state, and
//! the panel-wide signals. It never mutates anything, so renderers can call it
//! as often as they like.

use alloc::format;
use alloc::string::String;

use crate::behavior::{
    Behavior, BehaviorMeta, ButtonDefinition, ButtonStyle, CyclePreset, DataAwareMeta,
    InputMode, NotionIntegrationMeta, ToggleMode,
};
use crate::state::{CYCLE_STEPS, RuntimeState};

/// Labels of the fixed three-step cycle.
pub const CYCLE_LABELS: [&str; CYCLE_STEPS as usize] = ["Start Pomodoro", "Pause", "Skip Break"];
/// Icons shown on the non-initial cycle steps.
pub const CYCLE_ICONS: [Option<&str>; CYCLE_STEPS as usize] = [None, Some("⏸"), Some("⏭")];
/// Modes rotated through by `ModeSwitcher` buttons.
pub const MODE_LABELS: [&str; 3] = ["Focus", "Break", "Deep Work"];

pub const SECRET_LOCKED_LABEL: &str = "Hold to unlock";
pub const SECRET_LOCKED_TOOLTIP: &str = "Press and hold for two seconds to unlock";
pub const SECRET_READY_TOOLTIP: &str = "Unlocked and ready";

/// Which input produced a style override.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StyleSource {
    CyclePreset,
    DataAware,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StyleOverride {
    pub style: ButtonStyle,
    pub source: StyleSource,
}

/// Overrides layered over the definition by the renderer. `None` keeps the
/// definition's own value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PresentationResult {
    pub label: Option<String>,
    pub icon: Option<String>,
    pub tooltip: Option<String>,
    pub badge: Option<String>,
    pub style: Option<StyleOverride>,
}

impl PresentationResult {
    /// Label after overrides.
    #[must_use]
    pub fn label_or<'a>(&'a self, definition: &'a ButtonDefinition) -> &'a str {
        self.label.as_deref().unwrap_or(&definition.label)
    }

    /// Icon after overrides.
    #[must_use]
    pub fn icon_or<'a>(&'a self, definition: &'a ButtonDefinition) -> &'a str {
        self.icon.as_deref().unwrap_or(&definition.icon)
    }

    /// Style after overrides.
    #[must_use]
    pub fn style_or<'a>(&'a self, definition: &'a ButtonDefinition) -> &'a ButtonStyle {
        self.style
            .as_ref()
            .map_or(&definition.style, |style| &style.style)
    }
}

/// Panel-wide inputs that affect presentation beyond cycle presets.
#[derive(Copy, Clone, Debug)]
pub struct PresentationSignals<'a> {
    pub data_aware: &'a DataAwareMeta,
    pub notion: Option<&'a NotionIntegrationMeta>,
    pub toggle: Option<&'a ToggleMode>,
    pub input: Option<&'a InputMode>,
}

impl<'a> PresentationSignals<'a> {
    #[must_use]
    pub fn from_meta(meta: &'a BehaviorMeta) -> Self {
        Self {
            data_aware: &meta.data_aware,
            notion: meta.notion.as_ref(),
            toggle: meta.toggle_mode.as_ref(),
            input: meta.input_mode.as_ref(),
        }
    }
}

/// Computes presentation overrides for one button.
#[must_use]
pub fn resolve<I>(
    definition: &ButtonDefinition,
    state: &RuntimeState<I>,
    cycle_presets: &[CyclePreset],
    playlist_items: &[String],
    signals: &PresentationSignals<'_>,
) -> PresentationResult {
    let mut result = PresentationResult::default();

    let preset = (!cycle_presets.is_empty())
        .then(|| &cycle_presets[state.cycle_index % cycle_presets.len()]);
    if let Some(preset) = preset {
        result.label = Some(preset.label.clone());
        result.badge = Some(preset.badge.clone());
    }

    if let Some(toggle) = signals.toggle {
        result.tooltip = Some(format!("Status: {}", toggle.label_for(state.is_active)));
    }

    if let Some(notion) = signals.notion {
        result.tooltip = Some(match &notion.unlock_field {
            Some(field) if !notion.is_unlocked() => format!("Waiting for {}", field.name),
            _ => format!("{} → {}", notion.database_label, notion.resolved_action()),
        });
    }

    apply_behavior(&mut result, definition, state, playlist_items);

    if let (Some(input), true) = (signals.input, state.awaiting_input) {
        result.tooltip = Some(input.prompt.clone());
    }

    let sampled = signals.data_aware.sample_value.unwrap_or(0);
    let count = state.badge_count.max(sampled);
    if count > 0 && result.badge.is_none() {
        result.badge = Some(format!("{count}"));
    }

    result.style = if signals.data_aware.tasks_incomplete {
        Some(StyleOverride {
            style: signals.data_aware.warning_style.clone(),
            source: StyleSource::DataAware,
        })
    } else {
        preset.map(|preset| StyleOverride {
            style: definition.style.with_background(&preset.color),
            source: StyleSource::CyclePreset,
        })
    };

    result
}

fn apply_behavior<I>(
    result: &mut PresentationResult,
    definition: &ButtonDefinition,
    state: &RuntimeState<I>,
    playlist_items: &[String],
) {
    match &definition.behavior {
        Behavior::Custom
        | Behavior::CreatePage
        | Behavior::Template
        | Behavior::Navigation
        | Behavior::Meta => {}
        Behavior::Cycle => {
            let step = usize::from(state.cycle_step % CYCLE_STEPS);
            result.label = Some(String::from(CYCLE_LABELS[step]));
            if let Some(icon) = CYCLE_ICONS[step] {
                result.icon = Some(String::from(icon));
            }
        }
        Behavior::Counter => {
            result.label = Some(format!("{} {}", definition.label, state.counter_value));
        }
        Behavior::ModeSwitcher => {
            result.label = Some(String::from(
                MODE_LABELS[state.mode_index % MODE_LABELS.len()],
            ));
        }
        Behavior::ThemeToggle => {
            result.label = Some(format!("Theme: {}", state.theme_mode));
        }
        Behavior::Playlist { .. } => {
            if !playlist_items.is_empty() {
                result.label = Some(
                    playlist_items[state.playlist_index % playlist_items.len()].clone(),
                );
            }
        }
        Behavior::Secret => {
            if state.secret_unlocked {
                result.tooltip = Some(String::from(SECRET_READY_TOOLTIP));
            } else {
                result.label = Some(String::from(SECRET_LOCKED_LABEL));
                result.tooltip = Some(String::from(SECRET_LOCKED_TOOLTIP));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{ButtonId, UnlockField};
    use crate::state::ThemeMode;
    use crate::time::SimInstant;
    use alloc::vec;
    use alloc::vec::Vec;

    fn resolve_with(
        definition: &ButtonDefinition,
        state: &RuntimeState<SimInstant>,
        meta: &BehaviorMeta,
    ) -> PresentationResult {
        let items = definition.behavior.playlist_items();
        resolve(
            definition,
            state,
            &meta.cycle_presets,
            &items,
            &PresentationSignals::from_meta(meta),
        )
    }

    #[test]
    fn cycle_labels_and_icons_follow_step() {
        let button = ButtonDefinition::new(ButtonId(1), "Timer", Behavior::Cycle);
        let meta = BehaviorMeta::default();
        let mut state = RuntimeState::new();

        let labels: Vec<_> = (0..4)
            .map(|step| {
                state.cycle_step = step % CYCLE_STEPS;
                let result = resolve_with(&button, &state, &meta);
                (result.label, result.icon)
            })
            .collect();

        assert_eq!(
            labels,
            vec![
                (Some(String::from("Start Pomodoro")), None),
                (Some(String::from("Pause")), Some(String::from("⏸"))),
                (Some(String::from("Skip Break")), Some(String::from("⏭"))),
                (Some(String::from("Start Pomodoro")), None),
            ]
        );
    }

    #[test]
    fn counter_mode_and_theme_labels() {
        let meta = BehaviorMeta::default();
        let mut state = RuntimeState::<SimInstant>::new();
        state.counter_value = 3;
        state.mode_index = 4;
        state.theme_mode = ThemeMode::Light;

        let counter = ButtonDefinition::new(ButtonId(1), "Water", Behavior::Counter);
        let modes = ButtonDefinition::new(ButtonId(2), "Mode", Behavior::ModeSwitcher);
        let theme = ButtonDefinition::new(ButtonId(3), "Theme", Behavior::ThemeToggle);

        assert_eq!(resolve_with(&counter, &state, &meta).label.as_deref(), Some("Water 3"));
        assert_eq!(resolve_with(&modes, &state, &meta).label.as_deref(), Some("Break"));
        assert_eq!(
            resolve_with(&theme, &state, &meta).label.as_deref(),
            Some("Theme: Light")
        );
    }

    #[test]
    fn empty_playlist_keeps_definition_label() {
        let meta = BehaviorMeta::default();
        let state = RuntimeState::<SimInstant>::new();
        let button = ButtonDefinition::new(
            ButtonId(1),
            "Reading",
            Behavior::Playlist {
                source: String::from("\n  \n"),
            },
        );
        let result = resolve_with(&button, &state, &meta);
        assert_eq!(result.label, None);
        assert_eq!(result.label_or(&button), "Reading");
    }

    #[test]
    fn secret_tooltip_flips_after_unlock() {
        let meta = BehaviorMeta::default();
        let button = ButtonDefinition::new(ButtonId(9), "Vault", Behavior::Secret);
        let mut state = RuntimeState::<SimInstant>::new();

        let locked = resolve_with(&button, &state, &meta);
        assert_eq!(locked.label.as_deref(), Some(SECRET_LOCKED_LABEL));
        assert_eq!(locked.tooltip.as_deref(), Some(SECRET_LOCKED_TOOLTIP));

        state.secret_unlocked = true;
        let unlocked = resolve_with(&button, &state, &meta);
        assert_eq!(unlocked.label, None);
        assert_eq!(unlocked.tooltip.as_deref(), Some(SECRET_READY_TOOLTIP));
    }

    #[test]
    fn data_aware_style_beats_cycle_preset_color() {
        let button = ButtonDefinition::new(ButtonId(1), "Tasks", Behavior::Custom);
        let mut meta = BehaviorMeta {
            cycle_presets: crate::behavior::pomodoro_presets(),
            ..BehaviorMeta::default()
        };
        let mut state = RuntimeState::<SimInstant>::new();
        state.cycle_index = 1;

        let result = resolve_with(&button, &state, &meta);
        let style = result.style.expect("preset style");
        assert_eq!(style.source, StyleSource::CyclePreset);
        assert_eq!(style.style.background, "#16a34a");
        assert_eq!(result.label.as_deref(), Some("Short break"));
        assert_eq!(result.badge.as_deref(), Some("5m"));

        meta.data_aware.tasks_incomplete = true;
        let result = resolve_with(&button, &state, &meta);
        let style = result.style.expect("warning style");
        assert_eq!(style.source, StyleSource::DataAware);
        assert_eq!(style.style, ButtonStyle::warning());

        meta.cycle_presets.clear();
        meta.data_aware.tasks_incomplete = false;
        assert_eq!(resolve_with(&button, &state, &meta).style, None);
    }

    #[test]
    fn badge_shows_larger_of_count_and_sample() {
        let button = ButtonDefinition::new(ButtonId(1), "Inbox", Behavior::Custom);
        let mut meta = BehaviorMeta::default();
        let mut state = RuntimeState::<SimInstant>::new();
        assert_eq!(resolve_with(&button, &state, &meta).badge, None);

        state.badge_count = 2;
        meta.data_aware.sample_value = Some(12);
        assert_eq!(resolve_with(&button, &state, &meta).badge.as_deref(), Some("12"));

        state.badge_count = 15;
        assert_eq!(resolve_with(&button, &state, &meta).badge.as_deref(), Some("15"));
    }

    #[test]
    fn tooltip_precedence_prompt_over_notion_over_toggle() {
        let button = ButtonDefinition::new(ButtonId(1), "Capture", Behavior::Custom);
        let mut meta = BehaviorMeta {
            toggle_mode: Some(ToggleMode::default()),
            ..BehaviorMeta::default()
        };
        let mut state = RuntimeState::<SimInstant>::new();
        assert_eq!(
            resolve_with(&button, &state, &meta).tooltip.as_deref(),
            Some("Status: Inactive")
        );

        meta.notion = Some(NotionIntegrationMeta {
            database_label: String::from("Tasks"),
            action_label: String::from("Create entry"),
            unlock_field: Some(UnlockField {
                name: String::from("Owner"),
                ready: false,
            }),
            ..NotionIntegrationMeta::default()
        });
        assert_eq!(
            resolve_with(&button, &state, &meta).tooltip.as_deref(),
            Some("Waiting for Owner")
        );

        meta.input_mode = Some(InputMode::default());
        state.awaiting_input = true;
        assert_eq!(
            resolve_with(&button, &state, &meta).tooltip.as_deref(),
            Some(InputMode::default().prompt.as_str())
        );
    }
}
