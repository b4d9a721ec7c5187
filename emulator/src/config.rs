//! JSON panel files and the built-in demo panel.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use panel_core::behavior::{
    Behavior, BehaviorMeta, ButtonDefinition, ButtonId, ButtonStyle, ConditionalLabel,
    CyclePreset, DataAwareMeta, InputMode, MacroAction, MacroActionKind, MacroMode,
    NotionIntegrationMeta, ToggleMode, TwoWaySync, UnlockField, pomodoro_presets,
};
use serde::Deserialize;

/// Buttons plus the panel-wide behavior bundle.
#[derive(Clone, Debug)]
pub struct Panel {
    pub buttons: Vec<ButtonDefinition>,
    pub meta: BehaviorMeta,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Json(serde_json::Error),
    UnknownBehavior(String),
    UnknownAction(String),
    DuplicateButton(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(error) => write!(f, "cannot read panel file: {error}"),
            ConfigError::Json(error) => write!(f, "invalid panel file: {error}"),
            ConfigError::UnknownBehavior(tag) => write!(f, "unknown behavior `{tag}`"),
            ConfigError::UnknownAction(tag) => write!(f, "unknown macro action `{tag}`"),
            ConfigError::DuplicateButton(id) => write!(f, "button id {id} is used more than once"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}

/// Reads a panel from a JSON file.
pub fn load(path: &Path) -> Result<Panel, ConfigError> {
    let text = fs::read_to_string(path)?;
    parse(&text)
}

/// Parses a panel from JSON text.
pub fn parse(text: &str) -> Result<Panel, ConfigError> {
    let file: PanelFile = serde_json::from_str(text)?;
    file.into_panel()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PanelFile {
    buttons: Vec<ButtonFile>,
    #[serde(default)]
    meta: MetaFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ButtonFile {
    id: u32,
    label: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    url: Option<String>,
    behavior: String,
    #[serde(default)]
    playlist: String,
    #[serde(default)]
    style: Option<StyleFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct StyleFile {
    background: String,
    text_color: String,
    border_color: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct MetaFile {
    #[serde(default)]
    macro_actions: Option<Vec<MacroActionFile>>,
    #[serde(default)]
    cycle_mode: bool,
    #[serde(default)]
    cycle_presets: Vec<PresetFile>,
    #[serde(default)]
    toggle: Option<ToggleFile>,
    #[serde(default)]
    input_prompt: Option<String>,
    #[serde(default)]
    structured_logging: bool,
    #[serde(default)]
    data_aware: DataAwareFile,
    #[serde(default)]
    notion: Option<NotionFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct MacroActionFile {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    delay_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PresetFile {
    label: String,
    badge: String,
    color: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ToggleFile {
    active_label: String,
    inactive_label: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct DataAwareFile {
    #[serde(default)]
    tasks_incomplete: bool,
    #[serde(default)]
    sample_value: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct NotionFile {
    database: String,
    action: String,
    #[serde(default)]
    prefill: Vec<(String, String)>,
    #[serde(default)]
    conditional: Option<ConditionalFile>,
    #[serde(default)]
    unlock_field: Option<UnlockFieldFile>,
    #[serde(default)]
    limit_reached: bool,
    #[serde(default)]
    task_completed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConditionalFile {
    condition: bool,
    then_label: String,
    else_label: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct UnlockFieldFile {
    name: String,
    #[serde(default)]
    ready: bool,
}

impl PanelFile {
    fn into_panel(self) -> Result<Panel, ConfigError> {
        let mut seen = BTreeSet::new();
        if let Some(button) = self.buttons.iter().find(|button| !seen.insert(button.id)) {
            return Err(ConfigError::DuplicateButton(button.id));
        }

        let buttons = self
            .buttons
            .into_iter()
            .map(ButtonFile::into_definition)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Panel {
            buttons,
            meta: self.meta.into_meta()?,
        })
    }
}

impl ButtonFile {
    fn into_definition(self) -> Result<ButtonDefinition, ConfigError> {
        let behavior = Behavior::from_tag(&self.behavior, &self.playlist)
            .map_err(|_| ConfigError::UnknownBehavior(self.behavior.clone()))?;
        let mut definition =
            ButtonDefinition::new(ButtonId(self.id), self.label, behavior).with_icon(self.icon);
        definition.url = self.url;
        if let Some(style) = self.style {
            definition = definition.with_style(ButtonStyle {
                background: style.background,
                text_color: style.text_color,
                border_color: style.border_color,
            });
        }
        Ok(definition)
    }
}

impl MetaFile {
    fn into_meta(self) -> Result<BehaviorMeta, ConfigError> {
        let macro_mode = self
            .macro_actions
            .map(|actions| {
                actions
                    .into_iter()
                    .map(MacroActionFile::into_action)
                    .collect::<Result<Vec<_>, _>>()
                    .map(|actions| MacroMode { actions })
            })
            .transpose()?;

        let cycle_presets = if !self.cycle_presets.is_empty() {
            self.cycle_presets
                .into_iter()
                .map(|preset| CyclePreset::new(preset.label, preset.badge, preset.color))
                .collect()
        } else if self.cycle_mode {
            pomodoro_presets()
        } else {
            Vec::new()
        };

        Ok(BehaviorMeta {
            macro_mode,
            cycle_presets,
            toggle_mode: self.toggle.map(|toggle| ToggleMode {
                active_label: toggle.active_label,
                inactive_label: toggle.inactive_label,
            }),
            input_mode: self.input_prompt.map(|prompt| InputMode { prompt }),
            structured_logging: self.structured_logging,
            data_aware: DataAwareMeta {
                tasks_incomplete: self.data_aware.tasks_incomplete,
                sample_value: self.data_aware.sample_value,
                ..DataAwareMeta::default()
            },
            notion: self.notion.map(NotionFile::into_meta),
        })
    }
}

impl MacroActionFile {
    fn into_action(self) -> Result<MacroAction, ConfigError> {
        let kind =
            MacroActionKind::from_tag(&self.kind).ok_or(ConfigError::UnknownAction(self.kind))?;
        let label = self.label.unwrap_or_else(|| kind.as_str().to_owned());
        Ok(MacroAction::new(kind, label, Duration::from_millis(self.delay_ms)))
    }
}

impl NotionFile {
    fn into_meta(self) -> NotionIntegrationMeta {
        NotionIntegrationMeta {
            database_label: self.database,
            action_label: self.action,
            prefill: self.prefill,
            conditional: self.conditional.map(|rule| ConditionalLabel {
                condition: rule.condition,
                then_label: rule.then_label,
                else_label: rule.else_label,
            }),
            unlock_field: self.unlock_field.map(|field| UnlockField {
                name: field.name,
                ready: field.ready,
            }),
            sync: TwoWaySync {
                limit_reached: self.limit_reached,
                task_completed: self.task_completed,
            },
        }
    }
}

const DEMO_PANEL: &str = r##"{
  "buttons": [
    { "id": 1, "label": "Water", "icon": "💧", "behavior": "counter" },
    { "id": 2, "label": "Focus", "behavior": "cycle" },
    { "id": 3, "label": "Reading", "icon": "📚", "behavior": "playlist",
      "playlist": "Dune\nNeuromancer\nSnow Crash" },
    { "id": 4, "label": "Mode", "behavior": "modeSwitcher" },
    { "id": 5, "label": "Theme", "icon": "🌓", "behavior": "themeToggle" },
    { "id": 6, "label": "Docs", "icon": "🔗", "behavior": "navigation",
      "url": "https://example.com/docs" },
    { "id": 7, "label": "Brief", "icon": "✨", "behavior": "meta" },
    { "id": 8, "label": "Vault", "icon": "🔒", "behavior": "secret",
      "style": { "background": "#111827", "textColor": "#f9fafb", "borderColor": "#4b5563" } }
  ],
  "meta": {
    "structuredLogging": true,
    "toggle": { "activeLabel": "Active", "inactiveLabel": "Inactive" }
  }
}"##;

/// Panel used when no file is given.
pub fn demo() -> Result<Panel, ConfigError> {
    parse(DEMO_PANEL)
}
