//! Button configuration records consumed by the engine.
//!
//! Definitions and the panel-wide [`BehaviorMeta`] bundle are produced by the
//! configuration layer and treated as read-only values here. Mutable runtime
//! data lives in [`crate::state`], keyed by [`ButtonId`], so these records stay
//! plain values that can be cloned, compared, and serialized by hosts.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::time::Duration;

pub mod presets;

pub use presets::{
    DEFAULT_META_ACTIONS, POMODORO_PRESETS, default_meta_actions, pomodoro_presets,
};

/// Stable identifier pairing a definition with its runtime state.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ButtonId(pub u32);

impl ButtonId {
    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Interaction pattern a button performs when pressed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Behavior {
    #[default]
    Custom,
    Cycle,
    CreatePage,
    Template,
    Counter,
    ModeSwitcher,
    ThemeToggle,
    /// Steps through newline-separated items of `source`.
    Playlist {
        source: String,
    },
    Navigation,
    Meta,
    Secret,
}

impl Behavior {
    /// Returns the field-less discriminant.
    #[must_use]
    pub const fn kind(&self) -> BehaviorKind {
        match self {
            Behavior::Custom => BehaviorKind::Custom,
            Behavior::Cycle => BehaviorKind::Cycle,
            Behavior::CreatePage => BehaviorKind::CreatePage,
            Behavior::Template => BehaviorKind::Template,
            Behavior::Counter => BehaviorKind::Counter,
            Behavior::ModeSwitcher => BehaviorKind::ModeSwitcher,
            Behavior::ThemeToggle => BehaviorKind::ThemeToggle,
            Behavior::Playlist { .. } => BehaviorKind::Playlist,
            Behavior::Navigation => BehaviorKind::Navigation,
            Behavior::Meta => BehaviorKind::Meta,
            Behavior::Secret => BehaviorKind::Secret,
        }
    }

    /// Builds a behavior from its configuration tag.
    ///
    /// `playlist_source` is only consulted for the `playlist` tag.
    pub fn from_tag(tag: &str, playlist_source: &str) -> Result<Self, UnknownBehavior> {
        let kind = BehaviorKind::from_tag(tag).ok_or(UnknownBehavior)?;
        Ok(match kind {
            BehaviorKind::Custom => Behavior::Custom,
            BehaviorKind::Cycle => Behavior::Cycle,
            BehaviorKind::CreatePage => Behavior::CreatePage,
            BehaviorKind::Template => Behavior::Template,
            BehaviorKind::Counter => Behavior::Counter,
            BehaviorKind::ModeSwitcher => Behavior::ModeSwitcher,
            BehaviorKind::ThemeToggle => Behavior::ThemeToggle,
            BehaviorKind::Playlist => Behavior::Playlist {
                source: String::from(playlist_source),
            },
            BehaviorKind::Navigation => Behavior::Navigation,
            BehaviorKind::Meta => Behavior::Meta,
            BehaviorKind::Secret => Behavior::Secret,
        })
    }

    /// Playlist entries for `Playlist` behaviors, empty otherwise.
    #[must_use]
    pub fn playlist_items(&self) -> Vec<String> {
        match self {
            Behavior::Playlist { source } => parse_playlist(source),
            _ => Vec::new(),
        }
    }
}

/// Discriminant of [`Behavior`] used in logs and configuration.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum BehaviorKind {
    Custom,
    Cycle,
    CreatePage,
    Template,
    Counter,
    ModeSwitcher,
    ThemeToggle,
    Playlist,
    Navigation,
    Meta,
    Secret,
}

/// Every behavior kind in configuration order.
pub const ALL_BEHAVIORS: [BehaviorKind; 11] = [
    BehaviorKind::Custom,
    BehaviorKind::Cycle,
    BehaviorKind::CreatePage,
    BehaviorKind::Template,
    BehaviorKind::Counter,
    BehaviorKind::ModeSwitcher,
    BehaviorKind::ThemeToggle,
    BehaviorKind::Playlist,
    BehaviorKind::Navigation,
    BehaviorKind::Meta,
    BehaviorKind::Secret,
];

impl BehaviorKind {
    /// Configuration tag for the behavior.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BehaviorKind::Custom => "custom",
            BehaviorKind::Cycle => "cycle",
            BehaviorKind::CreatePage => "createPage",
            BehaviorKind::Template => "template",
            BehaviorKind::Counter => "counter",
            BehaviorKind::ModeSwitcher => "modeSwitcher",
            BehaviorKind::ThemeToggle => "themeToggle",
            BehaviorKind::Playlist => "playlist",
            BehaviorKind::Navigation => "navigation",
            BehaviorKind::Meta => "meta",
            BehaviorKind::Secret => "secret",
        }
    }

    /// Parses a configuration tag (case insensitive).
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        ALL_BEHAVIORS
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a configuration tag names no known behavior.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct UnknownBehavior;

impl fmt::Display for UnknownBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown behavior variant")
    }
}

/// Splits playlist source text into trimmed, non-empty items.
#[must_use]
pub fn parse_playlist(source: &str) -> Vec<String> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Visual style fields carried by a definition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ButtonStyle {
    pub background: String,
    pub text_color: String,
    pub border_color: String,
}

impl ButtonStyle {
    pub fn new(
        background: impl Into<String>,
        text_color: impl Into<String>,
        border_color: impl Into<String>,
    ) -> Self {
        Self {
            background: background.into(),
            text_color: text_color.into(),
            border_color: border_color.into(),
        }
    }

    /// Palette applied when a data-aware warning is active.
    #[must_use]
    pub fn warning() -> Self {
        Self::new("#f59e0b", "#1f2937", "#b45309")
    }

    /// Returns a copy with a different background color.
    #[must_use]
    pub fn with_background(&self, background: &str) -> Self {
        Self {
            background: String::from(background),
            ..self.clone()
        }
    }
}

impl Default for ButtonStyle {
    fn default() -> Self {
        Self::new("#1f2937", "#f9fafb", "#374151")
    }
}

/// Configuration-owned description of one action button.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ButtonDefinition {
    pub id: ButtonId,
    pub label: String,
    pub icon: String,
    pub url: Option<String>,
    pub behavior: Behavior,
    pub style: ButtonStyle,
}

impl ButtonDefinition {
    /// Creates a definition with no icon, no link, and the default style.
    pub fn new(id: ButtonId, label: impl Into<String>, behavior: Behavior) -> Self {
        Self {
            id,
            label: label.into(),
            icon: String::new(),
            url: None,
            behavior,
            style: ButtonStyle::default(),
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: ButtonStyle) -> Self {
        self.style = style;
        self
    }

    /// Configured link, ignoring blank values.
    #[must_use]
    pub fn link(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Sub-action flavours available to macro sequences.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MacroActionKind {
    Log,
    Toggle,
    OpenLink,
}

impl MacroActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MacroActionKind::Log => "log",
            MacroActionKind::Toggle => "toggle",
            MacroActionKind::OpenLink => "openLink",
        }
    }

    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        [Self::Log, Self::Toggle, Self::OpenLink]
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(tag))
    }
}

/// One timed step of a macro sequence.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MacroAction {
    pub kind: MacroActionKind,
    pub label: String,
    /// Pause observed after this step before the next one runs.
    pub delay: Duration,
}

impl MacroAction {
    pub fn new(kind: MacroActionKind, label: impl Into<String>, delay: Duration) -> Self {
        Self {
            kind,
            label: label.into(),
            delay,
        }
    }

    pub fn log(label: impl Into<String>, delay: Duration) -> Self {
        Self::new(MacroActionKind::Log, label, delay)
    }

    pub fn toggle(label: impl Into<String>, delay: Duration) -> Self {
        Self::new(MacroActionKind::Toggle, label, delay)
    }

    pub fn open_link(label: impl Into<String>, delay: Duration) -> Self {
        Self::new(MacroActionKind::OpenLink, label, delay)
    }
}

/// One entry of the cycle-mode rotation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CyclePreset {
    pub label: String,
    pub badge: String,
    pub color: String,
}

impl CyclePreset {
    pub fn new(
        label: impl Into<String>,
        badge: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            badge: badge.into(),
            color: color.into(),
        }
    }
}

/// Macro mode settings.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MacroMode {
    pub actions: Vec<MacroAction>,
}

/// Toggle mode settings: status labels for the active and inactive states.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ToggleMode {
    pub active_label: String,
    pub inactive_label: String,
}

impl ToggleMode {
    /// Status label matching `active`.
    #[must_use]
    pub fn label_for(&self, active: bool) -> &str {
        if active {
            &self.active_label
        } else {
            &self.inactive_label
        }
    }
}

impl Default for ToggleMode {
    fn default() -> Self {
        Self {
            active_label: String::from("Active"),
            inactive_label: String::from("Inactive"),
        }
    }
}

/// Input mode settings: a press first asks for a value, a second press runs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InputMode {
    pub prompt: String,
}

impl Default for InputMode {
    fn default() -> Self {
        Self {
            prompt: String::from("Type a value, then press again"),
        }
    }
}

/// Simulated live record-store signals that drive presentation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DataAwareMeta {
    pub tasks_incomplete: bool,
    /// Externally sampled value shown as the badge when it exceeds the press count.
    pub sample_value: Option<u32>,
    pub warning_style: ButtonStyle,
}

impl Default for DataAwareMeta {
    fn default() -> Self {
        Self {
            tasks_incomplete: false,
            sample_value: None,
            warning_style: ButtonStyle::warning(),
        }
    }
}

/// Label chosen by a condition evaluated by the configuration layer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConditionalLabel {
    pub condition: bool,
    pub then_label: String,
    pub else_label: String,
}

impl ConditionalLabel {
    #[must_use]
    pub fn resolve(&self) -> &str {
        if self.condition {
            &self.then_label
        } else {
            &self.else_label
        }
    }
}

/// Record field that must be filled before the integration is usable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnlockField {
    pub name: String,
    pub ready: bool,
}

/// Two-way sync conditions that block a press before any transition.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TwoWaySync {
    pub limit_reached: bool,
    pub task_completed: bool,
}

/// Read-only integration details derived from configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NotionIntegrationMeta {
    pub database_label: String,
    pub action_label: String,
    pub prefill: Vec<(String, String)>,
    pub conditional: Option<ConditionalLabel>,
    pub unlock_field: Option<UnlockField>,
    pub sync: TwoWaySync,
}

impl NotionIntegrationMeta {
    /// Action label after applying the conditional rule, if any.
    #[must_use]
    pub fn resolved_action(&self) -> &str {
        self.conditional
            .as_ref()
            .map_or(self.action_label.as_str(), ConditionalLabel::resolve)
    }

    /// Returns `true` unless an unlock field is configured and still empty.
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.unlock_field.as_ref().is_none_or(|field| field.ready)
    }
}

/// Externally toggled signals, addressable from operator tooling.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Signal {
    LimitReached,
    TaskCompleted,
    TasksIncomplete,
}

impl Signal {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Signal::LimitReached => "limit",
            Signal::TaskCompleted => "completed",
            Signal::TasksIncomplete => "incomplete",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Panel-wide behavior bundle derived from configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BehaviorMeta {
    pub macro_mode: Option<MacroMode>,
    /// Cycle mode is enabled whenever this list is non-empty.
    pub cycle_presets: Vec<CyclePreset>,
    pub toggle_mode: Option<ToggleMode>,
    pub input_mode: Option<InputMode>,
    pub structured_logging: bool,
    pub data_aware: DataAwareMeta,
    pub notion: Option<NotionIntegrationMeta>,
}

impl BehaviorMeta {
    /// Current two-way sync conditions (all clear without an integration).
    #[must_use]
    pub fn sync(&self) -> TwoWaySync {
        self.notion
            .as_ref()
            .map(|notion| notion.sync)
            .unwrap_or_default()
    }

    /// Macro steps a press of `behavior` should run, if it runs a sequence.
    ///
    /// Macro mode applies to every button; `Meta` buttons fall back to the
    /// built-in sequence when macro mode is off.
    #[must_use]
    pub fn macro_actions_for(&self, behavior: &Behavior) -> Option<Vec<MacroAction>> {
        match (&self.macro_mode, behavior) {
            (Some(mode), _) => Some(mode.actions.clone()),
            (None, Behavior::Meta) => Some(default_meta_actions()),
            (None, _) => None,
        }
    }

    /// Applies an externally toggled signal.
    pub fn set_signal(&mut self, signal: Signal, enabled: bool) {
        match signal {
            Signal::TasksIncomplete => self.data_aware.tasks_incomplete = enabled,
            Signal::LimitReached => {
                self.notion.get_or_insert_with(Default::default).sync.limit_reached = enabled;
            }
            Signal::TaskCompleted => {
                self.notion.get_or_insert_with(Default::default).sync.task_completed = enabled;
            }
        }
    }

    /// Reads the current value of a signal.
    #[must_use]
    pub fn signal(&self, signal: Signal) -> bool {
        match signal {
            Signal::TasksIncomplete => self.data_aware.tasks_incomplete,
            Signal::LimitReached => self.sync().limit_reached,
            Signal::TaskCompleted => self.sync().task_completed,
        }
    }
}
