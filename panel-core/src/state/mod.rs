//! Mutable per-button runtime state and the store that owns it.
//!
//! Definitions never hold runtime data. Each live [`ButtonId`] maps to one
//! [`RuntimeState`] cell in a [`RuntimeStateStore`]; every mutation goes
//! through [`RuntimeStateStore::update`], which patches a private copy and
//! commits it in one step so readers only ever observe whole states.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use heapless::HistoryBuf;

use crate::behavior::ButtonId;

/// Number of macro log lines retained per button.
pub const MACRO_LOG_DEPTH: usize = 4;
/// Upper bound of the energy accumulator.
pub const ENERGY_MAX: u8 = 100;
/// Number of steps in the fixed cycle rotation.
pub const CYCLE_STEPS: u8 = 3;

/// Theme selected by `ThemeToggle` buttons.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Dark => "Dark",
            ThemeMode::Light => "Light",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sliding window over the most recent macro log lines of one button.
pub struct MacroLog {
    lines: HistoryBuf<String, MACRO_LOG_DEPTH>,
}

impl MacroLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: HistoryBuf::new(),
        }
    }

    /// Appends a line, evicting the oldest once the window is full.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.write(line.into());
    }

    /// Iterates over the retained lines, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.oldest_ordered().map(String::as_str)
    }

    /// Most recently pushed line.
    #[must_use]
    pub fn latest(&self) -> Option<&str> {
        self.lines.recent().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Owned copy of the retained lines, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(String::from).collect()
    }
}

impl Default for MacroLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MacroLog {
    fn clone(&self) -> Self {
        let mut copy = Self::new();
        for line in self.lines.oldest_ordered() {
            copy.lines.write(line.clone());
        }
        copy
    }
}

impl PartialEq for MacroLog {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for MacroLog {}

impl fmt::Debug for MacroLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Runtime data owned by the engine for one button.
#[derive(Clone, Debug, Eq, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RuntimeState<I> {
    pub cycle_index: usize,
    pub is_active: bool,
    pub badge_count: u32,
    pub awaiting_input: bool,
    pub input_value: String,
    pub macro_log: MacroLog,
    /// Bumped on every completion so renderers can replay a pulse.
    pub animation_key: u32,
    pub last_complete_at: Option<I>,
    pub recently_completed: bool,
    pub processing: bool,
    pub energy_charge: u8,
    /// One-way latch set by a completed long press.
    pub secret_unlocked: bool,
    pub counter_value: u32,
    pub playlist_index: usize,
    pub mode_index: usize,
    pub theme_mode: ThemeMode,
    /// Position in the fixed three-step cycle, always below [`CYCLE_STEPS`].
    pub cycle_step: u8,
    pub dynamic_label_index: usize,
    pub timer_running: bool,
}

impl<I> RuntimeState<I> {
    /// Default-constructed state for a newly seen button.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cycle_index: 0,
            is_active: false,
            badge_count: 0,
            awaiting_input: false,
            input_value: String::new(),
            macro_log: MacroLog::new(),
            animation_key: 0,
            last_complete_at: None,
            recently_completed: false,
            processing: false,
            energy_charge: 0,
            secret_unlocked: false,
            counter_value: 0,
            playlist_index: 0,
            mode_index: 0,
            theme_mode: ThemeMode::Dark,
            cycle_step: 0,
            dynamic_label_index: 0,
            timer_running: false,
        }
    }

    /// Adds `step` to the energy charge, saturating at [`ENERGY_MAX`].
    pub fn charge(&mut self, step: u8) {
        self.energy_charge = self.energy_charge.saturating_add(step).min(ENERGY_MAX);
    }
}

impl<I> Default for RuntimeState<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// A change applied to one runtime state by [`RuntimeStateStore::update`].
pub trait StatePatch<I> {
    fn apply(self, state: &mut RuntimeState<I>);
}

impl<I, F> StatePatch<I> for F
where
    F: FnOnce(&mut RuntimeState<I>),
{
    fn apply(self, state: &mut RuntimeState<I>) {
        self(state);
    }
}

/// Partial-object patch: every `Some` field overwrites the current value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RuntimeStatePatch {
    pub cycle_index: Option<usize>,
    pub is_active: Option<bool>,
    pub badge_count: Option<u32>,
    pub awaiting_input: Option<bool>,
    pub input_value: Option<String>,
    pub recently_completed: Option<bool>,
    pub processing: Option<bool>,
    pub energy_charge: Option<u8>,
    pub secret_unlocked: Option<bool>,
    pub counter_value: Option<u32>,
    pub playlist_index: Option<usize>,
    pub mode_index: Option<usize>,
    pub theme_mode: Option<ThemeMode>,
    pub cycle_step: Option<u8>,
    pub dynamic_label_index: Option<usize>,
    pub timer_running: Option<bool>,
}

impl<I> StatePatch<I> for RuntimeStatePatch {
    fn apply(self, state: &mut RuntimeState<I>) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        set(&mut state.cycle_index, self.cycle_index);
        set(&mut state.is_active, self.is_active);
        set(&mut state.badge_count, self.badge_count);
        set(&mut state.awaiting_input, self.awaiting_input);
        set(&mut state.input_value, self.input_value);
        set(&mut state.recently_completed, self.recently_completed);
        set(&mut state.processing, self.processing);
        set(
            &mut state.energy_charge,
            self.energy_charge.map(|charge| charge.min(ENERGY_MAX)),
        );
        // The unlock latch never resets through a patch.
        if self.secret_unlocked == Some(true) {
            state.secret_unlocked = true;
        }
        set(&mut state.counter_value, self.counter_value);
        set(&mut state.playlist_index, self.playlist_index);
        set(&mut state.mode_index, self.mode_index);
        set(&mut state.theme_mode, self.theme_mode);
        set(
            &mut state.cycle_step,
            self.cycle_step.map(|step| step % CYCLE_STEPS),
        );
        set(&mut state.dynamic_label_index, self.dynamic_label_index);
        set(&mut state.timer_running, self.timer_running);
    }
}

/// Keyed mapping from button id to its runtime state.
pub struct RuntimeStateStore<I> {
    states: BTreeMap<ButtonId, RuntimeState<I>>,
    fallback: RuntimeState<I>,
}

impl<I: Clone> RuntimeStateStore<I> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            states: BTreeMap::new(),
            fallback: RuntimeState::new(),
        }
    }

    /// Current state of `id`, or the default state when none exists yet.
    #[must_use]
    pub fn get(&self, id: ButtonId) -> &RuntimeState<I> {
        self.states.get(&id).unwrap_or(&self.fallback)
    }

    /// Applies `patch` to the state of `id` and commits the result.
    ///
    /// The patch runs against a copy; the stored state is replaced only after
    /// the patch returns. Missing states are created on demand.
    pub fn update(&mut self, id: ButtonId, patch: impl StatePatch<I>) -> &RuntimeState<I> {
        let mut next = self.get(id).clone();
        patch.apply(&mut next);
        let slot = self.states.entry(id).or_default();
        *slot = next;
        slot
    }

    /// Synchronizes the map to exactly `ids`.
    ///
    /// Existing entries are kept untouched, missing ones default-constructed,
    /// and entries outside `ids` discarded. Returns the discarded ids.
    pub fn ensure(&mut self, ids: &[ButtonId]) -> Vec<ButtonId> {
        let removed: Vec<ButtonId> = self
            .states
            .keys()
            .copied()
            .filter(|id| !ids.contains(id))
            .collect();
        for id in &removed {
            self.states.remove(id);
        }
        for &id in ids {
            self.states.entry(id).or_default();
        }
        removed
    }

    /// Discards the state of `id`, returning it when present.
    pub fn remove(&mut self, id: ButtonId) -> Option<RuntimeState<I>> {
        self.states.remove(&id)
    }

    /// Discards every state.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    #[must_use]
    pub fn contains(&self, id: ButtonId) -> bool {
        self.states.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Ids with a stored state, in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ButtonId> + '_ {
        self.states.keys().copied()
    }
}

impl<I: Clone> Default for RuntimeStateStore<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::SimInstant;
    use alloc::vec;

    type Store = RuntimeStateStore<SimInstant>;

    #[test]
    fn macro_log_keeps_last_four_lines() {
        let mut log = MacroLog::new();
        for line in ["a", "b", "c", "d", "e", "f"] {
            log.push(line);
        }
        assert_eq!(log.len(), MACRO_LOG_DEPTH);
        assert_eq!(log.to_vec(), vec!["c", "d", "e", "f"]);
        assert_eq!(log.latest(), Some("f"));
        assert_eq!(log.clone(), log);
    }

    #[test]
    fn get_returns_defaults_for_unknown_ids() {
        let store = Store::new();
        assert_eq!(store.get(ButtonId(42)), &RuntimeState::default());
        assert!(store.is_empty());
    }

    #[test]
    fn update_accepts_closures_and_partial_patches() {
        let mut store = Store::new();
        let state = store.update(ButtonId(1), |state: &mut RuntimeState<SimInstant>| {
            state.counter_value += 2;
            state.macro_log.push("Count: 2");
        });
        assert_eq!(state.counter_value, 2);

        let state = store.update(
            ButtonId(1),
            RuntimeStatePatch {
                is_active: Some(true),
                energy_charge: Some(250),
                cycle_step: Some(4),
                ..RuntimeStatePatch::default()
            },
        );
        assert!(state.is_active);
        assert_eq!(state.energy_charge, ENERGY_MAX);
        assert_eq!(state.cycle_step, 1);
        assert_eq!(state.counter_value, 2);
        assert_eq!(state.macro_log.to_vec(), vec!["Count: 2"]);
    }

    #[test]
    fn unlock_latch_survives_patches() {
        let mut store = Store::new();
        store.update(
            ButtonId(3),
            RuntimeStatePatch {
                secret_unlocked: Some(true),
                ..RuntimeStatePatch::default()
            },
        );
        store.update(
            ButtonId(3),
            RuntimeStatePatch {
                secret_unlocked: Some(false),
                ..RuntimeStatePatch::default()
            },
        );
        assert!(store.get(ButtonId(3)).secret_unlocked);
    }

    #[test]
    fn ensure_is_idempotent_and_reports_removed_ids() {
        let mut store = Store::new();
        let ids = [ButtonId(1), ButtonId(2)];
        assert!(store.ensure(&ids).is_empty());
        store.update(ButtonId(2), |state: &mut RuntimeState<SimInstant>| {
            state.badge_count = 7;
        });

        let before = store.get(ButtonId(2)).clone();
        assert!(store.ensure(&ids).is_empty());
        assert!(store.ensure(&ids).is_empty());
        assert_eq!(store.get(ButtonId(2)), &before);

        let removed = store.ensure(&[ButtonId(2), ButtonId(5)]);
        assert_eq!(removed, vec![ButtonId(1)]);
        assert_eq!(store.ids().collect::<Vec<_>>(), vec![ButtonId(2), ButtonId(5)]);
        assert_eq!(store.get(ButtonId(2)).badge_count, 7);
    }

    #[test]
    fn charge_saturates() {
        let mut state = RuntimeState::<SimInstant>::new();
        for _ in 0..7 {
            state.charge(20);
        }
        assert_eq!(state.energy_charge, ENERGY_MAX);
    }
}
