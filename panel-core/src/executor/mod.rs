//! Per-press entry point and owner of every pending timer.
//!
//! [`ActionExecutor`] holds the button list, the runtime state store, the
//! long-press detector, the macro sequencer, the recent-completion timers, and
//! the structured log. A press walks the guard chain in priority order:
//!
//! 1. a press while the button is processing is ignored;
//! 2. `limit_reached` rejects with a log line;
//! 3. `task_completed` rejects with a different log line;
//! 4. a locked `Secret` button rejects and asks for a long press;
//! 5. input mode asks for a value on the first press;
//! 6. input mode with a blank value stays put;
//! 7. otherwise the button starts processing and either runs its macro or
//!    performs its direct action before completing.
//!
//! Timers are deadlines. [`ActionExecutor::poll`] fires every deadline that is
//! due, earliest first, and stamps the resulting effects with the deadline
//! rather than the time `poll` happened to run.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::time::Duration;

use log::{debug, info, warn};

use crate::behavior::{Behavior, BehaviorMeta, ButtonDefinition, ButtonId, Signal};
use crate::gesture::LongPressDetector;
use crate::navigation::{Navigator, NoopNavigator};
use crate::presentation::{self, PresentationResult, PresentationSignals};
use crate::sequencer::{CancellationToken, MacroContext, MacroSequencer, StepOutcome};
use crate::state::{RuntimeState, RuntimeStateStore};
use crate::telemetry::{LogDraft, StructuredLogEntry, StructuredLogRecorder};
use crate::time::PanelInstant;

mod transition;

pub use transition::TEMPLATE_NAMES;

/// How long `recently_completed` stays set after a completion.
pub const RECENT_COMPLETION_WINDOW: Duration = Duration::from_millis(900);
/// Energy added to the accumulator by each completion.
pub const ENERGY_STEP: u8 = 20;
/// Suffix appended to the label of a duplicated button.
pub const DUPLICATE_SUFFIX: &str = " (copy)";

/// Precondition that blocked a press.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GuardRejection {
    LimitReached,
    TaskCompleted,
    SecretLocked,
}

impl GuardRejection {
    /// Line appended to the button's macro log when the press is rejected.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            GuardRejection::LimitReached => "Limit reached: action blocked",
            GuardRejection::TaskCompleted => "Task already completed: nothing to do",
            GuardRejection::SecretLocked => "Locked: hold for two seconds to unlock",
        }
    }
}

impl fmt::Display for GuardRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// What a press did.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PressOutcome {
    /// The button was already processing; nothing changed.
    Ignored,
    Rejected(GuardRejection),
    /// Input mode is now waiting for a value.
    AwaitingInput,
    /// Input mode is waiting and the value is still blank.
    InputRequired,
    /// A macro run is in flight; it completes through [`ActionExecutor::poll`].
    Sequencing(CancellationToken),
    Completed,
}

/// Failure of a list operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExecutorError {
    UnknownButton(ButtonId),
    DuplicateButton(ButtonId),
    /// A reorder list was not a permutation of the live ids.
    InvalidOrder,
    /// No id above the largest live one is left for a copy.
    IdsExhausted,
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorError::UnknownButton(id) => write!(f, "unknown button {id}"),
            ExecutorError::DuplicateButton(id) => write!(f, "button {id} already exists"),
            ExecutorError::InvalidOrder => {
                f.write_str("order must list every button exactly once")
            }
            ExecutorError::IdsExhausted => f.write_str("no button id left for a copy"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
enum TimerKind {
    MacroStep,
    LongPress,
    RecentClear,
}

/// Runs presses and timers for a panel of buttons.
pub struct ActionExecutor<I, N = NoopNavigator> {
    definitions: Vec<ButtonDefinition>,
    meta: BehaviorMeta,
    store: RuntimeStateStore<I>,
    long_press: LongPressDetector<I>,
    sequencer: MacroSequencer<I>,
    recent: BTreeMap<ButtonId, I>,
    log: StructuredLogRecorder<I>,
    navigator: N,
}

impl<I: PanelInstant> ActionExecutor<I, NoopNavigator> {
    /// Creates an executor with no buttons whose links go nowhere.
    #[must_use]
    pub fn new(meta: BehaviorMeta) -> Self {
        Self::with_navigator(meta, NoopNavigator)
    }
}

impl<I: PanelInstant, N: Navigator> ActionExecutor<I, N> {
    pub fn with_navigator(meta: BehaviorMeta, navigator: N) -> Self {
        Self {
            definitions: Vec::new(),
            meta,
            store: RuntimeStateStore::new(),
            long_press: LongPressDetector::new(),
            sequencer: MacroSequencer::new(),
            recent: BTreeMap::new(),
            log: StructuredLogRecorder::new(),
            navigator,
        }
    }

    pub fn definitions(&self) -> &[ButtonDefinition] {
        &self.definitions
    }

    pub fn definition(&self, id: ButtonId) -> Option<&ButtonDefinition> {
        self.definitions.iter().find(|definition| definition.id == id)
    }

    pub fn ids(&self) -> Vec<ButtonId> {
        self.definitions.iter().map(|definition| definition.id).collect()
    }

    pub fn meta(&self) -> &BehaviorMeta {
        &self.meta
    }

    /// Swaps the panel-wide behavior bundle. Runtime state is untouched.
    pub fn set_meta(&mut self, meta: BehaviorMeta) {
        self.meta = meta;
    }

    pub fn set_signal(&mut self, signal: Signal, enabled: bool) {
        debug!("signal {signal} -> {enabled}");
        self.meta.set_signal(signal, enabled);
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut N {
        &mut self.navigator
    }

    /// Runtime state of `id`; defaults when the button has none.
    pub fn state(&self, id: ButtonId) -> &RuntimeState<I> {
        self.store.get(id)
    }

    pub fn store(&self) -> &RuntimeStateStore<I> {
        &self.store
    }

    /// Returns `true` while `id` has a macro run in flight.
    pub fn is_sequencing(&self, id: ButtonId) -> bool {
        self.sequencer.is_running(id)
    }

    /// Returns `true` while `id` has an armed long-press timer.
    pub fn is_holding(&self, id: ButtonId) -> bool {
        self.long_press.is_armed(id)
    }

    /// Replaces the button list wholesale, discarding all runtime state.
    pub fn load_buttons(&mut self, definitions: Vec<ButtonDefinition>) -> Result<(), ExecutorError> {
        check_unique(&definitions)?;
        self.teardown();
        self.store.clear();
        self.definitions = definitions;
        let ids = self.ids();
        self.store.ensure(&ids);
        info!("loaded {} buttons", self.definitions.len());
        Ok(())
    }

    /// Applies an edited button list; surviving ids keep their state.
    pub fn sync_buttons(&mut self, definitions: Vec<ButtonDefinition>) -> Result<(), ExecutorError> {
        check_unique(&definitions)?;
        self.definitions = definitions;
        let ids = self.ids();
        let removed = self.store.ensure(&ids);
        for id in removed {
            self.cancel_timers(id);
        }
        Ok(())
    }

    pub fn add_button(&mut self, definition: ButtonDefinition) -> Result<(), ExecutorError> {
        if self.definition(definition.id).is_some() {
            return Err(ExecutorError::DuplicateButton(definition.id));
        }
        let id = definition.id;
        self.definitions.push(definition);
        let ids = self.ids();
        self.store.ensure(&ids);
        debug!("button {id} added");
        Ok(())
    }

    /// Copies the definition of `id` under the next free id with fresh state.
    ///
    /// The copy is inserted right after its source.
    pub fn duplicate_button(&mut self, id: ButtonId) -> Result<ButtonId, ExecutorError> {
        let position = self.position(id)?;
        let next = self
            .definitions
            .iter()
            .map(|definition| definition.id.get())
            .max()
            .map_or(Some(1), |max| max.checked_add(1))
            .ok_or(ExecutorError::IdsExhausted)?;
        let new_id = ButtonId(next);

        let mut copy = self.definitions[position].clone();
        copy.id = new_id;
        copy.label.push_str(DUPLICATE_SUFFIX);
        self.definitions.insert(position + 1, copy);
        let ids = self.ids();
        self.store.ensure(&ids);
        debug!("button {id} duplicated as {new_id}");
        Ok(new_id)
    }

    /// Removes a button, cancelling its timers and discarding its state.
    pub fn remove_button(&mut self, id: ButtonId) -> Result<ButtonDefinition, ExecutorError> {
        let position = self.position(id)?;
        self.cancel_timers(id);
        self.store.remove(id);
        debug!("button {id} removed");
        Ok(self.definitions.remove(position))
    }

    /// Replaces the definition with the same id. Runtime state survives.
    pub fn update_definition(&mut self, definition: ButtonDefinition) -> Result<(), ExecutorError> {
        let position = self.position(definition.id)?;
        self.definitions[position] = definition;
        Ok(())
    }

    /// Reorders the list to match `order`, which must list every id once.
    pub fn reorder(&mut self, order: &[ButtonId]) -> Result<(), ExecutorError> {
        if order.len() != self.definitions.len() {
            return Err(ExecutorError::InvalidOrder);
        }
        let mut reordered = Vec::with_capacity(order.len());
        for id in order {
            if reordered.iter().any(|definition: &ButtonDefinition| definition.id == *id) {
                return Err(ExecutorError::InvalidOrder);
            }
            let definition = self.definition(*id).ok_or(ExecutorError::InvalidOrder)?;
            reordered.push(definition.clone());
        }
        self.definitions = reordered;
        Ok(())
    }

    /// Edits the pending input value of `id`.
    pub fn set_input(&mut self, id: ButtonId, text: &str) -> Result<(), ExecutorError> {
        self.position(id)?;
        let text = String::from(text);
        self.store.update(id, |state: &mut RuntimeState<I>| {
            state.input_value = text;
        });
        Ok(())
    }

    /// Runs a press on `id` at `now`, after firing every timer due by then.
    pub fn press(&mut self, id: ButtonId, now: I) -> Result<PressOutcome, ExecutorError> {
        self.position(id)?;
        self.poll(now);
        let definition = self.definition(id).ok_or(ExecutorError::UnknownButton(id))?;
        let state = self.store.get(id);

        if state.processing {
            debug!("button {id} pressed while processing; ignored");
            return Ok(PressOutcome::Ignored);
        }

        let sync = self.meta.sync();
        let rejection = if sync.limit_reached {
            Some(GuardRejection::LimitReached)
        } else if sync.task_completed {
            Some(GuardRejection::TaskCompleted)
        } else if definition.behavior == Behavior::Secret && !state.secret_unlocked {
            Some(GuardRejection::SecretLocked)
        } else {
            None
        };
        if let Some(rejection) = rejection {
            debug!("button {id} rejected: {rejection}");
            self.store.update(id, |state: &mut RuntimeState<I>| {
                state.macro_log.push(rejection.message());
            });
            return Ok(PressOutcome::Rejected(rejection));
        }

        let input = if self.meta.input_mode.is_some() {
            if !state.awaiting_input {
                self.store.update(id, |state: &mut RuntimeState<I>| {
                    state.awaiting_input = true;
                });
                return Ok(PressOutcome::AwaitingInput);
            }
            let value = state.input_value.trim();
            if value.is_empty() {
                return Ok(PressOutcome::InputRequired);
            }
            Some(String::from(value))
        } else {
            None
        };

        let actions = self.meta.macro_actions_for(&definition.behavior);
        let link = definition.link().map(String::from);
        self.store.update(id, |state: &mut RuntimeState<I>| {
            state.processing = true;
            state.awaiting_input = false;
        });

        if let Some(actions) = actions {
            let context = MacroContext {
                input,
                url: link,
                toggle_labels: self.meta.toggle_mode.clone(),
            };
            let token = match self.sequencer.start(id, actions, context, now) {
                Ok(token) => token,
                Err(busy) => {
                    warn!("{busy}");
                    return Ok(PressOutcome::Ignored);
                }
            };
            self.drive_macro(id, now);
            return Ok(if self.sequencer.is_running(id) {
                PressOutcome::Sequencing(token)
            } else {
                PressOutcome::Completed
            });
        }

        if let Some(url) = link {
            if let Err(error) = self.navigator.open(&url) {
                warn!("navigation for button {id} failed: {error}");
            }
        }
        self.complete(id, now);
        Ok(PressOutcome::Completed)
    }

    /// Begins a long-press gesture. Only locked `Secret` buttons arm a timer.
    pub fn press_start(&mut self, id: ButtonId, now: I) -> Result<bool, ExecutorError> {
        self.position(id)?;
        self.poll(now);
        let definition = self.definition(id).ok_or(ExecutorError::UnknownButton(id))?;
        if definition.behavior != Behavior::Secret || self.store.get(id).secret_unlocked {
            return Ok(false);
        }
        self.long_press.press_start(id, now);
        Ok(true)
    }

    /// Ends a long-press gesture. Returns `true` if a pending timer was disarmed.
    pub fn press_end(&mut self, id: ButtonId) -> Result<bool, ExecutorError> {
        self.position(id)?;
        Ok(self.long_press.press_end(id))
    }

    /// Earliest pending deadline across all timers.
    pub fn next_deadline(&self) -> Option<I> {
        self.next_timer().map(|(deadline, _, _)| deadline)
    }

    /// Fires every timer due at `now`, earliest first. Returns how many fired.
    pub fn poll(&mut self, now: I) -> usize {
        let mut fired = 0;
        while let Some((deadline, id, kind)) = self.next_timer() {
            if deadline > now {
                break;
            }
            fired += 1;
            match kind {
                TimerKind::MacroStep => self.step_macro(id),
                TimerKind::LongPress => {
                    if self.long_press.take_due(id, deadline).is_some() {
                        info!("button {id} unlocked");
                        self.store.update(id, |state: &mut RuntimeState<I>| {
                            state.secret_unlocked = true;
                            state.macro_log.push("Secret unlocked");
                        });
                    }
                }
                TimerKind::RecentClear => {
                    self.recent.remove(&id);
                    self.store.update(id, |state: &mut RuntimeState<I>| {
                        state.recently_completed = false;
                    });
                }
            }
        }
        fired
    }

    /// Presentation overrides for `id` under the current inputs.
    pub fn presentation(&self, id: ButtonId) -> Result<PresentationResult, ExecutorError> {
        let definition = self.definition(id).ok_or(ExecutorError::UnknownButton(id))?;
        let items = definition.behavior.playlist_items();
        Ok(presentation::resolve(
            definition,
            self.store.get(id),
            &self.meta.cycle_presets,
            &items,
            &PresentationSignals::from_meta(&self.meta),
        ))
    }

    /// Structured log window, oldest first.
    pub fn structured_log(&self) -> Vec<StructuredLogEntry<I>> {
        self.log.oldest_first().cloned().collect()
    }

    pub fn clear_structured_log(&mut self) {
        self.log.clear();
    }

    /// Cancels every timer and macro run. Runtime state is left as it is.
    pub fn teardown(&mut self) {
        self.sequencer.cancel_all();
        self.long_press.cancel_all();
        self.recent.clear();
        debug!("executor torn down");
    }

    fn position(&self, id: ButtonId) -> Result<usize, ExecutorError> {
        self.definitions
            .iter()
            .position(|definition| definition.id == id)
            .ok_or(ExecutorError::UnknownButton(id))
    }

    fn cancel_timers(&mut self, id: ButtonId) {
        self.sequencer.cancel(id);
        self.long_press.cancel(id);
        self.recent.remove(&id);
    }

    fn next_timer(&self) -> Option<(I, ButtonId, TimerKind)> {
        let macro_step = self
            .sequencer
            .next_deadline()
            .map(|(deadline, id)| (deadline, id, TimerKind::MacroStep));
        let long_press = self
            .long_press
            .next_deadline()
            .map(|(deadline, id)| (deadline, id, TimerKind::LongPress));
        let recent = self
            .recent
            .iter()
            .map(|(&id, &deadline)| (deadline, id, TimerKind::RecentClear))
            .min();
        [macro_step, long_press, recent].into_iter().flatten().min()
    }

    /// Runs every step of the macro for `id` that is due at `now`.
    fn drive_macro(&mut self, id: ButtonId, now: I) {
        while self
            .sequencer
            .run(id)
            .is_some_and(|run| run.resume_at() <= now)
        {
            self.step_macro(id);
        }
    }

    fn step_macro(&mut self, id: ButtonId) {
        let Some(resume_at) = self.sequencer.run(id).map(|run| run.resume_at()) else {
            return;
        };
        match self.sequencer.advance(id, &mut self.store, &mut self.navigator) {
            Some(StepOutcome::Finished) => self.complete(id, resume_at),
            Some(StepOutcome::Cancelled) => {
                if self.store.contains(id) {
                    self.store.update(id, |state: &mut RuntimeState<I>| {
                        state.processing = false;
                    });
                }
            }
            Some(StepOutcome::Waiting(_)) | None => {}
        }
    }

    /// Applies the completion transition for `id`, stamped at `at`.
    fn complete(&mut self, id: ButtonId, at: I) {
        let Some(definition) = self.definition(id).cloned() else {
            return;
        };
        let playlist = definition.behavior.playlist_items();
        let preset_count = self.meta.cycle_presets.len();
        let toggle = self.meta.toggle_mode.clone();

        let mut action = None;
        let mut input = None;
        let state = self.store.update(id, |state: &mut RuntimeState<I>| {
            if preset_count > 0 {
                state.cycle_index = (state.cycle_index + 1) % preset_count;
            }
            if let Some(toggle) = &toggle {
                state.is_active = !state.is_active;
                state
                    .macro_log
                    .push(format!("Status: {}", toggle.label_for(state.is_active)));
            }
            action = transition::apply(&definition, state, &playlist);

            state.badge_count = state.badge_count.saturating_add(1);
            state.last_complete_at = Some(at);
            state.recently_completed = true;
            state.animation_key = state.animation_key.wrapping_add(1);
            state.charge(ENERGY_STEP);
            let submitted = core::mem::take(&mut state.input_value);
            if !submitted.trim().is_empty() {
                input = Some(String::from(submitted.trim()));
            }
            state.processing = false;
        });
        let playlist_index = state.playlist_index;
        let badge_count = state.badge_count;

        self.recent.insert(id, at + RECENT_COMPLETION_WINDOW);
        info!("button {id} completed (badge {badge_count})");

        if self.meta.structured_logging {
            let playlist_item = match definition.behavior {
                Behavior::Playlist { .. } => playlist.get(playlist_index).cloned(),
                _ => None,
            };
            self.log.append(LogDraft {
                button: id,
                button_label: definition.label.clone(),
                timestamp: at,
                action: action.unwrap_or_else(|| definition.label.clone()),
                behavior: definition.behavior.kind(),
                input,
                playlist_item,
            });
        }
    }
}

fn check_unique(definitions: &[ButtonDefinition]) -> Result<(), ExecutorError> {
    for (index, definition) in definitions.iter().enumerate() {
        if definitions[..index]
            .iter()
            .any(|earlier| earlier.id == definition.id)
        {
            return Err(ExecutorError::DuplicateButton(definition.id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{InputMode, MacroAction, MacroMode, ToggleMode};
    use crate::navigation::RecordingNavigator;
    use crate::time::SimInstant;
    use alloc::vec;

    fn ms(value: u64) -> SimInstant {
        SimInstant::from_millis(value)
    }

    fn panel(meta: BehaviorMeta, buttons: Vec<ButtonDefinition>) -> ActionExecutor<SimInstant> {
        let mut executor = ActionExecutor::new(meta);
        executor.load_buttons(buttons).expect("unique ids");
        executor
    }

    #[test]
    fn direct_press_completes_immediately() {
        let mut executor = panel(
            BehaviorMeta::default(),
            vec![ButtonDefinition::new(ButtonId(1), "Water", Behavior::Counter)],
        );

        assert_eq!(executor.press(ButtonId(1), ms(10)), Ok(PressOutcome::Completed));
        let state = executor.state(ButtonId(1));
        assert_eq!(state.counter_value, 1);
        assert_eq!(state.badge_count, 1);
        assert_eq!(state.energy_charge, ENERGY_STEP);
        assert_eq!(state.last_complete_at, Some(ms(10)));
        assert!(state.recently_completed);
        assert!(!state.processing);
    }

    #[test]
    fn recent_flag_clears_after_window_unless_superseded() {
        let mut executor = panel(
            BehaviorMeta::default(),
            vec![ButtonDefinition::new(ButtonId(1), "Go", Behavior::Custom)],
        );
        executor.press(ButtonId(1), ms(0)).expect("known button");
        executor.press(ButtonId(1), ms(500)).expect("known button");

        executor.poll(ms(900));
        assert!(executor.state(ButtonId(1)).recently_completed);

        assert_eq!(executor.next_deadline(), Some(ms(1_400)));
        executor.poll(ms(1_400));
        assert!(!executor.state(ButtonId(1)).recently_completed);
        assert_eq!(executor.next_deadline(), None);
    }

    #[test]
    fn guard_order_reports_limit_before_completion() {
        let mut meta = BehaviorMeta::default();
        meta.set_signal(Signal::LimitReached, true);
        meta.set_signal(Signal::TaskCompleted, true);
        let mut executor = panel(
            meta,
            vec![ButtonDefinition::new(ButtonId(1), "Vault", Behavior::Secret)],
        );

        assert_eq!(
            executor.press(ButtonId(1), ms(0)),
            Ok(PressOutcome::Rejected(GuardRejection::LimitReached))
        );
        executor.set_signal(Signal::LimitReached, false);
        assert_eq!(
            executor.press(ButtonId(1), ms(0)),
            Ok(PressOutcome::Rejected(GuardRejection::TaskCompleted))
        );
        executor.set_signal(Signal::TaskCompleted, false);
        assert_eq!(
            executor.press(ButtonId(1), ms(0)),
            Ok(PressOutcome::Rejected(GuardRejection::SecretLocked))
        );
        assert_eq!(executor.state(ButtonId(1)).macro_log.len(), 3);
    }

    #[test]
    fn input_mode_waits_for_a_value() {
        let meta = BehaviorMeta {
            input_mode: Some(InputMode::default()),
            structured_logging: true,
            ..BehaviorMeta::default()
        };
        let mut executor = panel(
            meta,
            vec![ButtonDefinition::new(ButtonId(1), "Capture", Behavior::CreatePage)],
        );

        assert_eq!(executor.press(ButtonId(1), ms(0)), Ok(PressOutcome::AwaitingInput));
        assert_eq!(executor.press(ButtonId(1), ms(1)), Ok(PressOutcome::InputRequired));
        executor.set_input(ButtonId(1), "  ").expect("known button");
        assert_eq!(executor.press(ButtonId(1), ms(2)), Ok(PressOutcome::InputRequired));

        executor.set_input(ButtonId(1), "Buy milk").expect("known button");
        assert_eq!(executor.press(ButtonId(1), ms(3)), Ok(PressOutcome::Completed));

        let state = executor.state(ButtonId(1));
        assert!(!state.awaiting_input);
        assert!(state.input_value.is_empty());
        let log = executor.structured_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].input.as_deref(), Some("Buy milk"));
        assert_eq!(log[0].action, "Page created: Capture");
    }

    #[test]
    fn macro_completes_after_last_delay() {
        let meta = BehaviorMeta {
            macro_mode: Some(MacroMode {
                actions: vec![
                    MacroAction::log("Step one", Duration::from_millis(100)),
                    MacroAction::log("Step two", Duration::from_millis(100)),
                ],
            }),
            toggle_mode: Some(ToggleMode::default()),
            ..BehaviorMeta::default()
        };
        let mut executor = panel(
            meta,
            vec![ButtonDefinition::new(ButtonId(1), "Run", Behavior::Custom)],
        );

        let outcome = executor.press(ButtonId(1), ms(0)).expect("known button");
        assert!(matches!(outcome, PressOutcome::Sequencing(_)));
        assert_eq!(executor.press(ButtonId(1), ms(50)), Ok(PressOutcome::Ignored));

        executor.poll(ms(150));
        assert!(executor.state(ButtonId(1)).processing);

        executor.poll(ms(400));
        let state = executor.state(ButtonId(1));
        assert!(!state.processing);
        assert_eq!(state.last_complete_at, Some(ms(200)));
        assert_eq!(
            state.macro_log.to_vec(),
            vec!["Step one", "Step two", "Status: Active"]
        );
    }

    #[test]
    fn navigation_failure_does_not_block_completion() {
        let mut executor = ActionExecutor::with_navigator(
            BehaviorMeta::default(),
            RecordingNavigator::failing(),
        );
        executor
            .load_buttons(vec![
                ButtonDefinition::new(ButtonId(1), "Docs", Behavior::Navigation)
                    .with_url("https://example.com/docs"),
            ])
            .expect("unique ids");

        assert_eq!(executor.press(ButtonId(1), ms(0)), Ok(PressOutcome::Completed));
        assert_eq!(executor.navigator().opened(), ["https://example.com/docs"]);
        assert_eq!(
            executor.state(ButtonId(1)).macro_log.latest(),
            Some("Navigated to https://example.com/docs")
        );
    }

    #[test]
    fn duplicate_gets_fresh_state_and_next_id() {
        let mut executor = panel(
            BehaviorMeta::default(),
            vec![
                ButtonDefinition::new(ButtonId(3), "Water", Behavior::Counter),
                ButtonDefinition::new(ButtonId(7), "Theme", Behavior::ThemeToggle),
            ],
        );
        executor.press(ButtonId(3), ms(0)).expect("known button");

        let copy = executor.duplicate_button(ButtonId(3)).expect("known button");
        assert_eq!(copy, ButtonId(8));
        assert_eq!(executor.ids(), vec![ButtonId(3), ButtonId(8), ButtonId(7)]);
        assert_eq!(
            executor.definition(copy).map(|definition| definition.label.as_str()),
            Some("Water (copy)")
        );
        assert_eq!(executor.state(copy), &RuntimeState::default());
        assert_eq!(executor.state(ButtonId(3)).counter_value, 1);
    }

    #[test]
    fn duplicate_refuses_to_reuse_the_largest_id() {
        let mut executor = panel(
            BehaviorMeta::default(),
            vec![ButtonDefinition::new(ButtonId(u32::MAX), "Last", Behavior::Counter)],
        );

        assert_eq!(
            executor.duplicate_button(ButtonId(u32::MAX)),
            Err(ExecutorError::IdsExhausted)
        );
        assert_eq!(executor.ids(), vec![ButtonId(u32::MAX)]);
    }

    #[test]
    fn list_operations_validate_ids() {
        let mut executor = panel(
            BehaviorMeta::default(),
            vec![
                ButtonDefinition::new(ButtonId(1), "A", Behavior::Custom),
                ButtonDefinition::new(ButtonId(2), "B", Behavior::Custom),
            ],
        );

        assert_eq!(
            executor.add_button(ButtonDefinition::new(ButtonId(2), "B", Behavior::Custom)),
            Err(ExecutorError::DuplicateButton(ButtonId(2)))
        );
        assert_eq!(
            executor.press(ButtonId(9), ms(0)),
            Err(ExecutorError::UnknownButton(ButtonId(9)))
        );
        assert_eq!(
            executor.reorder(&[ButtonId(1), ButtonId(1)]),
            Err(ExecutorError::InvalidOrder)
        );
        executor.reorder(&[ButtonId(2), ButtonId(1)]).expect("permutation");
        assert_eq!(executor.ids(), vec![ButtonId(2), ButtonId(1)]);
    }

    #[test]
    fn edits_keep_state_and_wholesale_load_resets_it() {
        let mut executor = panel(
            BehaviorMeta::default(),
            vec![ButtonDefinition::new(ButtonId(1), "Water", Behavior::Counter)],
        );
        executor.press(ButtonId(1), ms(0)).expect("known button");

        executor
            .update_definition(ButtonDefinition::new(ButtonId(1), "Tea", Behavior::Counter))
            .expect("known button");
        executor
            .sync_buttons(vec![
                ButtonDefinition::new(ButtonId(1), "Tea", Behavior::Counter),
                ButtonDefinition::new(ButtonId(2), "New", Behavior::Custom),
            ])
            .expect("unique ids");
        assert_eq!(executor.state(ButtonId(1)).counter_value, 1);
        assert_eq!(
            executor.presentation(ButtonId(1)).expect("known").label.as_deref(),
            Some("Tea 1")
        );

        executor
            .load_buttons(vec![ButtonDefinition::new(ButtonId(1), "Tea", Behavior::Counter)])
            .expect("unique ids");
        assert_eq!(executor.state(ButtonId(1)).counter_value, 0);
        assert_eq!(executor.next_deadline(), None);
    }
}
