//! Cancellable macro sequences with timed steps.
//!
//! A run is a cursor over an ordered list of [`MacroAction`]s plus the instant
//! at which its next suspension ends. Hosts find the earliest pending resume
//! through [`MacroSequencer::next_deadline`] and call
//! [`MacroSequencer::advance`] when it is reached. Every run owns a
//! [`CancellationToken`]; a cancelled run is dropped at its next resume point
//! without touching runtime state.
//!
//! Each step writes its line to the button's macro log, performs its side
//! effect, and then suspends for the step's delay. The run finishes when the
//! delay of the last step has elapsed.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use log::{debug, warn};
use portable_atomic::{AtomicBool, Ordering};

use crate::behavior::{ButtonId, MacroAction, MacroActionKind, ToggleMode};
use crate::navigation::Navigator;
use crate::state::{RuntimeState, RuntimeStateStore};
use crate::time::PanelInstant;

/// Placeholder replaced by the pending input value in step labels.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Shared flag checked by a run before every resumption.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl PartialEq for CancellationToken {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

impl Eq for CancellationToken {}

/// Per-run values captured when the press starts.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MacroContext {
    /// Input value substituted into step labels, if any.
    pub input: Option<String>,
    /// Link opened by `openLink` steps.
    pub url: Option<String>,
    /// Status labels used when recording toggle steps.
    pub toggle_labels: Option<ToggleMode>,
}

impl MacroContext {
    /// Step label with the input value substituted in.
    #[must_use]
    pub fn render_label(&self, label: &str) -> String {
        match self.input.as_deref().map(str::trim) {
            Some(input) if !input.is_empty() => {
                if label.contains(INPUT_PLACEHOLDER) {
                    label.replace(INPUT_PLACEHOLDER, input)
                } else {
                    format!("{label}: {input}")
                }
            }
            _ => String::from(label),
        }
    }

    fn toggle_status(&self, active: bool) -> &str {
        match &self.toggle_labels {
            Some(labels) => labels.label_for(active),
            None if active => "on",
            None => "off",
        }
    }
}

/// Returned by [`MacroSequencer::start`] while a run is already in flight.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SequencerBusy(pub ButtonId);

impl fmt::Display for SequencerBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "button {} already has a macro in flight", self.0)
    }
}

/// Result of resuming a run.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StepOutcome<I> {
    /// A step ran; the run suspends until the given instant.
    Waiting(I),
    /// The final delay elapsed; the run is gone.
    Finished,
    /// The token was cancelled; the run is gone and nothing was applied.
    Cancelled,
}

/// In-flight macro run for one button.
#[derive(Clone, Debug)]
pub struct MacroRun<I> {
    actions: Vec<MacroAction>,
    context: MacroContext,
    next_step: usize,
    resume_at: I,
    token: CancellationToken,
}

impl<I: Copy> MacroRun<I> {
    #[must_use]
    pub fn resume_at(&self) -> I {
        self.resume_at
    }
}

/// Drives macro runs for every button.
pub struct MacroSequencer<I> {
    runs: BTreeMap<ButtonId, MacroRun<I>>,
}

impl<I: PanelInstant> MacroSequencer<I> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            runs: BTreeMap::new(),
        }
    }

    /// Registers a run whose first step is due at `now`.
    pub fn start(
        &mut self,
        button: ButtonId,
        actions: Vec<MacroAction>,
        context: MacroContext,
        now: I,
    ) -> Result<CancellationToken, SequencerBusy> {
        if self.runs.contains_key(&button) {
            return Err(SequencerBusy(button));
        }
        let token = CancellationToken::new();
        debug!("macro started for button {button} with {} steps", actions.len());
        self.runs.insert(
            button,
            MacroRun {
                actions,
                context,
                next_step: 0,
                resume_at: now,
                token: token.clone(),
            },
        );
        Ok(token)
    }

    /// Cancels and drops the run for `button`. Returns `true` if one existed.
    pub fn cancel(&mut self, button: ButtonId) -> bool {
        match self.runs.remove(&button) {
            Some(run) => {
                run.token.cancel();
                debug!("macro cancelled for button {button}");
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for run in self.runs.values() {
            run.token.cancel();
        }
        self.runs.clear();
    }

    #[must_use]
    pub fn is_running(&self, button: ButtonId) -> bool {
        self.runs.contains_key(&button)
    }

    #[must_use]
    pub fn run(&self, button: ButtonId) -> Option<&MacroRun<I>> {
        self.runs.get(&button)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Earliest resume instant across all runs (lowest id wins ties).
    #[must_use]
    pub fn next_deadline(&self) -> Option<(I, ButtonId)> {
        self.runs
            .iter()
            .map(|(&id, run)| (run.resume_at, id))
            .min()
    }

    /// Resumes the run for `button` at its scheduled instant.
    ///
    /// Returns `None` when the button has no run.
    pub fn advance<N: Navigator>(
        &mut self,
        button: ButtonId,
        store: &mut RuntimeStateStore<I>,
        navigator: &mut N,
    ) -> Option<StepOutcome<I>> {
        let run = self.runs.get_mut(&button)?;

        if run.token.is_cancelled() {
            self.runs.remove(&button);
            debug!("macro for button {button} observed cancellation");
            return Some(StepOutcome::Cancelled);
        }

        let Some(action) = run.actions.get(run.next_step) else {
            self.runs.remove(&button);
            return Some(StepOutcome::Finished);
        };

        let label = run.context.render_label(&action.label);
        match action.kind {
            MacroActionKind::Log => {
                store.update(button, |state: &mut RuntimeState<I>| {
                    state.macro_log.push(label);
                });
            }
            MacroActionKind::Toggle => {
                let context = &run.context;
                store.update(button, |state: &mut RuntimeState<I>| {
                    state.is_active = !state.is_active;
                    let status = context.toggle_status(state.is_active);
                    state.macro_log.push(format!("{label}: {status}"));
                });
            }
            MacroActionKind::OpenLink => {
                let line = match run.context.url.as_deref() {
                    Some(url) if !url.trim().is_empty() => {
                        if let Err(error) = navigator.open(url.trim()) {
                            warn!("macro link for button {button} failed: {error}");
                        }
                        format!("{label}: {}", url.trim())
                    }
                    _ => format!("{label}: no link configured"),
                };
                store.update(button, |state: &mut RuntimeState<I>| {
                    state.macro_log.push(line);
                });
            }
        }

        run.resume_at = run.resume_at + action.delay;
        run.next_step += 1;
        Some(StepOutcome::Waiting(run.resume_at))
    }
}

impl<I: PanelInstant> Default for MacroSequencer<I> {
    fn default() -> Self {
        Self::new()
    }
}
