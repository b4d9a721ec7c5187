//! High-level command dispatcher.
//!
//! This module glues parsed commands to a panel by turning them into presses,
//! gestures, list edits, and clock advances. Rendering of the results is left
//! to the front-end, which uses [`super::status`] so every host prints the
//! same text.

use alloc::vec::Vec;
use core::time::Duration;

use crate::behavior::{ButtonId, Signal};
use crate::executor::{ActionExecutor, ExecutorError, PressOutcome};
use crate::navigation::Navigator;
use crate::time::PanelInstant;

use super::catalog::{self, CommandSpec};
use super::grammar::{self, Command};

/// Command execution successes.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandOutcome<Instant> {
    Pressed {
        button: ButtonId,
        outcome: PressOutcome,
    },
    Holding {
        button: ButtonId,
        armed: bool,
    },
    Released {
        button: ButtonId,
        disarmed: bool,
    },
    InputSet {
        button: ButtonId,
    },
    /// The clock advanced to `until`, firing `fired` timers.
    Waited {
        until: Instant,
        fired: usize,
    },
    SignalSet {
        signal: Signal,
        enabled: bool,
    },
    Duplicated {
        source: ButtonId,
        copy: ButtonId,
    },
    Removed {
        button: ButtonId,
    },
    /// Buttons whose status should be shown.
    Status(Vec<ButtonId>),
    Log,
    Help(Option<&'static CommandSpec>),
}

/// Errors surfaced while executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandError<'a> {
    Parse(grammar::ParseError<'a>),
    Panel(ExecutorError),
    Unsupported(&'static str),
}

impl<'a> From<grammar::ParseError<'a>> for CommandError<'a> {
    fn from(error: grammar::ParseError<'a>) -> Self {
        Self::Parse(error)
    }
}

impl From<ExecutorError> for CommandError<'_> {
    fn from(error: ExecutorError) -> Self {
        Self::Panel(error)
    }
}

impl core::fmt::Display for CommandError<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CommandError::Parse(error) => error.fmt(f),
            CommandError::Panel(error) => error.fmt(f),
            CommandError::Unsupported(what) => f.write_str(what),
        }
    }
}

type CommandResult<'a, P> = Result<CommandOutcome<<P as PanelControl>::Instant>, CommandError<'a>>;

/// Operations the dispatcher needs from a panel.
pub trait PanelControl {
    type Instant: PanelInstant;

    fn press(&mut self, button: ButtonId, now: Self::Instant) -> Result<PressOutcome, ExecutorError>;

    fn press_start(&mut self, button: ButtonId, now: Self::Instant) -> Result<bool, ExecutorError>;

    fn press_end(&mut self, button: ButtonId) -> Result<bool, ExecutorError>;

    fn set_input(&mut self, button: ButtonId, text: &str) -> Result<(), ExecutorError>;

    fn set_signal(&mut self, signal: Signal, enabled: bool);

    fn duplicate_button(&mut self, button: ButtonId) -> Result<ButtonId, ExecutorError>;

    fn remove_button(&mut self, button: ButtonId) -> Result<(), ExecutorError>;

    /// Fires every timer due at `now`; returns how many fired.
    fn poll(&mut self, now: Self::Instant) -> usize;

    /// Live button ids in display order.
    fn button_ids(&self) -> Vec<ButtonId>;
}

impl<I, N> PanelControl for ActionExecutor<I, N>
where
    I: PanelInstant,
    N: Navigator,
{
    type Instant = I;

    fn press(&mut self, button: ButtonId, now: I) -> Result<PressOutcome, ExecutorError> {
        ActionExecutor::press(self, button, now)
    }

    fn press_start(&mut self, button: ButtonId, now: I) -> Result<bool, ExecutorError> {
        ActionExecutor::press_start(self, button, now)
    }

    fn press_end(&mut self, button: ButtonId) -> Result<bool, ExecutorError> {
        ActionExecutor::press_end(self, button)
    }

    fn set_input(&mut self, button: ButtonId, text: &str) -> Result<(), ExecutorError> {
        ActionExecutor::set_input(self, button, text)
    }

    fn set_signal(&mut self, signal: Signal, enabled: bool) {
        ActionExecutor::set_signal(self, signal, enabled);
    }

    fn duplicate_button(&mut self, button: ButtonId) -> Result<ButtonId, ExecutorError> {
        ActionExecutor::duplicate_button(self, button)
    }

    fn remove_button(&mut self, button: ButtonId) -> Result<(), ExecutorError> {
        ActionExecutor::remove_button(self, button).map(drop)
    }

    fn poll(&mut self, now: I) -> usize {
        ActionExecutor::poll(self, now)
    }

    fn button_ids(&self) -> Vec<ButtonId> {
        self.ids()
    }
}

/// Dispatches operator commands into a panel.
pub struct CommandExecutor<P> {
    panel: P,
}

impl<P> CommandExecutor<P> {
    /// Creates a new dispatcher around the provided panel.
    pub const fn new(panel: P) -> Self {
        Self { panel }
    }

    /// Returns an immutable reference to the underlying panel.
    pub fn panel(&self) -> &P {
        &self.panel
    }

    /// Returns a mutable reference to the underlying panel.
    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }

    /// Consumes the dispatcher and yields the inner panel.
    pub fn into_inner(self) -> P {
        self.panel
    }
}

impl<P> CommandExecutor<P>
where
    P: PanelControl,
{
    /// Parses and executes a command at `now`.
    ///
    /// Timers due at `now` fire before the command runs.
    pub fn execute<'a>(&mut self, line: &'a str, now: P::Instant) -> CommandResult<'a, P> {
        let command = grammar::parse(line)?;
        // Presses and holds fire due timers themselves; `wait` polls to its end.
        if !matches!(command, Command::Press(_) | Command::Hold(_) | Command::Wait(_)) {
            self.panel.poll(now);
        }
        self.dispatch(command, now)
    }

    fn dispatch<'a>(&mut self, command: Command<'a>, now: P::Instant) -> CommandResult<'a, P> {
        Ok(match command {
            Command::Press(button) => CommandOutcome::Pressed {
                button,
                outcome: self.panel.press(button, now)?,
            },
            Command::Hold(button) => CommandOutcome::Holding {
                button,
                armed: self.panel.press_start(button, now)?,
            },
            Command::Release(button) => CommandOutcome::Released {
                button,
                disarmed: self.panel.press_end(button)?,
            },
            Command::Input { button, text } => {
                self.panel.set_input(button, text)?;
                CommandOutcome::InputSet { button }
            }
            Command::Wait(duration) => self.handle_wait(duration, now),
            Command::Signal { signal, enabled } => {
                self.panel.set_signal(signal, enabled);
                CommandOutcome::SignalSet { signal, enabled }
            }
            Command::Duplicate(button) => CommandOutcome::Duplicated {
                source: button,
                copy: self.panel.duplicate_button(button)?,
            },
            Command::Remove(button) => {
                self.panel.remove_button(button)?;
                CommandOutcome::Removed { button }
            }
            Command::Status(Some(button)) => {
                if !self.panel.button_ids().contains(&button) {
                    return Err(CommandError::Panel(ExecutorError::UnknownButton(button)));
                }
                CommandOutcome::Status(alloc::vec![button])
            }
            Command::Status(None) => CommandOutcome::Status(self.panel.button_ids()),
            Command::Log => CommandOutcome::Log,
            Command::Help { topic: None } => CommandOutcome::Help(None),
            Command::Help { topic: Some(topic) } => match catalog::find(topic) {
                Some(spec) => CommandOutcome::Help(Some(spec)),
                None => return Err(CommandError::Unsupported("no help for that topic")),
            },
        })
    }

    fn handle_wait(&mut self, duration: Duration, now: P::Instant) -> CommandOutcome<P::Instant> {
        let until = now + duration;
        let fired = self.panel.poll(until);
        CommandOutcome::Waited { until, fired }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{Behavior, BehaviorMeta, ButtonDefinition};
    use crate::executor::GuardRejection;
    use crate::time::SimInstant;
    use alloc::vec;

    fn executor() -> CommandExecutor<ActionExecutor<SimInstant>> {
        let mut panel = ActionExecutor::new(BehaviorMeta::default());
        panel
            .load_buttons(vec![
                ButtonDefinition::new(ButtonId(1), "Water", Behavior::Counter),
                ButtonDefinition::new(ButtonId(2), "Vault", Behavior::Secret),
            ])
            .expect("unique ids");
        CommandExecutor::new(panel)
    }

    #[test]
    fn press_dispatches_to_panel() {
        let mut executor = executor();
        let outcome = executor
            .execute("press 1", SimInstant::ZERO)
            .expect("dispatch should succeed");

        assert_eq!(
            outcome,
            CommandOutcome::Pressed {
                button: ButtonId(1),
                outcome: PressOutcome::Completed,
            }
        );
        assert_eq!(executor.panel().state(ButtonId(1)).counter_value, 1);
    }

    #[test]
    fn hold_then_wait_unlocks_secret() {
        let mut executor = executor();
        let outcome = executor
            .execute("hold 2", SimInstant::ZERO)
            .expect("dispatch should succeed");
        assert_eq!(
            outcome,
            CommandOutcome::Holding {
                button: ButtonId(2),
                armed: true,
            }
        );

        let outcome = executor
            .execute("wait 2s", SimInstant::ZERO)
            .expect("dispatch should succeed");
        assert_eq!(
            outcome,
            CommandOutcome::Waited {
                until: SimInstant::from_millis(2_000),
                fired: 1,
            }
        );
        assert!(executor.panel().state(ButtonId(2)).secret_unlocked);
    }

    #[test]
    fn press_after_a_long_hold_needs_no_wait() {
        let mut executor = executor();
        executor
            .execute("hold 2", SimInstant::ZERO)
            .expect("dispatch should succeed");
        let outcome = executor
            .execute("press 2", SimInstant::from_millis(2_500))
            .expect("dispatch should succeed");
        assert_eq!(
            outcome,
            CommandOutcome::Pressed {
                button: ButtonId(2),
                outcome: PressOutcome::Completed,
            }
        );
    }

    #[test]
    fn signal_blocks_following_presses() {
        let mut executor = executor();
        executor
            .execute("signal limit on", SimInstant::ZERO)
            .expect("dispatch should succeed");
        let outcome = executor
            .execute("press 1", SimInstant::ZERO)
            .expect("dispatch should succeed");
        assert_eq!(
            outcome,
            CommandOutcome::Pressed {
                button: ButtonId(1),
                outcome: PressOutcome::Rejected(GuardRejection::LimitReached),
            }
        );
    }

    #[test]
    fn unknown_button_surfaces_panel_error() {
        let mut executor = executor();
        let error = executor
            .execute("remove 9", SimInstant::ZERO)
            .expect_err("button 9 does not exist");
        assert_eq!(error, CommandError::Panel(ExecutorError::UnknownButton(ButtonId(9))));

        let error = executor
            .execute("status 9", SimInstant::ZERO)
            .expect_err("button 9 does not exist");
        assert_eq!(error, CommandError::Panel(ExecutorError::UnknownButton(ButtonId(9))));
    }

    #[test]
    fn status_lists_every_button_and_duplicate_adds_one() {
        let mut executor = executor();
        let outcome = executor
            .execute("duplicate 1", SimInstant::ZERO)
            .expect("dispatch should succeed");
        assert_eq!(
            outcome,
            CommandOutcome::Duplicated {
                source: ButtonId(1),
                copy: ButtonId(3),
            }
        );

        let outcome = executor
            .execute("status", SimInstant::ZERO)
            .expect("dispatch should succeed");
        assert_eq!(
            outcome,
            CommandOutcome::Status(vec![ButtonId(1), ButtonId(3), ButtonId(2)])
        );
    }

    #[test]
    fn parse_error_is_returned() {
        let mut executor = executor();
        let error = executor
            .execute("press later please", SimInstant::ZERO)
            .expect_err("parse should fail");
        assert!(matches!(error, CommandError::Parse(_)));
    }

    #[test]
    fn help_resolves_topics() {
        let mut executor = executor();
        match executor.execute("help wait", SimInstant::ZERO) {
            Ok(CommandOutcome::Help(Some(spec))) => assert_eq!(spec.name, "wait"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(
            executor.execute("help nothing", SimInstant::ZERO),
            Err(CommandError::Unsupported("no help for that topic"))
        );
    }
}
