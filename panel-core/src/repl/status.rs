//! Shared status surface for the REPL.
//!
//! [`ButtonStatus`] captures everything a front-end shows for one button and
//! [`StatusFormatter`] renders it into any [`core::fmt::Write`] sink. The
//! emulator builds its status and log output from these writers.

use core::fmt;
use core::time::Duration;

use crate::behavior::{ButtonDefinition, ButtonId};
use crate::executor::{ActionExecutor, ExecutorError};
use crate::navigation::Navigator;
use crate::presentation::{PresentationResult, StyleSource};
use crate::state::RuntimeState;
use crate::telemetry::StructuredLogEntry;
use crate::time::PanelInstant;

use super::catalog::{self, CommandSpec};

/// Snapshot of one button as seen by an operator.
#[derive(Clone, Debug)]
pub struct ButtonStatus<'a, I> {
    pub definition: &'a ButtonDefinition,
    pub state: &'a RuntimeState<I>,
    pub presentation: PresentationResult,
    pub sequencing: bool,
    pub holding: bool,
}

impl<'a, I: PanelInstant> ButtonStatus<'a, I> {
    /// Captures the current status of `id`.
    pub fn capture<N: Navigator>(
        executor: &'a ActionExecutor<I, N>,
        id: ButtonId,
    ) -> Result<Self, ExecutorError> {
        let definition = executor
            .definition(id)
            .ok_or(ExecutorError::UnknownButton(id))?;
        Ok(Self {
            definition,
            state: executor.state(id),
            presentation: executor.presentation(id)?,
            sequencing: executor.is_sequencing(id),
            holding: executor.is_holding(id),
        })
    }
}

/// Helper that renders a [`ButtonStatus`] into human-readable lines.
#[derive(Clone, Copy, Debug)]
pub struct StatusFormatter<'s, 'a, I> {
    status: &'s ButtonStatus<'a, I>,
}

impl<'s, 'a, I> StatusFormatter<'s, 'a, I> {
    #[must_use]
    pub const fn new(status: &'s ButtonStatus<'a, I>) -> Self {
        Self { status }
    }

    /// Writes the face line (e.g. `[1] "Water 3" icon=💧 badge=3 style=#1f2937/#f9fafb/#374151`).
    pub fn write_button_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        let definition = self.status.definition;
        let presentation = &self.status.presentation;
        write!(
            writer,
            "[{}] \"{}\" {}",
            definition.id,
            presentation.label_or(definition),
            definition.behavior.kind()
        )?;

        let icon = presentation.icon_or(definition);
        if !icon.is_empty() {
            write!(writer, " icon={icon}")?;
        }
        if let Some(badge) = &presentation.badge {
            write!(writer, " badge={badge}")?;
        }

        let style = presentation.style_or(definition);
        write!(
            writer,
            " style={}/{}/{}",
            style.background, style.text_color, style.border_color
        )?;
        match presentation.style.as_ref().map(|style| style.source) {
            Some(StyleSource::CyclePreset) => writer.write_str(" (preset)")?,
            Some(StyleSource::DataAware) => writer.write_str(" (warning)")?,
            None => {}
        }
        Ok(())
    }

    /// Writes the tooltip line when the button has one.
    pub fn write_tooltip_line<W: fmt::Write>(&self, writer: &mut W) -> Result<bool, fmt::Error> {
        match &self.status.presentation.tooltip {
            Some(tooltip) => {
                write!(writer, "  tooltip: {tooltip}")?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Writes the counters line (e.g. `  state counter=3 cycle=0 ... flags=recent`).
    pub fn write_state_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        let state = self.status.state;
        write!(
            writer,
            "  state counter={} cycle={} step={} mode={} playlist={} theme={} active={} energy={}",
            state.counter_value,
            state.cycle_index,
            state.cycle_step,
            state.mode_index,
            state.playlist_index,
            state.theme_mode,
            state.is_active,
            state.energy_charge,
        )?;

        let flags = [
            (state.processing, "processing"),
            (self.status.sequencing, "sequencing"),
            (state.awaiting_input, "awaiting"),
            (state.recently_completed, "recent"),
            (state.secret_unlocked, "unlocked"),
            (self.status.holding, "holding"),
            (state.timer_running, "timer"),
        ];
        writer.write_str(" flags=")?;
        let mut any = false;
        for (_, name) in flags.iter().filter(|(set, _)| *set) {
            if any {
                writer.write_char(',')?;
            }
            writer.write_str(name)?;
            any = true;
        }
        if !any {
            writer.write_str("none")?;
        }
        Ok(())
    }

    /// Writes one line per macro log entry, oldest first.
    pub fn write_macro_log<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        for line in self.status.state.macro_log.iter() {
            writeln!(writer, "  > {line}")?;
        }
        Ok(())
    }
}

/// Writes one structured log entry relative to `origin`
/// (e.g. `#3 +1.2s [1] Water counter "Count: 3"`).
pub fn write_log_entry<W, I>(writer: &mut W, entry: &StructuredLogEntry<I>, origin: I) -> fmt::Result
where
    W: fmt::Write,
    I: PanelInstant,
{
    write!(writer, "#{} ", entry.id)?;
    write_duration(writer, entry.timestamp.saturating_duration_since(origin))?;
    write!(
        writer,
        " [{}] {} {} \"{}\"",
        entry.button, entry.button_label, entry.behavior, entry.action
    )?;
    if let Some(input) = &entry.input {
        write!(writer, " input=\"{input}\"")?;
    }
    if let Some(item) = &entry.playlist_item {
        write!(writer, " item=\"{item}\"")?;
    }
    Ok(())
}

/// Writes the help listing, or the usage of a single command.
pub fn write_help<W: fmt::Write>(writer: &mut W, topic: Option<&CommandSpec>) -> fmt::Result {
    match topic {
        Some(spec) => writeln!(writer, "{}: {}", spec.usage, spec.summary),
        None => {
            for spec in catalog::commands() {
                writeln!(writer, "  {:<46} {}", spec.usage, spec.summary)?;
            }
            Ok(())
        }
    }
}

fn write_duration<W: fmt::Write>(writer: &mut W, value: Duration) -> fmt::Result {
    if value >= Duration::from_secs(1) {
        let millis = value.as_millis();
        let seconds = millis / 1_000;
        let tenths = (millis % 1_000) / 100;
        write!(writer, "+{seconds}.{tenths}s")
    } else {
        write!(writer, "+{}ms", value.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{Behavior, BehaviorKind, BehaviorMeta};
    use crate::time::SimInstant;
    use alloc::string::String;
    use alloc::vec;

    fn executor() -> ActionExecutor<SimInstant> {
        let mut executor = ActionExecutor::new(BehaviorMeta::default());
        executor
            .load_buttons(vec![
                ButtonDefinition::new(ButtonId(1), "Water", Behavior::Counter).with_icon("💧"),
            ])
            .expect("unique ids");
        executor
    }

    #[test]
    fn formats_button_and_state_lines() {
        let mut executor = executor();
        executor
            .press(ButtonId(1), SimInstant::ZERO)
            .expect("known button");

        let status = ButtonStatus::capture(&executor, ButtonId(1)).expect("known button");
        let formatter = StatusFormatter::new(&status);

        let mut face = String::new();
        formatter.write_button_line(&mut face).expect("write");
        assert_eq!(
            face,
            "[1] \"Water 1\" counter icon=💧 badge=1 style=#1f2937/#f9fafb/#374151"
        );

        let mut state = String::new();
        formatter.write_state_line(&mut state).expect("write");
        assert!(state.starts_with("  state counter=1 cycle=0"));
        assert!(state.ends_with("energy=20 flags=recent"));

        let mut log = String::new();
        formatter.write_macro_log(&mut log).expect("write");
        assert_eq!(log, "  > Count: 1\n");
    }

    #[test]
    fn unknown_button_cannot_be_captured() {
        let executor = executor();
        assert!(matches!(
            ButtonStatus::capture(&executor, ButtonId(4)),
            Err(ExecutorError::UnknownButton(ButtonId(4)))
        ));
    }

    #[test]
    fn formats_log_entry_relative_to_origin() {
        let entry = StructuredLogEntry {
            id: 3,
            button: ButtonId(2),
            button_label: String::from("Reading"),
            timestamp: SimInstant::from_millis(1_250),
            action: String::from("Now showing: B"),
            behavior: BehaviorKind::Playlist,
            input: None,
            playlist_item: Some(String::from("B")),
        };

        let mut line = String::new();
        write_log_entry(&mut line, &entry, SimInstant::ZERO).expect("write");
        assert_eq!(
            line,
            "#3 +1.2s [2] Reading playlist \"Now showing: B\" item=\"B\""
        );
    }

    #[test]
    fn help_for_single_topic_uses_usage() {
        let mut text = String::new();
        write_help(&mut text, catalog::find("wait")).expect("write");
        assert_eq!(text, "wait <duration>: advance the clock (e.g. 250ms, 2s)\n");
    }
}
