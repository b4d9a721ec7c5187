use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use log::debug;
use panel_core::behavior::ButtonId;
use panel_core::executor::{ActionExecutor, ExecutorError, PressOutcome};
use panel_core::navigation::RecordingNavigator;
use panel_core::repl::commands::{CommandError, CommandExecutor, CommandOutcome};
use panel_core::repl::status::{self, ButtonStatus, StatusFormatter};
use panel_core::time::{PanelInstant, SimInstant};

use crate::config::Panel;

type Executor = ActionExecutor<SimInstant, RecordingNavigator>;

/// One interactive emulator session on a virtual clock.
///
/// The clock only moves through `wait`, so a transcript replays identically.
pub struct Session {
    executor: CommandExecutor<Executor>,
    clock: SimInstant,
    transcript: Option<TranscriptLogger>,
    command_count: usize,
}

impl Session {
    pub fn new(panel: Panel, transcript: Option<&Path>) -> io::Result<Self> {
        let mut executor = ActionExecutor::with_navigator(panel.meta, RecordingNavigator::new());
        executor
            .load_buttons(panel.buttons)
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error.to_string()))?;
        let transcript = transcript.map(TranscriptLogger::new).transpose()?;

        Ok(Self {
            executor: CommandExecutor::new(executor),
            clock: SimInstant::ZERO,
            transcript,
            command_count: 0,
        })
    }

    pub fn clock(&self) -> SimInstant {
        self.clock
    }

    pub fn panel(&self) -> &Executor {
        self.executor.panel()
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        self.command_count += 1;
        let elapsed = self.elapsed();
        if let Some(transcript) = &mut self.transcript {
            transcript.append_line(elapsed, TranscriptRole::Host, trimmed)?;
        }

        let result = self.executor.execute(trimmed, self.clock);
        debug!("command #{}: {result:?}", self.command_count);
        let mut lines = match result {
            Ok(outcome) => self.describe(outcome),
            Err(CommandError::Parse(error)) => vec![format!("ERR syntax {error}")],
            Err(CommandError::Panel(error)) => vec![format!("ERR panel {error}")],
            Err(CommandError::Unsupported(what)) => vec![format!("ERR unsupported {what}")],
        };

        for url in self.executor.panel_mut().navigator_mut().take_opened() {
            lines.push(format!("-> open {url}"));
        }

        self.record_output(&lines)?;
        Ok(lines)
    }

    fn describe(&mut self, outcome: CommandOutcome<SimInstant>) -> Vec<String> {
        match outcome {
            CommandOutcome::Pressed { button, outcome } => {
                let mut lines = vec![format!("OK press {button} {}", describe_press(&outcome))];
                lines.extend(self.status_lines(button));
                lines
            }
            CommandOutcome::Holding { button, armed } => vec![if armed {
                format!("OK hold {button} armed")
            } else {
                format!("OK hold {button} ignored (not a locked secret)")
            }],
            CommandOutcome::Released { button, disarmed } => vec![if disarmed {
                format!("OK release {button} disarmed")
            } else {
                format!("OK release {button} (nothing pending)")
            }],
            CommandOutcome::InputSet { button } => vec![format!("OK input {button}")],
            CommandOutcome::Waited { until, fired } => {
                self.clock = until;
                let clock = format_clock(until.saturating_duration_since(SimInstant::ZERO));
                vec![format!("OK clock={clock} fired={fired}")]
            }
            CommandOutcome::SignalSet { signal, enabled } => {
                vec![format!("OK signal {signal}={}", if enabled { "on" } else { "off" })]
            }
            CommandOutcome::Duplicated { source, copy } => {
                let mut lines = vec![format!("OK duplicate {source} -> {copy}")];
                lines.extend(self.status_lines(copy));
                lines
            }
            CommandOutcome::Removed { button } => vec![format!("OK remove {button}")],
            CommandOutcome::Status(buttons) => buttons
                .into_iter()
                .flat_map(|button| self.status_lines(button))
                .collect(),
            CommandOutcome::Log => self.log_lines(),
            CommandOutcome::Help(topic) => {
                let mut text = String::new();
                // Writing into a String cannot fail.
                let _ = status::write_help(&mut text, topic);
                text.lines().map(str::to_owned).collect()
            }
        }
    }

    fn status_lines(&self, button: ButtonId) -> Vec<String> {
        let status = match ButtonStatus::capture(self.executor.panel(), button) {
            Ok(status) => status,
            Err(ExecutorError::UnknownButton(_)) => return vec![format!("[{button}] removed")],
            Err(error) => return vec![format!("ERR panel {error}")],
        };
        let formatter = StatusFormatter::new(&status);

        let mut lines = Vec::new();
        let mut line = String::new();
        if formatter.write_button_line(&mut line).is_ok() {
            lines.push(line);
        }
        let mut line = String::new();
        if let Ok(true) = formatter.write_tooltip_line(&mut line) {
            lines.push(line);
        }
        let mut line = String::new();
        if formatter.write_state_line(&mut line).is_ok() {
            lines.push(line);
        }
        let mut log = String::new();
        if formatter.write_macro_log(&mut log).is_ok() {
            lines.extend(log.lines().map(str::to_owned));
        }
        lines
    }

    fn log_lines(&self) -> Vec<String> {
        let entries = self.executor.panel().structured_log();
        if entries.is_empty() {
            return vec![String::from("log is empty")];
        }
        entries
            .iter()
            .filter_map(|entry| {
                let mut line = String::new();
                status::write_log_entry(&mut line, entry, SimInstant::ZERO)
                    .ok()
                    .map(|()| line)
            })
            .collect()
    }

    fn elapsed(&self) -> Duration {
        self.clock.saturating_duration_since(SimInstant::ZERO)
    }

    fn record_output(&mut self, lines: &[String]) -> io::Result<()> {
        let elapsed = self.elapsed();
        if let Some(transcript) = &mut self.transcript {
            for line in lines {
                transcript.append_line(elapsed, TranscriptRole::Emulator, line)?;
            }
        }
        Ok(())
    }
}

fn describe_press(outcome: &PressOutcome) -> String {
    match outcome {
        PressOutcome::Ignored => String::from("ignored (processing)"),
        PressOutcome::Rejected(rejection) => format!("rejected: {rejection}"),
        PressOutcome::AwaitingInput => String::from("awaiting input"),
        PressOutcome::InputRequired => String::from("input required"),
        PressOutcome::Sequencing(_) => String::from("sequencing"),
        PressOutcome::Completed => String::from("completed"),
    }
}

fn format_clock(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    format!("+{}.{:03}s", millis / 1_000, millis % 1_000)
}

struct TranscriptLogger {
    writer: BufWriter<std::fs::File>,
}

impl TranscriptLogger {
    fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };

        logger.write_header()?;
        Ok(logger)
    }

    fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.writer, "# Panel emulator transcript")?;
        writeln!(
            self.writer,
            "# Timestamps are virtual milliseconds since session start"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(&mut self, elapsed: Duration, role: TranscriptRole, line: &str) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    fn session() -> Session {
        Session::new(config::demo().expect("demo panel"), None).expect("session")
    }

    #[test]
    fn press_reports_outcome_and_status() {
        let mut session = session();
        let lines = session.handle_command("press 1").expect("io");
        assert_eq!(lines[0], "OK press 1 completed");
        assert!(lines[1].starts_with("[1] \"Water 1\" counter"));
        assert!(lines.iter().any(|line| line == "  > Count: 1"));
    }

    #[test]
    fn wait_advances_the_virtual_clock() {
        let mut session = session();
        session.handle_command("hold 8").expect("io");
        let lines = session.handle_command("wait 2s").expect("io");
        assert_eq!(lines, ["OK clock=+2.000s fired=1"]);
        assert_eq!(session.clock(), SimInstant::from_millis(2_000));
        assert!(session.panel().state(ButtonId(8)).secret_unlocked);
    }

    #[test]
    fn navigation_is_echoed() {
        let mut session = session();
        let lines = session.handle_command("press 6").expect("io");
        assert_eq!(lines.last().map(String::as_str), Some("-> open https://example.com/docs"));
    }

    #[test]
    fn errors_are_prefixed() {
        let mut session = session();
        let lines = session.handle_command("press 99").expect("io");
        assert_eq!(lines, ["ERR panel unknown button 99"]);
        let lines = session.handle_command("launch").expect("io");
        assert!(lines[0].starts_with("ERR syntax"));
    }

    #[test]
    fn log_lists_completions() {
        let mut session = session();
        assert_eq!(session.handle_command("log").expect("io"), ["log is empty"]);
        session.handle_command("press 3").expect("io");
        let lines = session.handle_command("log").expect("io");
        assert_eq!(
            lines,
            ["#1 +0ms [3] Reading playlist \"Now showing: Neuromancer\" item=\"Neuromancer\""]
        );
    }
}
