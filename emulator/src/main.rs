mod config;
mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Once;

use env_logger::Builder;
use log::{LevelFilter, info};
use panel_core::time::{PanelInstant, SimInstant};

use session::Session;

const USAGE: &str = "Usage: panel-emulator [--panel <file.json>] [--transcript <file>] [--log-level=<off|error|warn|info|debug|trace>]";

struct Options {
    panel: Option<PathBuf>,
    transcript: Option<PathBuf>,
    log_level: Option<LevelFilter>,
}

fn main() -> io::Result<()> {
    let options = parse_options().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });
    init_logger(options.log_level);

    let panel = match &options.panel {
        Some(path) => config::load(path),
        None => config::demo(),
    }
    .unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut session = Session::new(panel, options.transcript.as_deref())?;
    let mut line = String::new();

    info!("panel loaded with {} buttons", session.panel().ids().len());
    writeln!(
        writer,
        "Panel emulator ready. Type `help` for commands or `exit` to quit."
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            let elapsed = session.clock().saturating_duration_since(SimInstant::ZERO);
            writeln!(writer, "Session closed at +{}ms.", elapsed.as_millis())?;
            break;
        }

        let responses = session.handle_command(trimmed)?;
        for response in responses {
            writeln!(writer, "{response}")?;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_options() -> Result<Options, String> {
    let mut options = Options {
        panel: None,
        transcript: None,
        log_level: None,
    };
    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--panel=") {
            options.panel = Some(PathBuf::from(value));
        } else if arg == "--panel" {
            let value = args.next().ok_or("Expected value after --panel")?;
            options.panel = Some(PathBuf::from(value));
        } else if let Some(value) = arg.strip_prefix("--transcript=") {
            options.transcript = Some(PathBuf::from(value));
        } else if arg == "--transcript" {
            let value = args.next().ok_or("Expected value after --transcript")?;
            options.transcript = Some(PathBuf::from(value));
        } else if let Some(value) = arg.strip_prefix("--log-level=") {
            options.log_level = Some(
                value
                    .parse()
                    .map_err(|_| format!("Unknown log level `{value}`"))?,
            );
        } else {
            return Err(format!("Unknown argument `{arg}`"));
        }
    }

    Ok(options)
}

/// Initializes `env_logger` once; `RUST_LOG` applies unless a level is given.
fn init_logger(level: Option<LevelFilter>) {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let mut builder = Builder::from_default_env();
        if let Some(level) = level {
            builder.filter_level(level);
        }
        builder.format_timestamp_millis().try_init().ok();
    });
}
