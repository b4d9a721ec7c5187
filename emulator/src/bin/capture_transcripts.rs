use std::io;
use std::path::Path;

#[allow(dead_code)]
#[path = "../config.rs"]
mod config;
#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::Session;

const TRANSCRIPT_DIR: &str = "transcripts";

fn main() -> io::Result<()> {
    record("demo-basics.log", &[
        "press 1",
        "press 1",
        "press 3",
        "press 3",
        "press 4",
        "press 5",
        "status",
    ])?;
    record("demo-secret.log", &[
        "press 8",
        "hold 8",
        "wait 1500ms",
        "release 8",
        "hold 8",
        "wait 2s",
        "press 8",
    ])?;
    record("demo-macro.log", &[
        "press 7",
        "press 7",
        "wait 300ms",
        "wait 600ms",
        "status 7",
        "signal limit on",
        "press 1",
        "signal limit off",
        "duplicate 1",
        "remove 7",
        "log",
    ])?;
    Ok(())
}

fn record(name: &str, script: &[&str]) -> io::Result<()> {
    let panel = config::demo().map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    let path = Path::new(TRANSCRIPT_DIR).join(name);
    let mut session = Session::new(panel, Some(&path))?;
    for line in script {
        session.handle_command(line)?;
    }
    Ok(())
}
