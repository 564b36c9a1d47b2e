//! Interactive session: one line per iteration, dispatch on its first character.

use anyhow::Result;
use std::io::{BufRead, Write};

use crate::keeper::SaveKeeper;
use crate::lock::LockAttempt;
use crate::restore::RestoreOutcome;

pub const SAVE_CHAR: char = 's';
pub const LOAD_CHAR: char = 'l';
pub const UNDO_CHAR: char = 'u';
pub const EXIT_CHAR: char = 'x';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Save,
    Load,
    Undo,
    Exit,
    Unknown(char),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim_end_matches(['\r', '\n']).chars().next() {
            Some(SAVE_CHAR) => Command::Save,
            Some(LOAD_CHAR) => Command::Load,
            Some(UNDO_CHAR) => Command::Undo,
            Some(EXIT_CHAR) => Command::Exit,
            Some(c) => Command::Unknown(c),
            None => Command::Empty,
        }
    }
}

fn prompt<W: Write>(keeper: &SaveKeeper, out: &mut W) -> Result<()> {
    let latest = keeper.latest_save_name().unwrap_or_default();
    writeln!(out, "Last save is {}", latest)?;
    writeln!(
        out,
        "[{}] for save, [{}] for load, [{}] to undo load, [{}] for exit",
        SAVE_CHAR, LOAD_CHAR, UNDO_CHAR, EXIT_CHAR
    )?;
    writeln!(out, "Hit enter to confirm")?;
    out.flush()?;
    Ok(())
}

fn dispatch<W: Write>(keeper: &SaveKeeper, cmd: Command, out: &mut W) -> Result<bool> {
    match cmd {
        Command::Save => match keeper.save() {
            Ok(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                writeln!(out, "Saved {}", name)?;
            }
            Err(e) => writeln!(out, "Failed {:#}", e)?,
        },
        Command::Load => match keeper.load() {
            Ok(RestoreOutcome::Restored { save, .. }) => writeln!(out, "Loaded {}", save)?,
            Ok(RestoreOutcome::NoSaves { .. }) => writeln!(out, "No saves located")?,
            Err(e) => writeln!(out, "Error: {:#}", e)?,
        },
        Command::Undo => keeper.undo(),
        Command::Exit => {
            writeln!(out, "Exiting")?;
            return Ok(false);
        }
        Command::Unknown(c) => writeln!(out, "Unknown command: {}", c)?,
        Command::Empty => {}
    }
    Ok(true)
}

/// Loop until exit or end of input. Operation failures are printed, never returned;
/// only I/O errors on `input`/`out` end the session with an error.
pub fn run_session<R: BufRead, W: Write>(keeper: &SaveKeeper, mut input: R, out: &mut W) -> Result<()> {
    writeln!(out, "What would you like to do?")?;
    loop {
        prompt(keeper, out)?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out, "Exiting")?;
            break;
        }
        if !dispatch(keeper, Command::parse(&line), out)? {
            break;
        }
    }
    Ok(())
}

/// Explain why the session did not start.
pub fn print_lock_refusal<W: Write>(attempt: &LockAttempt, out: &mut W) -> Result<()> {
    if let LockAttempt::Failed(e) = attempt {
        writeln!(out, "Unable to create lock file: {}", e)?;
        return Ok(());
    }
    writeln!(out, "Lock file found")?;
    match attempt {
        LockAttempt::Held => writeln!(out, "Another instance of this program is already running")?,
        LockAttempt::Stale => writeln!(
            out,
            "No running instance holds it: the program probably didn't quit correctly last time"
        )?,
        LockAttempt::Acquired(_) | LockAttempt::Failed(_) => {}
    }
    writeln!(out, "If no other instance is running, please remove the lock file manually")?;
    Ok(())
}
