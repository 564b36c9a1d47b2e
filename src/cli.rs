use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::io::{self, BufRead, Write};

use crate::config::KeeperConfig;
use crate::keeper::SaveKeeper;
use crate::lock::LockAttempt;
use crate::session::{print_lock_refusal, run_session};

/// Interactive save keeper. Configuration comes from SAVEKEEPER_* env variables.
#[derive(Parser, Debug)]
#[command(
    name = "savekeeper",
    version,
    about = "Watches the game's save file, keeps timestamped copies and restores them on demand"
)]
pub struct Cli {}

pub fn run() -> Result<()> {
    let _cli = Cli::parse();

    let cfg = KeeperConfig::from_env();
    info!("{}", cfg);
    let keeper = SaveKeeper::open(cfg)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with(&keeper, stdin.lock(), &mut out, true)
}

/// Lock, optionally start the watcher, run the session, unlock, say goodbye.
/// A lock that cannot be taken (held, stale or not creatable) is not an error:
/// the refusal is printed instead.
pub fn run_with<R: BufRead, W: Write>(
    keeper: &SaveKeeper,
    input: R,
    out: &mut W,
    watch: bool,
) -> Result<()> {
    match keeper.try_lock() {
        LockAttempt::Acquired(lock) => {
            if watch {
                // detached: the watcher lives until the process exits
                keeper.watcher().spawn().context("spawn watcher thread")?;
            }
            let res = run_session(keeper, input, out);
            lock.release();
            res?;
        }
        refused => print_lock_refusal(&refused, out)?,
    }
    writeln!(out, "Bye!")?;
    out.flush()?;
    Ok(())
}
