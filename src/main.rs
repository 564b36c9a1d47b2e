use std::process::ExitCode;

use env_logger::{Builder, Env};
use log::error;

fn main() -> ExitCode {
    // Log lines go to stderr so they never mix with the session on stdout.
    // Watcher ticks show up with RUST_LOG=debug.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_target(false)
        .init();

    match savekeeper::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("savekeeper stopped: {:?}", e);
            ExitCode::FAILURE
        }
    }
}
