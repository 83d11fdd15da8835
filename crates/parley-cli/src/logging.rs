//! Tracing setup for the REPL.
//!
//! Output goes to `~/.config/parley/logs/parley.log` so log lines never
//! interleave with the prompt. Setup is best-effort: a read-only home
//! directory must not keep the client from starting.

use std::fs;
use std::sync::Mutex;

use parley_store::ParleyPaths;
use tracing_subscriber::EnvFilter;

pub fn init() {
    let Ok(log_dir) = ParleyPaths::log_dir() else {
        return;
    };
    if fs::create_dir_all(&log_dir).is_err() {
        return;
    }

    let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("parley.log"))
    else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}
