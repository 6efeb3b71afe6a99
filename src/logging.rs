// src/logging.rs

use std::fs::File;
use std::path::{Path, PathBuf};

use env_logger::{Env, Target};

use crate::display::DisplayKind;
use crate::error::InitError;

const DEFAULT_LOG_FILE: &str = "player.log";

/// Where log lines go for a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// The terminal display owns stderr's screen while it plays, so its log lines
/// go to a file unless one was given explicitly.
pub fn log_target(display: DisplayKind, log_file: Option<&Path>) -> LogTarget {
    match (log_file, display) {
        (Some(path), _) => LogTarget::File(path.to_path_buf()),
        (None, DisplayKind::Terminal) => {
            LogTarget::File(std::env::temp_dir().join(DEFAULT_LOG_FILE))
        }
        (None, DisplayKind::Headless) => LogTarget::Stderr,
    }
}

/// Installs env_logger. `RUST_LOG` wins over `default_filter`.
pub fn init_logging(default_filter: &str, target: &LogTarget) -> Result<(), InitError> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter));
    builder.format_timestamp_millis();
    if let LogTarget::File(path) = target {
        let file = File::create(path)
            .map_err(|e| InitError::Config(format!("log file {}: {e}", path.display())))?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    builder
        .try_init()
        .map_err(|e| InitError::Config(format!("logger: {e}")))
}
