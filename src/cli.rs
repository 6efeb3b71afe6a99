// src/cli.rs

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::backend::BackendKind;
use crate::config::PlayerConfig;
use crate::display::DisplayKind;
use crate::error::InitError;
use crate::pipeline::DrainMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DrainArg {
    /// Present everything left in the stream on the first refresh.
    Exhaustive,
    /// Present at most one frame per refresh.
    PerFrame,
}

impl From<DrainArg> for DrainMode {
    fn from(arg: DrainArg) -> Self {
        match arg {
            DrainArg::Exhaustive => DrainMode::Exhaustive,
            DrainArg::PerFrame => DrainMode::PerFrame,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Auto,
    Y4m,
    Ffmpeg,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => BackendKind::Auto,
            BackendArg::Y4m => BackendKind::Y4m,
            BackendArg::Ffmpeg => BackendKind::Ffmpeg,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "player", version, about = "Plays a video file in the terminal")]
pub struct CliArgs {
    /// Video file to play
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// JSON file with player settings; flags below override it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Milliseconds between refresh ticks
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    #[arg(long, value_enum)]
    pub drain: Option<DrainArg>,

    /// Quit once the stream is exhausted
    #[arg(long)]
    pub exit_at_end: bool,

    /// Decode without drawing (implies --exit-at-end)
    #[arg(long)]
    pub headless: bool,

    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Write log lines here. Defaults to player.log in the temp directory
    /// while the terminal display is in use, stderr otherwise.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl CliArgs {
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    /// Config file (or defaults) with the flags applied on top.
    pub fn to_config(&self) -> Result<PlayerConfig, InitError> {
        let mut config = match &self.config {
            Some(path) => PlayerConfig::load_from_disk(path)?,
            None => PlayerConfig::default(),
        };
        if let Some(ms) = self.interval_ms {
            config.refresh_interval_ms = ms;
        }
        if let Some(drain) = self.drain {
            config.drain = drain.into();
        }
        if let Some(backend) = self.backend {
            config.backend = backend.into();
        }
        if self.exit_at_end {
            config.exit_at_end = true;
        }
        if self.headless {
            config.display = DisplayKind::Headless;
        }
        // nothing could ever quit a headless session otherwise
        if config.display == DisplayKind::Headless {
            config.exit_at_end = true;
        }
        config.validate()?;
        Ok(config)
    }
}
