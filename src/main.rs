// src/main.rs

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use video_modules::backend::y4m::Y4mBackend;
use video_modules::cli::CliArgs;
use video_modules::display::create_display;
use video_modules::logging::{init_logging, log_target};
use video_modules::{BackendKind, InitError, MediaBackend, PlaybackSession, PlayerConfig};

fn play<B: MediaBackend>(backend: &B, input: &Path, config: PlayerConfig) -> Result<(), InitError> {
    let title = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let display = config.display;
    let session = PlaybackSession::open(backend, input, config, |_geometry| {
        create_display(display, &title)
    })?;
    session.run()?;
    Ok(())
}

fn run(args: &CliArgs) -> Result<(), InitError> {
    let config = args.to_config()?;
    let target = log_target(config.display, args.log_file.as_deref());
    init_logging(args.log_filter(), &target)?;
    log::info!("opening {}", args.input.display());
    match config.backend.resolve(&args.input)? {
        BackendKind::Y4m => play(&Y4mBackend, &args.input, config),
        #[cfg(feature = "ffmpeg")]
        BackendKind::Ffmpeg => {
            let backend = video_modules::backend::ffmpeg::FfmpegBackend::new()?;
            play(&backend, &args.input, config)
        }
        other => Err(InitError::Config(format!("backend {other:?} is not available"))),
    }
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("player: {err}");
            ExitCode::FAILURE
        }
    }
}
