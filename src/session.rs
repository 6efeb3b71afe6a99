// src/session.rs

use std::path::Path;

use crate::backend::MediaBackend;
use crate::config::PlayerConfig;
use crate::dispatcher::EventLoop;
use crate::error::InitError;
use crate::input::spawn_input_pump;
use crate::pipeline::{
    DecodePipeline, DisplaySink, DrainReport, FrameGeometry, StreamInfo, StreamReader,
};
use crate::signal::signal_queue;
use crate::state::PlaybackState;
use crate::timer::RefreshTimer;

/// An opened input with a pipeline ready to play its first video stream.
pub struct PlaybackSession<B: MediaBackend> {
    pipeline: DecodePipeline<B::Reader, B::Decoder, B::Converter>,
    stream: StreamInfo,
    config: PlayerConfig,
}

impl<B: MediaBackend> PlaybackSession<B> {
    /// Opens `path` and wires up every collaborator. `make_sink` only runs once
    /// a decodable video stream has been found.
    pub fn open<F>(
        backend: &B,
        path: &Path,
        config: PlayerConfig,
        make_sink: F,
    ) -> Result<Self, InitError>
    where
        F: FnOnce(FrameGeometry) -> Result<Box<dyn DisplaySink>, InitError>,
    {
        config.validate()?;
        let mut reader = backend.open_input(path)?;
        let streams = reader.probe()?;

        log::info!("Input {} ({}):", path.display(), backend.name());
        for info in &streams {
            log::info!("  Stream {}", info.describe());
        }

        let stream = streams
            .into_iter()
            .find(StreamInfo::is_video)
            .ok_or(InitError::NoVideoStream)?;
        let geometry = stream.geometry.filter(|g| !g.is_empty()).ok_or_else(|| {
            InitError::Probe(format!("video stream #{} has no frame size", stream.index))
        })?;
        if !geometry.is_supported() {
            return Err(InitError::Probe(format!(
                "video stream #{} is {geometry}, larger than {max}x{max}",
                stream.index,
                max = FrameGeometry::MAX_DIMENSION
            )));
        }

        let decoder = backend.open_decoder(&reader, &stream)?;
        let converter = backend.open_converter(&decoder, &stream, geometry)?;
        let sink = make_sink(geometry)?;

        log::debug!(
            "playing stream #{} at {}, drain {:?}",
            stream.index,
            geometry,
            config.drain
        );
        let pipeline = DecodePipeline::new(
            reader,
            decoder,
            converter,
            sink,
            stream.index,
            geometry,
            config.drain,
        );
        Ok(Self {
            pipeline,
            stream,
            config,
        })
    }

    pub fn stream(&self) -> &StreamInfo {
        &self.stream
    }

    /// Plays until quit (or end of stream with `exit_at_end`), then tears the
    /// pipeline down. Returns the session totals.
    pub fn run(mut self) -> Result<DrainReport, InitError> {
        let state = PlaybackState::new();
        let (tx, rx) = signal_queue();

        let pump = match self.pipeline.take_input() {
            Some(source) => Some(spawn_input_pump(source, tx.clone(), state.clone())?),
            None => None,
        };
        let timer = RefreshTimer::new(state.clone(), tx, self.config.refresh_interval());
        let timer = match timer.spawn() {
            Ok(handle) => handle,
            Err(err) => {
                state.request_exit();
                return Err(err.into());
            }
        };

        EventLoop::new(state.clone(), rx, &mut self.pipeline, self.config.exit_at_end).run();
        state.request_exit();

        if timer.join().is_err() {
            log::warn!("refresh timer panicked");
        }
        if let Some(pump) = pump {
            if pump.join().is_err() {
                log::warn!("input pump panicked");
            }
        }

        let totals = *self.pipeline.totals();
        log::info!(
            "played {} frames ({} units read, {} discarded, {} rejected, {} skipped, {} present failures)",
            totals.frames_presented,
            totals.units_read,
            totals.units_discarded,
            totals.units_rejected,
            totals.frames_skipped,
            totals.present_failures
        );
        Ok(totals)
    }
}
