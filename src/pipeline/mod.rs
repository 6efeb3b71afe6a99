// src/pipeline/mod.rs

pub mod types;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatcher::RefreshHandler;
use crate::error::InitError;
use crate::signal::UserEvent;

pub use types::{
    CompressedUnit, DisplayFrame, FrameGeometry, FrameRate, MediaKind, PixelFormat, RawFrame,
    StreamInfo, StreamTagged,
};

/// Container side: probing and sequential unit reads.
pub trait StreamReader {
    type Unit: StreamTagged;

    fn probe(&mut self) -> Result<Vec<StreamInfo>, InitError>;

    /// `Ok(None)` is a clean end of stream.
    fn read_next_unit(&mut self) -> anyhow::Result<Option<Self::Unit>>;
}

/// Codec side. `retrieve` may yield nothing for a while and then several
/// frames at once; callers keep pulling until it returns `None`.
pub trait VideoDecoder {
    type Unit;
    type Frame;

    fn submit(&mut self, unit: &Self::Unit) -> anyhow::Result<()>;

    fn retrieve(&mut self) -> Option<Self::Frame>;

    /// No more input is coming; buffered frames become retrievable.
    fn flush(&mut self) -> anyhow::Result<()>;
}

/// Fixed source-to-display pixel transform, set up once per session.
pub trait FrameConverter {
    type Frame;

    /// Writes `frame` into `target`. Returns `false` when the frame could not
    /// be converted, in which case `target` still holds the previous picture.
    fn convert(&mut self, frame: &Self::Frame, target: &mut DisplayFrame) -> bool;
}

pub trait DisplaySink {
    fn present(&mut self, frame: &DisplayFrame) -> anyhow::Result<()>;

    /// Hands out the sink's input side, if it has one. Called once per session.
    fn take_input(&mut self) -> Option<Box<dyn InputSource>> {
        None
    }
}

/// Keyboard/window input belonging to a display sink, polled off the event loop thread.
pub trait InputSource: Send {
    fn poll_input(&mut self, timeout: Duration) -> anyhow::Result<Vec<UserEvent>>;
}

/// How much work one `Refresh` signal triggers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrainMode {
    /// Decode and present the whole remaining stream.
    #[default]
    Exhaustive,
    /// Present at most one frame, leaving pause/quit responsive between frames.
    PerFrame,
}

/// Counters for one pipeline invocation (or a whole session once absorbed).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub units_read: u64,
    pub units_discarded: u64,
    pub units_rejected: u64,
    pub frames_presented: u64,
    pub present_failures: u64,
    pub frames_skipped: u64,
    pub exhausted: bool,
}

impl DrainReport {
    pub fn absorb(&mut self, other: &DrainReport) {
        self.units_read += other.units_read;
        self.units_discarded += other.units_discarded;
        self.units_rejected += other.units_rejected;
        self.frames_presented += other.frames_presented;
        self.present_failures += other.present_failures;
        self.frames_skipped += other.frames_skipped;
        self.exhausted |= other.exhausted;
    }
}

/// Reader, decoder, converter and sink for the selected video stream.
///
/// Field order is drop order: the sink goes first, the reader last.
pub struct DecodePipeline<R, D, C>
where
    R: StreamReader,
    D: VideoDecoder<Unit = R::Unit>,
    C: FrameConverter<Frame = D::Frame>,
{
    sink: Box<dyn DisplaySink>,
    converter: C,
    decoder: D,
    reader: R,
    display: DisplayFrame,
    stream_index: usize,
    mode: DrainMode,
    at_end: bool,
    totals: DrainReport,
}

impl<R, D, C> DecodePipeline<R, D, C>
where
    R: StreamReader,
    D: VideoDecoder<Unit = R::Unit>,
    C: FrameConverter<Frame = D::Frame>,
{
    pub fn new(
        reader: R,
        decoder: D,
        converter: C,
        sink: Box<dyn DisplaySink>,
        stream_index: usize,
        geometry: FrameGeometry,
        mode: DrainMode,
    ) -> Self {
        Self {
            sink,
            converter,
            decoder,
            reader,
            display: DisplayFrame::new(geometry),
            stream_index,
            mode,
            at_end: false,
            totals: DrainReport::default(),
        }
    }

    pub fn mode(&self) -> DrainMode {
        self.mode
    }

    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    pub fn totals(&self) -> &DrainReport {
        &self.totals
    }

    pub fn take_input(&mut self) -> Option<Box<dyn InputSource>> {
        self.sink.take_input()
    }

    /// Reads and presents everything left in the stream.
    pub fn drain_available_frames(&mut self) -> DrainReport {
        let mut report = DrainReport::default();
        if self.at_end {
            report.exhausted = true;
            return report;
        }

        while let Some(unit) = self.next_video_unit(&mut report) {
            if self.submit(&unit, &mut report) {
                self.present_pending(&mut report);
            }
        }

        self.finish();
        self.present_pending(&mut report);
        report.exhausted = true;
        report
    }

    /// Presents one frame, reading only as many units as that takes.
    pub fn present_next_frame(&mut self) -> DrainReport {
        let mut report = DrainReport::default();
        loop {
            if let Some(frame) = self.decoder.retrieve() {
                self.present_frame(&frame, &mut report);
                break;
            }
            if self.at_end {
                report.exhausted = true;
                break;
            }
            match self.next_video_unit(&mut report) {
                Some(unit) => {
                    self.submit(&unit, &mut report);
                }
                None => self.finish(),
            }
        }
        report
    }

    /// Next unit of the selected stream. Foreign units are dropped here without
    /// touching the decoder. Read errors end the stream just like EOF does.
    fn next_video_unit(&mut self, report: &mut DrainReport) -> Option<R::Unit> {
        loop {
            match self.reader.read_next_unit() {
                Ok(Some(unit)) => {
                    report.units_read += 1;
                    if unit.stream_index() != self.stream_index {
                        report.units_discarded += 1;
                        continue;
                    }
                    return Some(unit);
                }
                Ok(None) => return None,
                Err(err) => {
                    log::warn!("read failed, treating as end of stream: {err:#}");
                    return None;
                }
            }
        }
    }

    fn submit(&mut self, unit: &R::Unit, report: &mut DrainReport) -> bool {
        match self.decoder.submit(unit) {
            Ok(()) => true,
            Err(err) => {
                report.units_rejected += 1;
                log::debug!("decoder rejected unit, skipping: {err:#}");
                false
            }
        }
    }

    fn finish(&mut self) {
        if self.at_end {
            return;
        }
        self.at_end = true;
        if let Err(err) = self.decoder.flush() {
            log::warn!("decoder flush failed: {err:#}");
        }
        log::info!("end of stream reached");
    }

    fn present_pending(&mut self, report: &mut DrainReport) {
        while let Some(frame) = self.decoder.retrieve() {
            self.present_frame(&frame, report);
        }
    }

    fn present_frame(&mut self, frame: &D::Frame, report: &mut DrainReport) {
        if !self.converter.convert(frame, &mut self.display) {
            report.frames_skipped += 1;
            return;
        }
        match self.sink.present(&self.display) {
            Ok(()) => report.frames_presented += 1,
            Err(err) => {
                report.present_failures += 1;
                log::warn!("present failed: {err:#}");
            }
        }
    }
}

impl<R, D, C> RefreshHandler for DecodePipeline<R, D, C>
where
    R: StreamReader,
    D: VideoDecoder<Unit = R::Unit>,
    C: FrameConverter<Frame = D::Frame>,
{
    fn on_refresh(&mut self) -> DrainReport {
        let report = match self.mode {
            DrainMode::Exhaustive => self.drain_available_frames(),
            DrainMode::PerFrame => self.present_next_frame(),
        };
        self.totals.absorb(&report);
        report
    }
}
