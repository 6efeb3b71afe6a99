// src/pipeline/testing.rs

//! Scripted collaborators that record every call into a shared journal.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;

use super::{
    CompressedUnit, DecodePipeline, DisplayFrame, DisplaySink, DrainMode, FrameConverter,
    FrameGeometry, InputSource, MediaKind, PixelFormat, RawFrame, StreamInfo, StreamReader,
    VideoDecoder,
};
use crate::signal::UserEvent;
use crate::backend::MediaBackend;
use crate::error::InitError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    EndOfStream,
    Submit(i64),
    Flush,
    Convert(i64),
    Present(i64),
    Drop(&'static str),
}

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn submitted(&self) -> Vec<i64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Submit(pts) => Some(pts),
                _ => None,
            })
            .collect()
    }

    pub fn converted(&self) -> Vec<i64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Convert(pts) => Some(pts),
                _ => None,
            })
            .collect()
    }

    pub fn presented(&self) -> Vec<i64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Present(pts) => Some(pts),
                _ => None,
            })
            .collect()
    }

    pub fn drops(&self) -> Vec<&'static str> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Drop(name) => Some(name),
                _ => None,
            })
            .collect()
    }
}

pub fn unit(stream_index: usize, pts: i64) -> CompressedUnit {
    CompressedUnit {
        stream_index,
        pts: Some(pts),
        data: vec![pts as u8],
    }
}

pub fn video_stream(index: usize) -> StreamInfo {
    StreamInfo {
        index,
        kind: MediaKind::Video,
        codec: "scripted".into(),
        geometry: Some(FrameGeometry::new(2, 2)),
        pixel_format: Some("yuv444p".into()),
        frame_rate: None,
    }
}

pub fn audio_stream(index: usize) -> StreamInfo {
    StreamInfo {
        index,
        kind: MediaKind::Audio,
        codec: "pcm".into(),
        geometry: None,
        pixel_format: None,
        frame_rate: None,
    }
}

pub enum ReadStep {
    Unit(CompressedUnit),
    Fail,
}

pub struct ScriptedReader {
    journal: Journal,
    steps: VecDeque<ReadStep>,
    streams: Vec<StreamInfo>,
}

impl ScriptedReader {
    pub fn new(journal: &Journal, steps: Vec<ReadStep>) -> Self {
        Self {
            journal: journal.clone(),
            steps: steps.into(),
            streams: vec![video_stream(0)],
        }
    }

    pub fn video_units(journal: &Journal, count: i64) -> Self {
        Self::new(
            journal,
            (0..count).map(|pts| ReadStep::Unit(unit(0, pts))).collect(),
        )
    }

    pub fn with_streams(mut self, streams: Vec<StreamInfo>) -> Self {
        self.streams = streams;
        self
    }
}

impl StreamReader for ScriptedReader {
    type Unit = CompressedUnit;

    fn probe(&mut self) -> Result<Vec<StreamInfo>, InitError> {
        Ok(self.streams.clone())
    }

    fn read_next_unit(&mut self) -> anyhow::Result<Option<CompressedUnit>> {
        match self.steps.pop_front() {
            Some(ReadStep::Unit(unit)) => Ok(Some(unit)),
            Some(ReadStep::Fail) => Err(anyhow!("scripted read failure")),
            None => {
                self.journal.push(Call::EndOfStream);
                Ok(None)
            }
        }
    }
}

impl Drop for ScriptedReader {
    fn drop(&mut self) {
        self.journal.push(Call::Drop("reader"));
    }
}

/// Emits `burst` frames per unit (pts `unit * 10 + k`), holding the output of
/// the last `delay` units until later submissions or a flush push it out.
pub struct ScriptedDecoder {
    journal: Journal,
    delay: usize,
    burst: i64,
    reject: Vec<i64>,
    held: VecDeque<Vec<RawFrame>>,
    ready: VecDeque<RawFrame>,
}

impl ScriptedDecoder {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            delay: 0,
            burst: 1,
            reject: Vec::new(),
            held: VecDeque::new(),
            ready: VecDeque::new(),
        }
    }

    pub fn with_delay(mut self, delay: usize) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_burst(mut self, burst: i64) -> Self {
        self.burst = burst;
        self
    }

    pub fn rejecting(mut self, pts: &[i64]) -> Self {
        self.reject = pts.to_vec();
        self
    }
}

fn scripted_frame(pts: i64) -> RawFrame {
    RawFrame {
        geometry: FrameGeometry::new(2, 2),
        format: PixelFormat::Yuv444p,
        planes: vec![vec![pts as u8; 4], vec![128; 4], vec![128; 4]],
        pts: Some(pts),
    }
}

impl VideoDecoder for ScriptedDecoder {
    type Unit = CompressedUnit;
    type Frame = RawFrame;

    fn submit(&mut self, unit: &CompressedUnit) -> anyhow::Result<()> {
        let pts = unit.pts.unwrap_or_default();
        self.journal.push(Call::Submit(pts));
        if self.reject.contains(&pts) {
            return Err(anyhow!("scripted rejection of unit {pts}"));
        }
        self.held
            .push_back((0..self.burst).map(|k| scripted_frame(pts * 10 + k)).collect());
        while self.held.len() > self.delay {
            if let Some(frames) = self.held.pop_front() {
                self.ready.extend(frames);
            }
        }
        Ok(())
    }

    fn retrieve(&mut self) -> Option<RawFrame> {
        self.ready.pop_front()
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.journal.push(Call::Flush);
        while let Some(frames) = self.held.pop_front() {
            self.ready.extend(frames);
        }
        Ok(())
    }
}

impl Drop for ScriptedDecoder {
    fn drop(&mut self) {
        self.journal.push(Call::Drop("decoder"));
    }
}

pub struct MarkingConverter {
    journal: Journal,
    refused: Vec<i64>,
}

impl MarkingConverter {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            refused: Vec::new(),
        }
    }

    /// Frames with these pts fail to convert.
    pub fn refusing(mut self, pts: &[i64]) -> Self {
        self.refused = pts.to_vec();
        self
    }
}

impl FrameConverter for MarkingConverter {
    type Frame = RawFrame;

    fn convert(&mut self, frame: &RawFrame, target: &mut DisplayFrame) -> bool {
        let pts = frame.pts.unwrap_or_default();
        self.journal.push(Call::Convert(pts));
        if self.refused.contains(&pts) {
            return false;
        }
        target.data.fill(frame.planes[0][0]);
        target.pts = frame.pts;
        true
    }
}

impl Drop for MarkingConverter {
    fn drop(&mut self) {
        self.journal.push(Call::Drop("converter"));
    }
}

pub struct RecordingSink {
    journal: Journal,
    calls: usize,
    fail_on: Option<usize>,
    broken_input: bool,
}

/// Input whose every poll fails, like a terminal that went away.
pub struct BrokenInput;

impl InputSource for BrokenInput {
    fn poll_input(&mut self, _timeout: Duration) -> anyhow::Result<Vec<UserEvent>> {
        Err(anyhow!("input device gone"))
    }
}

impl RecordingSink {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            calls: 0,
            fail_on: None,
            broken_input: false,
        }
    }

    pub fn with_broken_input(mut self) -> Self {
        self.broken_input = true;
        self
    }

    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on = Some(call);
        self
    }
}

impl DisplaySink for RecordingSink {
    fn present(&mut self, frame: &DisplayFrame) -> anyhow::Result<()> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_on == Some(call) {
            return Err(anyhow!("scripted present failure"));
        }
        self.journal.push(Call::Present(frame.pts.unwrap_or_default()));
        Ok(())
    }

    fn take_input(&mut self) -> Option<Box<dyn InputSource>> {
        std::mem::take(&mut self.broken_input).then(|| Box::new(BrokenInput) as Box<dyn InputSource>)
    }
}

impl Drop for RecordingSink {
    fn drop(&mut self) {
        self.journal.push(Call::Drop("sink"));
    }
}

pub type ScriptedPipeline = DecodePipeline<ScriptedReader, ScriptedDecoder, MarkingConverter>;

pub fn pipeline_with(
    journal: &Journal,
    reader: ScriptedReader,
    decoder: ScriptedDecoder,
    mode: DrainMode,
) -> ScriptedPipeline {
    DecodePipeline::new(
        reader,
        decoder,
        MarkingConverter::new(journal),
        Box::new(RecordingSink::new(journal)),
        0,
        FrameGeometry::new(2, 2),
        mode,
    )
}

/// Backend whose reader serves `units` scripted video units on stream
/// `video_index` (when the stream list contains it).
pub struct ScriptedBackend {
    pub journal: Journal,
    pub streams: Vec<StreamInfo>,
    pub units: i64,
    pub fail_open: bool,
    pub unsupported_codec: bool,
}

impl ScriptedBackend {
    pub fn new(journal: &Journal, units: i64) -> Self {
        Self {
            journal: journal.clone(),
            streams: vec![video_stream(0)],
            units,
            fail_open: false,
            unsupported_codec: false,
        }
    }
}

impl MediaBackend for ScriptedBackend {
    type Reader = ScriptedReader;
    type Decoder = ScriptedDecoder;
    type Converter = MarkingConverter;

    fn name(&self) -> &'static str {
        "scripted"
    }

    fn open_input(&self, path: &Path) -> Result<ScriptedReader, InitError> {
        if self.fail_open {
            return Err(InitError::Open {
                path: path.to_path_buf(),
                reason: "scripted".into(),
            });
        }
        let video_index = self
            .streams
            .iter()
            .find(|s| s.is_video())
            .map_or(0, |s| s.index);
        let steps = (0..self.units)
            .map(|pts| ReadStep::Unit(unit(video_index, pts)))
            .collect();
        Ok(ScriptedReader::new(&self.journal, steps).with_streams(self.streams.clone()))
    }

    fn open_decoder(
        &self,
        _reader: &ScriptedReader,
        stream: &StreamInfo,
    ) -> Result<ScriptedDecoder, InitError> {
        if self.unsupported_codec {
            return Err(InitError::UnsupportedCodec(stream.codec.clone()));
        }
        Ok(ScriptedDecoder::new(&self.journal))
    }

    fn open_converter(
        &self,
        _decoder: &ScriptedDecoder,
        _stream: &StreamInfo,
        _target: FrameGeometry,
    ) -> Result<MarkingConverter, InitError> {
        Ok(MarkingConverter::new(&self.journal))
    }
}
