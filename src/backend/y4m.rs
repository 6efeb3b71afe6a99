// src/backend/y4m.rs

//! YUV4MPEG2 container with its trivial `rawvideo` codec.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::Path;

use anyhow::{bail, Context};

use super::convert::YuvToRgb;
use super::MediaBackend;
use crate::error::InitError;
use crate::pipeline::{
    CompressedUnit, FrameGeometry, FrameRate, MediaKind, PixelFormat, RawFrame, StreamInfo,
    StreamReader, VideoDecoder,
};

const SIGNATURE: &str = "YUV4MPEG2";
const FRAME_MARKER: &[u8] = b"FRAME";
const MAX_LINE: u64 = 4096;
pub const CODEC_NAME: &str = "rawvideo";

#[derive(Clone, Debug, PartialEq)]
pub struct Y4mHeader {
    pub geometry: FrameGeometry,
    pub frame_rate: Option<FrameRate>,
    /// Colorspace tag as written, `420jpeg` when absent.
    pub colorspace: String,
    /// `None` for colorspaces the rawvideo decoder can't handle.
    pub format: Option<PixelFormat>,
}

fn colorspace_format(tag: &str) -> Option<PixelFormat> {
    match tag {
        "420" | "420jpeg" | "420paldv" | "420mpeg2" => Some(PixelFormat::Yuv420p),
        "422" => Some(PixelFormat::Yuv422p),
        "444" => Some(PixelFormat::Yuv444p),
        "mono" => Some(PixelFormat::Gray8),
        _ => None,
    }
}

impl Y4mHeader {
    pub fn parse(line: &str) -> Result<Self, InitError> {
        let mut tokens = line.trim_end_matches(['\n', '\r']).split(' ');
        if tokens.next() != Some(SIGNATURE) {
            return Err(InitError::Probe("missing YUV4MPEG2 signature".into()));
        }

        let mut width = None;
        let mut height = None;
        let mut frame_rate = None;
        let mut colorspace = "420jpeg".to_string();

        for token in tokens.filter(|t| !t.is_empty()) {
            let mut chars = token.chars();
            let tag = chars.next();
            let value = chars.as_str();
            match tag {
                Some('W') => width = value.parse::<u32>().ok(),
                Some('H') => height = value.parse::<u32>().ok(),
                Some('F') => {
                    frame_rate = value.split_once(':').and_then(|(n, d)| {
                        Some(FrameRate {
                            num: n.parse().ok()?,
                            den: d.parse().ok()?,
                        })
                    })
                }
                Some('C') => colorspace = value.to_string(),
                // interlacing, aspect, extensions
                _ => {}
            }
        }

        let (Some(width), Some(height)) = (width, height) else {
            return Err(InitError::Probe("header lacks frame width or height".into()));
        };
        let geometry = FrameGeometry::new(width, height);
        if !geometry.is_supported() {
            return Err(InitError::Probe(format!(
                "unsupported frame size {geometry} (each side 1..={})",
                FrameGeometry::MAX_DIMENSION
            )));
        }

        Ok(Self {
            geometry,
            frame_rate,
            format: colorspace_format(&colorspace),
            colorspace,
        })
    }

    pub fn frame_size(&self) -> Option<usize> {
        self.format.and_then(|f| f.frame_size(self.geometry))
    }
}

pub struct Y4mReader<R> {
    inner: R,
    header: Y4mHeader,
    next_pts: i64,
    line: Vec<u8>,
}

impl Y4mReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, InitError> {
        let file = File::open(path).map_err(|e| InitError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: BufRead> Y4mReader<R> {
    pub fn from_reader(mut inner: R) -> Result<Self, InitError> {
        let mut line = Vec::new();
        (&mut inner)
            .take(MAX_LINE)
            .read_until(b'\n', &mut line)
            .map_err(|e| InitError::Probe(e.to_string()))?;
        if line.last() != Some(&b'\n') {
            return Err(InitError::Probe("unterminated stream header".into()));
        }
        let text = std::str::from_utf8(&line)
            .map_err(|_| InitError::Probe("stream header is not text".into()))?;
        let header = Y4mHeader::parse(text)?;
        log::debug!("y4m header: {header:?}");

        Ok(Self {
            inner,
            header,
            next_pts: 0,
            line,
        })
    }

    pub fn header(&self) -> &Y4mHeader {
        &self.header
    }
}

impl<R: BufRead> StreamReader for Y4mReader<R> {
    type Unit = CompressedUnit;

    fn probe(&mut self) -> Result<Vec<StreamInfo>, InitError> {
        Ok(vec![StreamInfo {
            index: 0,
            kind: MediaKind::Video,
            codec: CODEC_NAME.to_string(),
            geometry: Some(self.header.geometry),
            pixel_format: Some(
                self.header
                    .format
                    .map_or_else(|| self.header.colorspace.clone(), |f| f.name().to_string()),
            ),
            frame_rate: self.header.frame_rate,
        }])
    }

    fn read_next_unit(&mut self) -> anyhow::Result<Option<CompressedUnit>> {
        self.line.clear();
        let n = (&mut self.inner)
            .take(MAX_LINE)
            .read_until(b'\n', &mut self.line)
            .context("reading frame marker")?;
        if n == 0 {
            return Ok(None);
        }
        if !self.line.starts_with(FRAME_MARKER) || self.line.last() != Some(&b'\n') {
            bail!("bad frame marker at frame {}", self.next_pts);
        }

        let Some(size) = self.header.frame_size() else {
            bail!("colorspace {} has no known frame size", self.header.colorspace);
        };
        let mut data = vec![0; size];
        if let Err(err) = self.inner.read_exact(&mut data) {
            if err.kind() == ErrorKind::UnexpectedEof {
                bail!("truncated frame {}", self.next_pts);
            }
            return Err(err).context("reading frame payload");
        }

        let pts = self.next_pts;
        self.next_pts += 1;
        Ok(Some(CompressedUnit {
            stream_index: 0,
            pts: Some(pts),
            data,
        }))
    }
}

/// Splits raw payloads into planes. Output is one frame per accepted unit.
pub struct RawVideoDecoder {
    geometry: FrameGeometry,
    format: PixelFormat,
    pending: VecDeque<RawFrame>,
}

impl RawVideoDecoder {
    pub fn new(geometry: FrameGeometry, format: PixelFormat) -> Self {
        Self {
            geometry,
            format,
            pending: VecDeque::new(),
        }
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }
}

impl VideoDecoder for RawVideoDecoder {
    type Unit = CompressedUnit;
    type Frame = RawFrame;

    fn submit(&mut self, unit: &CompressedUnit) -> anyhow::Result<()> {
        let Some(expected) = self.format.frame_size(self.geometry) else {
            bail!("frame size of {} {} overflows", self.format, self.geometry);
        };
        if unit.data.len() != expected {
            bail!(
                "payload of {} bytes, expected {expected} for {} {}",
                unit.data.len(),
                self.format,
                self.geometry
            );
        }

        let mut planes = Vec::with_capacity(3);
        let mut offset = 0;
        for (w, h) in self.format.plane_dimensions(self.geometry) {
            planes.push(unit.data[offset..offset + w * h].to_vec());
            offset += w * h;
        }
        self.pending.push_back(RawFrame {
            geometry: self.geometry,
            format: self.format,
            planes,
            pts: unit.pts,
        });
        Ok(())
    }

    fn retrieve(&mut self) -> Option<RawFrame> {
        self.pending.pop_front()
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct Y4mBackend;

impl MediaBackend for Y4mBackend {
    type Reader = Y4mReader<BufReader<File>>;
    type Decoder = RawVideoDecoder;
    type Converter = YuvToRgb;

    fn name(&self) -> &'static str {
        "y4m"
    }

    fn open_input(&self, path: &Path) -> Result<Self::Reader, InitError> {
        Y4mReader::open(path)
    }

    fn open_decoder(
        &self,
        reader: &Self::Reader,
        stream: &StreamInfo,
    ) -> Result<RawVideoDecoder, InitError> {
        let header = reader.header();
        let format = header.format.ok_or_else(|| {
            InitError::UnsupportedCodec(format!("{} ({})", stream.codec, header.colorspace))
        })?;
        Ok(RawVideoDecoder::new(header.geometry, format))
    }

    fn open_converter(
        &self,
        decoder: &RawVideoDecoder,
        _stream: &StreamInfo,
        target: FrameGeometry,
    ) -> Result<YuvToRgb, InitError> {
        Ok(YuvToRgb::new(decoder.format(), decoder.geometry(), target))
    }
}
