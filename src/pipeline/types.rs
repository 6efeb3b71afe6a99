// src/pipeline/types.rs

use std::fmt;

/// Anything a stream reader hands out carries the index of its source stream.
pub trait StreamTagged {
    fn stream_index(&self) -> usize;
}

/// One encoded chunk as read from the container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedUnit {
    pub stream_index: usize,
    pub pts: Option<i64>,
    pub data: Vec<u8>,
}

impl StreamTagged for CompressedUnit {
    fn stream_index(&self) -> usize {
        self.stream_index
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
    Subtitle,
    Data,
    Other,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Subtitle => "subtitle",
            MediaKind::Data => "data",
            MediaKind::Other => "other",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
}

impl FrameGeometry {
    /// Largest width or height any backend will accept.
    pub const MAX_DIMENSION: u32 = 16384;

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Non-empty and within `MAX_DIMENSION` on both axes. Every buffer size
    /// derived from a supported geometry fits in `usize`.
    pub fn is_supported(&self) -> bool {
        !self.is_empty()
            && self.width <= Self::MAX_DIMENSION
            && self.height <= Self::MAX_DIMENSION
    }

    pub fn pixel_count(&self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)
    }
}

impl fmt::Display for FrameGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    pub fn as_f64(&self) -> f64 {
        if self.den == 0 {
            0.0
        } else {
            self.num as f64 / self.den as f64
        }
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} fps", self.as_f64())
    }
}

/// Stream description produced by probing a container.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamInfo {
    pub index: usize,
    pub kind: MediaKind,
    pub codec: String,
    pub geometry: Option<FrameGeometry>,
    pub pixel_format: Option<String>,
    pub frame_rate: Option<FrameRate>,
}

impl StreamInfo {
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    /// One-line summary used by the stream dump.
    pub fn describe(&self) -> String {
        let mut line = format!("#{} {}: {}", self.index, self.kind, self.codec);
        if let Some(pix) = &self.pixel_format {
            line.push_str(&format!(", {pix}"));
        }
        if let Some(geometry) = self.geometry {
            line.push_str(&format!(", {geometry}"));
        }
        if let Some(rate) = self.frame_rate {
            line.push_str(&format!(", {rate}"));
        }
        line
    }
}

/// Planar 8-bit layouts the built-in decoder and converter understand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Gray8,
    Yuv420p,
    Yuv422p,
    Yuv444p,
}

impl PixelFormat {
    pub fn name(&self) -> &'static str {
        match self {
            PixelFormat::Gray8 => "gray",
            PixelFormat::Yuv420p => "yuv420p",
            PixelFormat::Yuv422p => "yuv422p",
            PixelFormat::Yuv444p => "yuv444p",
        }
    }

    /// Horizontal and vertical chroma subsampling shifts.
    pub fn chroma_shift(&self) -> (u32, u32) {
        match self {
            PixelFormat::Gray8 | PixelFormat::Yuv444p => (0, 0),
            PixelFormat::Yuv422p => (1, 0),
            PixelFormat::Yuv420p => (1, 1),
        }
    }

    /// Dimensions of each plane for a picture of the given size.
    pub fn plane_dimensions(&self, geometry: FrameGeometry) -> Vec<(usize, usize)> {
        let (w, h) = (geometry.width as usize, geometry.height as usize);
        if *self == PixelFormat::Gray8 {
            return vec![(w, h)];
        }
        let (sx, sy) = self.chroma_shift();
        let cw = (w + (1 << sx) - 1) >> sx;
        let ch = (h + (1 << sy) - 1) >> sy;
        vec![(w, h), (cw, ch), (cw, ch)]
    }

    /// Bytes in one tightly packed frame, `None` if that overflows.
    pub fn frame_size(&self, geometry: FrameGeometry) -> Option<usize> {
        self.plane_dimensions(geometry)
            .iter()
            .try_fold(0usize, |total, (w, h)| total.checked_add(w.checked_mul(*h)?))
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded picture in its native planar layout, planes tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFrame {
    pub geometry: FrameGeometry,
    pub format: PixelFormat,
    pub planes: Vec<Vec<u8>>,
    pub pts: Option<i64>,
}

/// The display-ready buffer: packed RGB24, allocated once and overwritten per frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayFrame {
    pub geometry: FrameGeometry,
    pub data: Vec<u8>,
    pub pts: Option<i64>,
}

impl DisplayFrame {
    pub const BYTES_PER_PIXEL: usize = 3;

    /// Bytes needed for an RGB24 picture of `geometry`, `None` if that overflows.
    pub fn buffer_len(geometry: FrameGeometry) -> Option<usize> {
        geometry.pixel_count()?.checked_mul(Self::BYTES_PER_PIXEL)
    }

    /// Callers check `FrameGeometry::is_supported` first; an unrepresentable
    /// size leaves the buffer empty.
    pub fn new(geometry: FrameGeometry) -> Self {
        Self {
            geometry,
            data: vec![0; Self::buffer_len(geometry).unwrap_or(0)],
            pts: None,
        }
    }

    pub fn stride(&self) -> usize {
        self.geometry.width as usize * Self::BYTES_PER_PIXEL
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = y as usize * self.stride() + x as usize * Self::BYTES_PER_PIXEL;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}
