// src/backend/convert.rs

use crate::pipeline::{DisplayFrame, FrameConverter, FrameGeometry, PixelFormat, RawFrame};

/// Planar YUV (or gray) to packed RGB24, BT.601 limited range.
/// Chroma is upsampled by replication.
pub struct YuvToRgb {
    source_format: PixelFormat,
    source: FrameGeometry,
    target: FrameGeometry,
    mismatch_logged: bool,
}

impl YuvToRgb {
    pub fn new(source_format: PixelFormat, source: FrameGeometry, target: FrameGeometry) -> Self {
        Self {
            source_format,
            source,
            target,
            mismatch_logged: false,
        }
    }
}

#[inline]
fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[inline]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    [
        clamp_u8((298 * c + 409 * e + 128) >> 8),
        clamp_u8((298 * c - 100 * d - 208 * e + 128) >> 8),
        clamp_u8((298 * c + 516 * d + 128) >> 8),
    ]
}

impl FrameConverter for YuvToRgb {
    type Frame = RawFrame;

    fn convert(&mut self, frame: &RawFrame, target: &mut DisplayFrame) -> bool {
        if frame.format != self.source_format || frame.geometry != self.source {
            if !self.mismatch_logged {
                log::warn!(
                    "frame layout changed mid-stream ({} {} -> {} {}), skipping such frames",
                    self.source_format,
                    self.source,
                    frame.format,
                    frame.geometry
                );
                self.mismatch_logged = true;
            }
            return false;
        }

        let dims = frame.format.plane_dimensions(frame.geometry);
        let (sx, sy) = frame.format.chroma_shift();
        let luma_stride = dims[0].0;
        let chroma_stride = dims.get(1).map_or(0, |d| d.0);
        let width = self.source.width.min(self.target.width) as usize;
        let height = self.source.height.min(self.target.height) as usize;
        let stride = target.stride();

        for row in 0..height {
            let out = &mut target.data[row * stride..row * stride + width * 3];
            let luma = &frame.planes[0][row * luma_stride..row * luma_stride + width];
            let crow = (row >> sy) * chroma_stride;
            for (col, px) in out.chunks_exact_mut(3).enumerate() {
                let (u, v) = if frame.format == PixelFormat::Gray8 {
                    (128, 128)
                } else {
                    let ci = crow + (col >> sx);
                    (frame.planes[1][ci], frame.planes[2][ci])
                };
                px.copy_from_slice(&yuv_to_rgb(luma[col], u, v));
            }
        }
        target.pts = frame.pts;
        true
    }
}
