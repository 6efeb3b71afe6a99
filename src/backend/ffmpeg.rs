// src/backend/ffmpeg.rs

//! Containers and codecs through libavformat/libavcodec, conversion through libswscale.

use std::path::Path;

use anyhow::Context as _;
use ffmpeg_next as ffmpeg;
use ffmpeg::codec::context::Context as CodecContext;
use ffmpeg::format::{context::Input, Pixel};
use ffmpeg::media::Type as MediaType;
use ffmpeg::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
use ffmpeg::{decoder, frame, Packet};

use super::MediaBackend;
use crate::error::InitError;
use crate::pipeline::{
    DisplayFrame, FrameConverter, FrameGeometry, FrameRate, MediaKind, StreamInfo, StreamReader,
    StreamTagged, VideoDecoder,
};

pub struct FfmpegPacket(Packet);

impl StreamTagged for FfmpegPacket {
    fn stream_index(&self) -> usize {
        self.0.stream()
    }
}

fn media_kind(medium: MediaType) -> MediaKind {
    match medium {
        MediaType::Video => MediaKind::Video,
        MediaType::Audio => MediaKind::Audio,
        MediaType::Subtitle => MediaKind::Subtitle,
        MediaType::Data => MediaKind::Data,
        _ => MediaKind::Other,
    }
}

fn pixel_name(pixel: Pixel) -> String {
    format!("{pixel:?}").to_lowercase()
}

fn open_video_decoder(parameters: ffmpeg::codec::Parameters) -> Result<decoder::Video, InitError> {
    let id = parameters.id();
    if decoder::find(id).is_none() {
        return Err(InitError::UnsupportedCodec(id.name().to_string()));
    }
    let context =
        CodecContext::from_parameters(parameters).map_err(|e| InitError::CodecOpen(e.to_string()))?;
    context
        .decoder()
        .video()
        .map_err(|e| InitError::CodecOpen(e.to_string()))
}

pub struct FfmpegReader {
    input: Input,
}

impl FfmpegReader {
    pub fn open(path: &Path) -> Result<Self, InitError> {
        let input = ffmpeg::format::input(path).map_err(|e| InitError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self { input })
    }

    fn parameters(&self, index: usize) -> Option<ffmpeg::codec::Parameters> {
        self.input.stream(index).map(|s| s.parameters())
    }
}

impl StreamReader for FfmpegReader {
    type Unit = FfmpegPacket;

    fn probe(&mut self) -> Result<Vec<StreamInfo>, InitError> {
        let mut streams = Vec::new();
        for stream in self.input.streams() {
            let parameters = stream.parameters();
            let kind = media_kind(parameters.medium());
            let codec = parameters.id().name().to_string();
            let rate = stream.avg_frame_rate();

            let (geometry, pixel_format) = if kind == MediaKind::Video {
                match CodecContext::from_parameters(parameters)
                    .and_then(|c| c.decoder().video())
                {
                    Ok(video) => (
                        Some(FrameGeometry::new(video.width(), video.height())),
                        Some(pixel_name(video.format())),
                    ),
                    Err(err) => {
                        log::debug!("no geometry for stream {}: {err}", stream.index());
                        (None, None)
                    }
                }
            } else {
                (None, None)
            };

            streams.push(StreamInfo {
                index: stream.index(),
                kind,
                codec,
                geometry,
                pixel_format,
                frame_rate: (rate.numerator() > 0 && rate.denominator() > 0).then(|| FrameRate {
                    num: rate.numerator() as u32,
                    den: rate.denominator() as u32,
                }),
            });
        }
        if streams.is_empty() {
            return Err(InitError::Probe("container has no streams".into()));
        }
        Ok(streams)
    }

    fn read_next_unit(&mut self) -> anyhow::Result<Option<FfmpegPacket>> {
        let mut packet = Packet::empty();
        match packet.read(&mut self.input) {
            Ok(()) => Ok(Some(FfmpegPacket(packet))),
            Err(ffmpeg::Error::Eof) => Ok(None),
            Err(err) => Err(err).context("reading packet"),
        }
    }
}

pub struct FfmpegDecoder {
    decoder: decoder::Video,
}

impl VideoDecoder for FfmpegDecoder {
    type Unit = FfmpegPacket;
    type Frame = frame::Video;

    fn submit(&mut self, unit: &FfmpegPacket) -> anyhow::Result<()> {
        self.decoder.send_packet(&unit.0).context("sending packet")
    }

    fn retrieve(&mut self) -> Option<frame::Video> {
        let mut decoded = frame::Video::empty();
        match self.decoder.receive_frame(&mut decoded) {
            Ok(()) => Some(decoded),
            Err(ffmpeg::Error::Eof) => None,
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => None,
            Err(err) => {
                log::debug!("receive_frame: {err}");
                None
            }
        }
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.decoder.send_eof().context("sending end of stream")
    }
}

/// Native pixel layout to packed RGB24 at the stream's declared size.
pub struct FfmpegConverter {
    scaler: ScalingContext,
    scaled: frame::Video,
}

impl FrameConverter for FfmpegConverter {
    type Frame = frame::Video;

    fn convert(&mut self, decoded: &frame::Video, target: &mut DisplayFrame) -> bool {
        if let Err(err) = self.scaler.run(decoded, &mut self.scaled) {
            log::warn!("scaling failed: {err}");
            return false;
        }
        let src = self.scaled.data(0);
        let src_stride = self.scaled.stride(0);
        let row_bytes = target.stride().min(src_stride);
        let dst_stride = target.stride();
        for row in 0..target.geometry.height as usize {
            let from = row * src_stride;
            let to = row * dst_stride;
            if from + row_bytes > src.len() {
                break;
            }
            target.data[to..to + row_bytes].copy_from_slice(&src[from..from + row_bytes]);
        }
        target.pts = decoded.pts();
        true
    }
}

pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Result<Self, InitError> {
        ffmpeg::init().map_err(|e| InitError::CodecOpen(format!("initializing ffmpeg: {e}")))?;
        Ok(Self)
    }
}

impl MediaBackend for FfmpegBackend {
    type Reader = FfmpegReader;
    type Decoder = FfmpegDecoder;
    type Converter = FfmpegConverter;

    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn open_input(&self, path: &Path) -> Result<FfmpegReader, InitError> {
        FfmpegReader::open(path)
    }

    fn open_decoder(
        &self,
        reader: &FfmpegReader,
        stream: &StreamInfo,
    ) -> Result<FfmpegDecoder, InitError> {
        let parameters = reader
            .parameters(stream.index)
            .ok_or_else(|| InitError::Probe(format!("stream {} vanished", stream.index)))?;
        Ok(FfmpegDecoder {
            decoder: open_video_decoder(parameters)?,
        })
    }

    fn open_converter(
        &self,
        decoder: &FfmpegDecoder,
        _stream: &StreamInfo,
        target: FrameGeometry,
    ) -> Result<FfmpegConverter, InitError> {
        let source = decoder.decoder.format();
        let scaler = ScalingContext::get(
            source,
            decoder.decoder.width(),
            decoder.decoder.height(),
            Pixel::RGB24,
            target.width,
            target.height,
            ScalingFlags::BICUBIC,
        )
        .map_err(|e| InitError::UnsupportedPixelFormat(format!("{}: {e}", pixel_name(source))))?;
        Ok(FfmpegConverter {
            scaler,
            scaled: frame::Video::empty(),
        })
    }
}
