// src/backend/mod.rs

pub mod convert;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod y4m;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::InitError;
use crate::pipeline::{FrameConverter, FrameGeometry, StreamInfo, StreamReader, VideoDecoder};

/// A family of collaborators that fit together: the decoder takes the reader's
/// units, the converter takes the decoder's frames.
pub trait MediaBackend {
    type Reader: StreamReader;
    type Decoder: VideoDecoder<Unit = <Self::Reader as StreamReader>::Unit>;
    type Converter: FrameConverter<Frame = <Self::Decoder as VideoDecoder>::Frame>;

    fn name(&self) -> &'static str;

    fn open_input(&self, path: &Path) -> Result<Self::Reader, InitError>;

    fn open_decoder(
        &self,
        reader: &Self::Reader,
        stream: &StreamInfo,
    ) -> Result<Self::Decoder, InitError>;

    fn open_converter(
        &self,
        decoder: &Self::Decoder,
        stream: &StreamInfo,
        target: FrameGeometry,
    ) -> Result<Self::Converter, InitError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// `y4m` for `.y4m` files, ffmpeg for everything else when compiled in.
    #[default]
    Auto,
    Y4m,
    Ffmpeg,
}

impl BackendKind {
    /// Settles `Auto` for a concrete input path.
    pub fn resolve(self, path: &Path) -> Result<BackendKind, InitError> {
        match self {
            BackendKind::Auto => {
                let is_y4m = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("y4m"));
                if is_y4m {
                    Ok(BackendKind::Y4m)
                } else if cfg!(feature = "ffmpeg") {
                    Ok(BackendKind::Ffmpeg)
                } else {
                    Err(InitError::NoBackend(path.to_path_buf()))
                }
            }
            BackendKind::Ffmpeg if !cfg!(feature = "ffmpeg") => Err(InitError::Config(
                "this build has no ffmpeg support (enable the `ffmpeg` feature)".into(),
            )),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_picks_y4m_by_extension() {
        assert_eq!(
            BackendKind::Auto.resolve(Path::new("clip.Y4M")).unwrap(),
            BackendKind::Y4m
        );
    }

    #[cfg(not(feature = "ffmpeg"))]
    #[test]
    fn auto_without_ffmpeg_rejects_other_containers() {
        assert!(matches!(
            BackendKind::Auto.resolve(Path::new("clip.mp4")),
            Err(InitError::NoBackend(_))
        ));
        assert!(matches!(
            BackendKind::Ffmpeg.resolve(Path::new("clip.mp4")),
            Err(InitError::Config(_))
        ));
    }

    #[cfg(feature = "ffmpeg")]
    #[test]
    fn auto_with_ffmpeg_handles_other_containers() {
        assert_eq!(
            BackendKind::Auto.resolve(Path::new("clip.mp4")).unwrap(),
            BackendKind::Ffmpeg
        );
    }

    #[test]
    fn explicit_y4m_is_kept() {
        assert_eq!(
            BackendKind::Y4m.resolve(Path::new("clip.bin")).unwrap(),
            BackendKind::Y4m
        );
    }
}
