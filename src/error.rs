// src/error.rs

use std::path::PathBuf;

/// Everything that stops a session from starting. All of these are fatal and
/// are reported before any pipeline runs.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("couldn't open input stream {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("couldn't find stream information: {0}")]
    Probe(String),

    #[error("didn't find a video stream")]
    NoVideoStream,

    #[error("codec not found: {0}")]
    UnsupportedCodec(String),

    #[error("could not open codec: {0}")]
    CodecOpen(String),

    #[error("unsupported pixel layout: {0}")]
    UnsupportedPixelFormat(String),

    #[error("could not create display: {0}")]
    Display(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no backend available for {0}")]
    NoBackend(PathBuf),

    #[error("could not start playback thread")]
    Thread(#[from] std::io::Error),
}
