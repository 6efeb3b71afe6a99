// src/lib.rs

pub mod backend;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod display;
pub mod error;
pub mod input;
pub mod logging;
pub mod pipeline;
pub mod session;
pub mod signal;
pub mod state;
pub mod timer;

pub use backend::{BackendKind, MediaBackend};
pub use config::PlayerConfig;
pub use dispatcher::{EventLoop, LoopState, RefreshHandler};
pub use error::InitError;
pub use pipeline::{DecodePipeline, DrainMode, DrainReport};
pub use session::PlaybackSession;
pub use signal::{Key, Signal, UserEvent};
pub use state::PlaybackState;
pub use timer::RefreshTimer;
