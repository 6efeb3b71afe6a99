// src/state.rs

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Pause/exit flags shared between the refresh timer and the event loop.
///
/// The two flags are independent atomics; nothing reads them as a pair.
/// `exit_requested` only ever goes from false to true.
#[derive(Clone, Debug, Default)]
pub struct PlaybackState {
    exit_requested: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_exit(&self) {
        self.exit_requested.store(true, Ordering::Relaxed);
    }

    /// Flips the pause flag and returns the new value.
    pub fn toggle_pause(&self) -> bool {
        let was_paused = self.paused.fetch_xor(true, Ordering::Relaxed);
        !was_paused
    }

    pub fn is_exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::Relaxed)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }
}
