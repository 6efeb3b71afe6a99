// src/timer.rs

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::signal::{Signal, SignalSender};
use crate::state::PlaybackState;

/// Default cadence: 40ms, roughly 25 refreshes per second.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(40);

/// Background ticker that paces playback independently of decode speed.
pub struct RefreshTimer {
    state: PlaybackState,
    tx: SignalSender,
    interval: Duration,
}

impl RefreshTimer {
    pub fn new(state: PlaybackState, tx: SignalSender, interval: Duration) -> Self {
        Self {
            state,
            tx,
            interval,
        }
    }

    /// What the timer posts on this tick, if anything.
    fn tick(&self) -> Option<Signal> {
        if self.state.is_exit_requested() {
            Some(Signal::Stopped)
        } else if !self.state.is_paused() {
            Some(Signal::Refresh)
        } else {
            None
        }
    }

    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("refresh-timer".into())
            .spawn(move || self.run())
    }

    fn run(self) {
        log::debug!("refresh timer started, interval {:?}", self.interval);
        loop {
            match self.tick() {
                Some(Signal::Stopped) => {
                    if self.tx.send(Signal::Stopped).is_err() {
                        log::debug!("event loop gone before the stop signal");
                    }
                    break;
                }
                Some(signal) => {
                    if self.tx.send(signal).is_err() {
                        log::debug!("event loop gone, refresh timer exiting");
                        return;
                    }
                }
                None => {}
            }
            thread::sleep(self.interval);
        }
        log::debug!("refresh timer stopped");
    }
}
