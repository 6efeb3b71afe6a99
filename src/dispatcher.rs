// src/dispatcher.rs

use crate::pipeline::DrainReport;
use crate::signal::{Key, Signal, SignalReceiver};
use crate::state::PlaybackState;

/// What the event loop drives on every `Refresh`.
pub trait RefreshHandler {
    fn on_refresh(&mut self) -> DrainReport;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Terminated,
}

/// Single consumer of the signal queue. All pipeline work and all state
/// transitions happen on the thread that calls `run`.
pub struct EventLoop<'a, H: RefreshHandler> {
    state: PlaybackState,
    signals: SignalReceiver,
    handler: &'a mut H,
    exit_at_end: bool,
    loop_state: LoopState,
}

impl<'a, H: RefreshHandler> EventLoop<'a, H> {
    pub fn new(
        state: PlaybackState,
        signals: SignalReceiver,
        handler: &'a mut H,
        exit_at_end: bool,
    ) -> Self {
        Self {
            state,
            signals,
            handler,
            exit_at_end,
            loop_state: LoopState::Running,
        }
    }

    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    /// Blocks on the queue until `Stopped` arrives. A queue with no producers
    /// left counts as stopped.
    pub fn run(&mut self) -> LoopState {
        while self.loop_state == LoopState::Running {
            match self.signals.recv() {
                Ok(signal) => self.dispatch(signal),
                Err(_) => {
                    log::warn!("signal queue closed without a stop signal");
                    self.loop_state = LoopState::Terminated;
                }
            }
        }
        self.loop_state
    }

    pub fn dispatch(&mut self, signal: Signal) {
        if self.loop_state == LoopState::Terminated {
            return;
        }
        match signal {
            Signal::Refresh => {
                let report = self.handler.on_refresh();
                if report.frames_presented > 0 {
                    log::debug!("refresh presented {} frames", report.frames_presented);
                }
                if report.exhausted && self.exit_at_end && !self.state.is_exit_requested() {
                    log::info!("stream finished, exiting");
                    self.state.request_exit();
                }
            }
            Signal::KeyPress(Key::Space) => {
                let paused = self.state.toggle_pause();
                log::info!("{}", if paused { "paused" } else { "playing" });
            }
            Signal::KeyPress(_) => {}
            Signal::QuitRequest => {
                log::info!("quit requested");
                self.state.request_exit();
            }
            Signal::Stopped => {
                self.loop_state = LoopState::Terminated;
            }
        }
    }
}
