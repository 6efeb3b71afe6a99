// src/signal.rs

use std::sync::mpsc::{channel, Receiver, Sender};

/// Keys the player distinguishes. Anything else arrives as `Other`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Space,
    Char(char),
    Other,
}

/// Input reported by a display collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserEvent {
    KeyPress(Key),
    QuitRequest,
}

/// Everything the event loop can be woken up by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Refresh,
    Stopped,
    KeyPress(Key),
    QuitRequest,
}

impl From<UserEvent> for Signal {
    fn from(event: UserEvent) -> Self {
        match event {
            UserEvent::KeyPress(key) => Signal::KeyPress(key),
            UserEvent::QuitRequest => Signal::QuitRequest,
        }
    }
}

pub type SignalSender = Sender<Signal>;
pub type SignalReceiver = Receiver<Signal>;

/// The single queue every producer posts into and the event loop drains.
pub fn signal_queue() -> (SignalSender, SignalReceiver) {
    channel()
}
