// src/input.rs

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::pipeline::InputSource;
use crate::signal::{Signal, SignalSender};
use crate::state::PlaybackState;

const POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Forwards a display's input events into the signal queue until exit is
/// requested or the queue goes away. Losing the input source requests exit,
/// since nothing else could end the session.
pub fn spawn_input_pump(
    mut source: Box<dyn InputSource>,
    tx: SignalSender,
    state: PlaybackState,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("input-pump".into())
        .spawn(move || {
            while !state.is_exit_requested() {
                let events = match source.poll_input(POLL_TIMEOUT) {
                    Ok(events) => events,
                    Err(err) => {
                        log::warn!("input polling failed, stopping playback: {err:#}");
                        state.request_exit();
                        return;
                    }
                };
                for event in events {
                    if tx.send(Signal::from(event)).is_err() {
                        return;
                    }
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{signal_queue, Key, UserEvent};
    use std::collections::VecDeque;

    struct ScriptedInput(VecDeque<anyhow::Result<Vec<UserEvent>>>);

    impl InputSource for ScriptedInput {
        fn poll_input(&mut self, timeout: Duration) -> anyhow::Result<Vec<UserEvent>> {
            match self.0.pop_front() {
                Some(batch) => batch,
                None => {
                    thread::sleep(timeout.min(Duration::from_millis(2)));
                    Ok(Vec::new())
                }
            }
        }
    }

    #[test]
    fn forwards_events_in_order_and_stops_on_exit() {
        let state = PlaybackState::new();
        let (tx, rx) = signal_queue();
        let source = ScriptedInput(VecDeque::from(vec![
            Ok(vec![UserEvent::KeyPress(Key::Space)]),
            Ok(vec![]),
            Ok(vec![UserEvent::KeyPress(Key::Char('x')), UserEvent::QuitRequest]),
        ]));
        let pump = spawn_input_pump(Box::new(source), tx, state.clone()).unwrap();

        assert_eq!(rx.recv().unwrap(), Signal::KeyPress(Key::Space));
        assert_eq!(rx.recv().unwrap(), Signal::KeyPress(Key::Char('x')));
        assert_eq!(rx.recv().unwrap(), Signal::QuitRequest);

        state.request_exit();
        pump.join().unwrap();
        assert!(rx.recv().is_err());
    }

    #[test]
    fn stops_and_requests_exit_when_polling_fails() {
        let state = PlaybackState::new();
        let (tx, rx) = signal_queue();
        let source = ScriptedInput(VecDeque::from(vec![Err(anyhow::anyhow!("tty gone"))]));
        spawn_input_pump(Box::new(source), tx, state.clone())
            .unwrap()
            .join()
            .unwrap();
        assert!(rx.recv().is_err());
        assert!(state.is_exit_requested());
    }
}
