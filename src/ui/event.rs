//! Event bus for the terminal client.
//!
//! Key presses, render ticks and finished backend calls all arrive on one
//! unbounded channel; the main loop is the only consumer.

use super::app::Response;
use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Everything the main loop reacts to
#[derive(Debug)]
pub enum AppEvent {
    /// A key press (`KeyEventKind::Press` only)
    Key(KeyEvent),
    /// Redraw
    Render,
    /// A backend call completed
    Response(Response),
}

pub type EventSender = mpsc::UnboundedSender<AppEvent>;

/// Sender and receiver of the event channel
pub struct EventHandler {
    pub tx: EventSender,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the task forwarding terminal input and render ticks.
///
/// Runs until the receiver is dropped. Release and repeat key events are
/// filtered so each keystroke fires once.
pub fn spawn_event_task(tx: EventSender) {
    tokio::spawn(async move {
        let mut render_interval = interval(Duration::from_millis(50));
        let mut reader = EventStream::new();

        loop {
            let render_tick = render_interval.tick();
            let crossterm_event = reader.next().fuse();

            let sent = tokio::select! {
                _ = render_tick => tx.send(AppEvent::Render),
                maybe_event = crossterm_event => match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        tx.send(AppEvent::Key(key))
                    }
                    Some(Ok(Event::Resize(_, _))) => tx.send(AppEvent::Render),
                    Some(Ok(_)) => Ok(()),
                    Some(Err(_)) | None => break,
                },
            };

            if sent.is_err() {
                break;
            }
        }
    });
}
