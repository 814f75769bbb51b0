//! Button press events and the queue that carries them.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ InputPoller  │────▶│  Event Queue │────▶│  Supervisor  │
//! │ (debounced)  │     │  (bounded)   │     │  (consumer)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! The poller is the only producer and the supervisor the only consumer,
//! so handlers never run concurrently with each other.

use crossbeam_channel::{Receiver, Sender, TrySendError};

/// Maximum number of pending presses.  A full queue drops new presses.
pub const EVENT_QUEUE_CAP: usize = 32;

/// Physical buttons on the costume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    /// Toggles wings between stowed and deployed.
    DeployToggle,
    /// Toggles the laser.
    IndicatorToggle,
    /// Plays a catch-phrase.
    Phrase,
}

impl ButtonId {
    /// Short name used in log lines and fault reports.
    pub const fn name(self) -> &'static str {
        match self {
            Self::DeployToggle => "wing button",
            Self::IndicatorToggle => "laser button",
            Self::Phrase => "phrase button",
        }
    }
}

/// One debounced press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressEvent {
    pub button: ButtonId,
    /// Poller clock, milliseconds (wrapping).
    pub at_ms: u32,
}

/// Producer half of the event queue.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<PressEvent>,
}

impl EventSender {
    /// Push a press into the queue.
    /// Returns `false` if the queue is full or the consumer is gone (event dropped).
    pub fn push_event(&self, event: PressEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(ev)) => {
                log::warn!("Event queue full, dropping {:?}", ev.button);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Create the bounded press queue.
pub fn event_queue() -> (EventSender, Receiver<PressEvent>) {
    let (tx, rx) = crossbeam_channel::bounded(EVENT_QUEUE_CAP);
    (EventSender { tx }, rx)
}
