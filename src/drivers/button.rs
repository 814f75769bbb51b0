//! Debounced button driver and the input-poller thread.
//!
//! ## Hardware
//!
//! Momentary switch, active-low with pull-up by default.  The poller samples
//! every button at `poll_interval_ms`; each sample goes through a
//! [`Debouncer`] which turns the raw level stream into press events.
//!
//! ## Debounce rule
//!
//! A press edge (released → pressed) becomes an event only when at least
//! `debounce_ms` has passed since the last accepted press.  Presses faster
//! than that collapse into one event instead of queueing.  Release bounce is
//! filtered separately: the line must have read released for
//! [`RELEASE_SETTLE_MS`] before a new press edge counts, so a long hold
//! followed by a quick re-press still yields two events.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};
use log::{info, warn};

use crate::adapters::time::MonotonicClock;
use crate::app::ports::InputPin;
use crate::error::HardwareFault;
use crate::events::{ButtonId, EventSender, PressEvent};

/// Minimum released time before a new press edge is trusted.
pub const RELEASE_SETTLE_MS: u32 = 20;

/// Edge detector with a lockout window.
#[derive(Debug, Clone)]
pub struct Debouncer {
    debounce_ms: u32,
    /// `None` until the first sample; the first sample never yields an edge.
    was_pressed: Option<bool>,
    last_accept_ms: Option<u32>,
    last_release_ms: Option<u32>,
}

impl Debouncer {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms,
            was_pressed: None,
            last_accept_ms: None,
            last_release_ms: None,
        }
    }

    /// Feed one sample.  Returns `true` when a press should be reported.
    pub fn update(&mut self, now_ms: u32, pressed: bool) -> bool {
        let Some(was) = self.was_pressed.replace(pressed) else {
            return false;
        };

        if was && !pressed {
            self.last_release_ms = Some(now_ms);
            return false;
        }
        if was || !pressed {
            return false;
        }

        let elapsed = |since: Option<u32>, window: u32| {
            since.is_none_or(|t| now_ms.wrapping_sub(t) >= window)
        };
        let release_window = self.debounce_ms.min(RELEASE_SETTLE_MS);
        if elapsed(self.last_accept_ms, self.debounce_ms)
            && elapsed(self.last_release_ms, release_window)
        {
            self.last_accept_ms = Some(now_ms);
            true
        } else {
            false
        }
    }
}

/// One button: pin, polarity and debouncer.
pub struct ButtonDriver<P> {
    id: ButtonId,
    pin: P,
    active_low: bool,
    debouncer: Debouncer,
}

impl<P: InputPin> ButtonDriver<P> {
    pub fn new(id: ButtonId, pin: P, active_low: bool, debounce_ms: u32) -> Self {
        Self {
            id,
            pin,
            active_low,
            debouncer: Debouncer::new(debounce_ms),
        }
    }

    /// Sample the pin once.  `now_ms` is the poller clock.
    pub fn poll(&mut self, now_ms: u32) -> Result<Option<PressEvent>, HardwareFault> {
        let low = self
            .pin
            .is_low()
            .map_err(|_| HardwareFault::Read { line: self.id.name() })?;
        let pressed = low == self.active_low;
        Ok(self
            .debouncer
            .update(now_ms, pressed)
            .then_some(PressEvent { button: self.id, at_ms: now_ms }))
    }
}

// ── Input poller thread ───────────────────────────────────────

/// Background thread that samples all buttons and feeds the event queue.
///
/// Owns the input pins; they are released when the thread exits.
pub struct InputPoller {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl InputPoller {
    pub fn spawn<P>(
        mut buttons: Vec<ButtonDriver<P>>,
        interval: Duration,
        events: EventSender,
    ) -> std::io::Result<Self>
    where
        P: InputPin + Send + 'static,
    {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let clock = MonotonicClock::new();

        let handle = std::thread::Builder::new()
            .name("input-poller".into())
            .spawn(move || {
                let mut read_failed = vec![false; buttons.len()];
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    let now_ms = clock.uptime_ms();
                    for (button, failed) in buttons.iter_mut().zip(read_failed.iter_mut()) {
                        match button.poll(now_ms) {
                            Ok(Some(event)) => {
                                events.push_event(event);
                            }
                            Ok(None) => *failed = false,
                            Err(e) => {
                                // Log once per failure streak, not once per sample.
                                if !*failed {
                                    warn!("Input: {}", e);
                                    *failed = true;
                                }
                            }
                        }
                    }
                }
                info!("Input poller stopped");
            })?;

        info!("Input poller started ({} ms interval)", interval.as_millis());
        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop sampling and join the thread.  Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("Input poller panicked");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for InputPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
