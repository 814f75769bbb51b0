//! Wing strobe: a cancellable toggle loop on one output line.
//!
//! While the strobe runs, the line is *moved* into the strobe thread; nothing
//! else can write it.  [`StrobeTask::stop`] signals the thread, joins it,
//! takes the line back and drives it low before returning, so a following
//! [`StrobeTask::start`] can never overlap a dying loop.
//!
//! Edges are scheduled against absolute deadlines so the rate does not
//! drift with write latency.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{error, info, warn};

use crate::app::ports::{OutputPin, PinState};
use crate::error::HardwareFault;

const LINE: &str = "strobe";

struct Running<L> {
    stop_tx: Sender<()>,
    handle: JoinHandle<L>,
}

pub struct StrobeTask<L> {
    /// `Some` while idle; `None` while the thread owns the line (or it was lost).
    line: Option<L>,
    half_period: Duration,
    running: Option<Running<L>>,
}

impl<L> StrobeTask<L>
where
    L: OutputPin + Send + 'static,
{
    /// `frequency_hz` full on/off cycles per second.  Must be > 0.
    pub fn new(line: L, frequency_hz: f64) -> Self {
        Self {
            line: Some(line),
            half_period: Duration::from_secs_f64(1.0 / (2.0 * frequency_hz)),
            running: None,
        }
    }

    /// Start strobing.  No-op if already running.
    pub fn start(&mut self) -> Result<(), HardwareFault> {
        if self.running.is_some() {
            return Ok(());
        }
        let line = self.line.take().ok_or(HardwareFault::TaskLost { line: LINE })?;

        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let half_period = self.half_period;
        let handle = std::thread::Builder::new()
            .name("strobe".into())
            .spawn(move || strobe_loop(line, half_period, &stop_rx))
            .map_err(|e| {
                error!("Strobe: thread spawn failed: {}", e);
                HardwareFault::TaskLost { line: LINE }
            })?;

        self.running = Some(Running { stop_tx, handle });
        info!("Strobe: on ({:?} half period)", self.half_period);
        Ok(())
    }

    /// Stop strobing, join the thread and leave the line low.
    ///
    /// Always drives the line low, even if the strobe was not running.
    pub fn stop(&mut self) -> Result<(), HardwareFault> {
        if let Some(Running { stop_tx, handle }) = self.running.take() {
            let _ = stop_tx.send(());
            match handle.join() {
                Ok(line) => self.line = Some(line),
                Err(_) => {
                    error!("Strobe: thread panicked, line lost");
                    return Err(HardwareFault::TaskLost { line: LINE });
                }
            }
            info!("Strobe: off");
        }

        let line = self.line.as_mut().ok_or(HardwareFault::TaskLost { line: LINE })?;
        line.set_low().map_err(|_| HardwareFault::Write { line: LINE })
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }
}

impl<L> Drop for StrobeTask<L> {
    fn drop(&mut self) {
        // Without the `OutputPin` bound we cannot drive the line here; just make
        // sure the thread is gone.  Owners call `stop()` first for a low line.
        if let Some(Running { stop_tx, handle }) = self.running.take() {
            let _ = stop_tx.send(());
            let _ = handle.join();
        }
    }
}

fn strobe_loop<L: OutputPin>(mut line: L, half_period: Duration, stop_rx: &Receiver<()>) -> L {
    let mut level = false;
    let mut deadline = Instant::now();
    let mut failing = false;

    loop {
        level = !level;
        match line.set_state(PinState::from(level)) {
            Ok(()) => failing = false,
            Err(_) if !failing => {
                warn!("Strobe: {}", HardwareFault::Write { line: LINE });
                failing = true;
            }
            Err(_) => {}
        }

        deadline += half_period;
        let now = Instant::now();
        if deadline < now {
            // Fell behind (e.g. host suspended); resync instead of bursting.
            deadline = now;
        }
        match stop_rx.recv_deadline(deadline) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    line
}
