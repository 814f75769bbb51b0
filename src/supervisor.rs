//! Lifecycle supervisor.
//!
//! Startup order: acquired I/O → drivers → rest pose → input poller.
//! Runs until the shutdown flag is raised, then tears down in reverse:
//! input poller joined (buttons released) → strobe stopped with its line
//! low → servo signal dropped → laser off.  Dropping the supervisor runs
//! the same teardown, so every exit path (including a panic unwinding
//! through [`Supervisor::run`]) releases the outputs.  The pins and the
//! audio player themselves are released when the supervisor is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{error, info, warn};

use crate::app::machine::CostumeMachine;
use crate::app::ports::{AudioPlayer, EventSink, InputPin, OutputPin, SetDutyCycle};
use crate::config::CostumeConfig;
use crate::drivers::button::{ButtonDriver, InputPoller};
use crate::drivers::servo::ServoDriver;
use crate::drivers::sound::SoundTrigger;
use crate::drivers::strobe::StrobeTask;
use crate::error::{Error, HardwareFault};
use crate::events::{ButtonId, PressEvent, event_queue};

/// Upper bound on how long the idle wait goes without checking the shutdown flag.
pub const IDLE_TICK: Duration = Duration::from_millis(100);

/// Every line the controller needs, already acquired.
pub struct Hardware<P, L, I, B> {
    pub servo: P,
    pub strobe: L,
    pub laser: I,
    pub wing_button: B,
    pub laser_button: B,
    pub phrase_button: B,
}

pub struct Supervisor<P, L, I, A, S>
where
    P: SetDutyCycle,
    L: OutputPin + Send + 'static,
    I: OutputPin,
    A: AudioPlayer,
    S: EventSink,
{
    machine: CostumeMachine<P, L, I, A>,
    poller: InputPoller,
    events: Receiver<PressEvent>,
    sink: S,
}

impl<P, L, I, A, S> Supervisor<P, L, I, A, S>
where
    P: SetDutyCycle,
    L: OutputPin + Send + 'static,
    I: OutputPin,
    A: AudioPlayer,
    S: EventSink,
{
    /// Build the machine on top of `hardware`, move to the rest pose and
    /// start listening to the buttons.
    ///
    /// `config` must already be validated.  On error everything acquired so
    /// far is released before returning.
    pub fn start<B>(
        config: &CostumeConfig,
        hardware: Hardware<P, L, I, B>,
        player: A,
        mut sink: S,
    ) -> Result<Self, Error>
    where
        B: InputPin + Send + 'static,
    {
        let Hardware {
            servo,
            strobe,
            laser,
            wing_button,
            laser_button,
            phrase_button,
        } = hardware;

        let sound = SoundTrigger::new(player, &config.audio_dir);
        for clip in sound.missing(config.clips.all()) {
            warn!("Startup: clip '{}' missing from {}", clip, config.audio_dir.display());
        }

        let mut machine = CostumeMachine::new(
            ServoDriver::new(servo, &config.servo),
            StrobeTask::new(strobe, config.strobe_frequency_hz),
            laser,
            sound,
            config.clips.clone(),
            config.phrase_order.build(),
        );

        if let Err(e) = machine.start(&mut sink) {
            error!("Startup: initial pose failed: {}", e);
            machine.shutdown(&mut sink);
            return Err(e.into());
        }

        let buttons = vec![
            ButtonDriver::new(ButtonId::DeployToggle, wing_button, config.buttons_active_low, config.debounce_ms),
            ButtonDriver::new(ButtonId::IndicatorToggle, laser_button, config.buttons_active_low, config.debounce_ms),
            ButtonDriver::new(ButtonId::Phrase, phrase_button, config.buttons_active_low, config.debounce_ms),
        ];
        let (tx, events) = event_queue();
        let interval = Duration::from_millis(u64::from(config.poll_interval_ms));
        let poller = match InputPoller::spawn(buttons, interval, tx) {
            Ok(p) => p,
            Err(e) => {
                error!("Startup: input poller spawn failed: {}", e);
                machine.shutdown(&mut sink);
                return Err(HardwareFault::TaskLost { line: "input" }.into());
            }
        };

        info!("Supervisor running");
        Ok(Self {
            machine,
            poller,
            events,
            sink,
        })
    }

    /// Handle presses until `shutdown` is raised, then tear down.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        while !shutdown.load(Ordering::Acquire) {
            if !self.step(IDLE_TICK) && !self.poller.is_running() {
                break;
            }
        }
        info!("Shutdown requested");
        self.shutdown();
    }

    /// Wait up to `wait` for one press and handle it.
    /// Returns `false` if nothing was handled.
    pub fn step(&mut self, wait: Duration) -> bool {
        match self.events.recv_timeout(wait) {
            Ok(event) => {
                self.machine.handle(event.button, &mut self.sink);
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Input poller gone");
                self.poller.stop();
                false
            }
        }
    }

    /// Release every output.  Idempotent.
    pub fn shutdown(&mut self) {
        if self.machine.is_stopped() {
            return;
        }
        self.poller.stop();
        let dropped = self.events.try_iter().count();
        if dropped > 0 {
            info!("Discarding {} unhandled press(es)", dropped);
        }
        self.machine.shutdown(&mut self.sink);
    }

    pub fn machine(&self) -> &CostumeMachine<P, L, I, A> {
        &self.machine
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<P, L, I, A, S> Drop for Supervisor<P, L, I, A, S>
where
    P: SetDutyCycle,
    L: OutputPin + Send + 'static,
    I: OutputPin,
    A: AudioPlayer,
    S: EventSink,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}
