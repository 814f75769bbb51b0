//! Costume state machine: the core.
//!
//! [`CostumeMachine`] owns the costume state and every output driver.  Each
//! debounced press is dispatched by [`ButtonId`] and runs to completion
//! before the next one is handled.
//!
//! ```text
//!  PressEvent ──▶ ┌──────────────────────┐ ──▶ ServoDriver   (blocking settle)
//!                 │    CostumeMachine    │ ──▶ StrobeTask    (start / stop)
//!                 │  Stowed ⇄ Deployed   │ ──▶ laser line
//!                 │  laser flag          │ ──▶ SoundTrigger  (fire-and-forget)
//!                 └──────────────────────┘ ──▶ EventSink
//! ```
//!
//! Runtime output faults are logged and reported through the sink; the
//! handler always finishes so the other buttons keep working.

use log::{info, warn};

use crate::config::ClipConfig;
use crate::drivers::servo::ServoDriver;
use crate::drivers::sound::SoundTrigger;
use crate::drivers::strobe::StrobeTask;
use crate::error::HardwareFault;
use crate::events::ButtonId;

use super::events::AppEvent;
use super::phrase::PhraseSelector;
use super::ports::{AudioPlayer, EventSink, OutputPin, PinState, SetDutyCycle};
use super::state::{CostumeState, Mode, Position};

const LASER: &str = "laser";

pub struct CostumeMachine<P, L, I, A> {
    state: CostumeState,
    servo: ServoDriver<P>,
    strobe: StrobeTask<L>,
    laser: I,
    sound: SoundTrigger<A>,
    clips: ClipConfig,
    phrases: Box<dyn PhraseSelector>,
    stopped: bool,
}

impl<P, L, I, A> CostumeMachine<P, L, I, A>
where
    P: SetDutyCycle,
    L: OutputPin + Send + 'static,
    I: OutputPin,
    A: AudioPlayer,
{
    pub fn new(
        servo: ServoDriver<P>,
        strobe: StrobeTask<L>,
        laser: I,
        sound: SoundTrigger<A>,
        clips: ClipConfig,
        phrases: Box<dyn PhraseSelector>,
    ) -> Self {
        Self {
            state: CostumeState::default(),
            servo,
            strobe,
            laser,
            sound,
            clips,
            phrases,
            stopped: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Put the hardware in the rest pose: lights off, wings to [`Position::Secondary`].
    ///
    /// Failure here is fatal; the caller aborts startup.
    pub fn start(&mut self, sink: &mut impl EventSink) -> Result<(), HardwareFault> {
        self.strobe.stop()?;
        self.laser
            .set_low()
            .map_err(|_| HardwareFault::Write { line: LASER })?;
        self.servo.move_to(self.state.position)?;

        sink.emit(&AppEvent::Started(self.state));
        info!("Costume ready: {:?}", self.state.mode());
        Ok(())
    }

    /// Strobe off (line low), servo signal off, laser off.  Idempotent.
    pub fn shutdown(&mut self, sink: &mut impl EventSink) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        if let Err(e) = self.strobe.stop() {
            warn!("Shutdown: {}", e);
        }
        self.state.strobe_active = false;
        if let Err(e) = self.servo.release() {
            warn!("Shutdown: {}", e);
        }
        if self.laser.set_low().is_err() {
            warn!("Shutdown: {}", HardwareFault::Write { line: LASER });
        }
        self.state.indicator_on = false;

        sink.emit(&AppEvent::Stopped);
        info!("Costume outputs released");
    }

    // ── Event dispatch ────────────────────────────────────────

    /// Handle one debounced press.
    pub fn handle(&mut self, button: ButtonId, sink: &mut impl EventSink) {
        if self.stopped {
            warn!("Ignoring {:?} after shutdown", button);
            return;
        }
        match button {
            ButtonId::DeployToggle => self.toggle_deploy(sink),
            ButtonId::IndicatorToggle => self.toggle_indicator(sink),
            ButtonId::Phrase => self.play_phrase(sink),
        }
    }

    /// Move → strobe → sound, in that order.
    fn toggle_deploy(&mut self, sink: &mut impl EventSink) {
        let from = self.state.position;
        let to = from.other();

        if let Err(e) = self.servo.move_to(to) {
            self.report_fault(e, sink);
        }
        self.state.position = to;

        let strobe_result = match to {
            Position::Primary => self.strobe.start(),
            Position::Secondary => self.strobe.stop(),
        };
        if let Err(e) = strobe_result {
            self.report_fault(e, sink);
        }
        self.state.strobe_active = self.strobe.is_running();

        let clip = match to {
            Position::Primary => self.clips.deploy.clone(),
            Position::Secondary => self.clips.stow.clone(),
        };
        self.play(&clip, sink);

        sink.emit(&AppEvent::PositionChanged {
            from,
            to,
            strobe: self.state.strobe_active,
        });
        info!(
            "Wings: {:?} - strobe {}",
            Mode::from(to),
            if self.state.strobe_active { "ON" } else { "OFF" }
        );
    }

    fn toggle_indicator(&mut self, sink: &mut impl EventSink) {
        let on = !self.state.indicator_on;
        self.state.indicator_on = on;

        if self.laser.set_state(PinState::from(on)).is_err() {
            self.report_fault(HardwareFault::Write { line: LASER }, sink);
        }

        let clip = if on {
            self.clips.indicator_on.clone()
        } else {
            self.clips.indicator_off.clone()
        };
        self.play(&clip, sink);

        sink.emit(&AppEvent::IndicatorChanged(on));
        info!("Laser: {}", if on { "ON" } else { "OFF" });
    }

    fn play_phrase(&mut self, sink: &mut impl EventSink) {
        let count = self.clips.phrases.len();
        if count == 0 {
            warn!("Phrase button pressed but no phrases configured");
            return;
        }
        let index = self.phrases.select(count).min(count - 1);
        let clip = self.clips.phrases[index].clone();

        self.play(&clip, sink);
        sink.emit(&AppEvent::PhraseSelected { index, clip });
    }

    // ── Internal ──────────────────────────────────────────────

    fn play(&mut self, clip: &str, sink: &mut impl EventSink) {
        if let Err(fault) = self.sound.play(clip) {
            sink.emit(&AppEvent::PlaybackSkipped {
                clip: clip.to_owned(),
                fault,
            });
        }
    }

    fn report_fault(&self, fault: HardwareFault, sink: &mut impl EventSink) {
        warn!("Output fault: {}", fault);
        sink.emit(&AppEvent::OutputFault(fault));
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> CostumeState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn is_strobe_running(&self) -> bool {
        self.strobe.is_running()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}
