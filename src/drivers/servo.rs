//! Two-position wing servo driver.
//!
//! Open loop: there is no position sensor, so a move asserts the duty cycle,
//! blocks for the settle time, then drops the signal to 0 % so the servo
//! does not hunt and jitter while holding.
//!
//! ## Dual-target design
//!
//! Generic over `embedded-hal`'s [`SetDutyCycle`]: rppal software PWM on the
//! Pi, a recording mock on the host.

use std::time::Duration;

use log::{debug, info};

use crate::app::ports::SetDutyCycle;
use crate::app::state::Position;
use crate::config::ServoConfig;
use crate::error::HardwareFault;

const LINE: &str = "servo";

pub struct ServoDriver<P> {
    pwm: P,
    config: ServoConfig,
    settle: Duration,
}

impl<P: SetDutyCycle> ServoDriver<P> {
    pub fn new(pwm: P, config: &ServoConfig) -> Self {
        Self {
            pwm,
            config: config.clone(),
            settle: Duration::from_millis(u64::from(config.settle_ms)),
        }
    }

    /// Drive to `position` and block until it has settled.
    pub fn move_to(&mut self, position: Position) -> Result<(), HardwareFault> {
        let duty = self.config.duty_for(position);
        debug!("Servo: {:?} at {:.2}%", position, duty);

        self.set_percent(duty)?;
        std::thread::sleep(self.settle);
        self.set_percent(0.0)
    }

    /// Drop the signal.  Called on teardown; harmless when already idle.
    pub fn release(&mut self) -> Result<(), HardwareFault> {
        self.set_percent(0.0)?;
        info!("Servo: released");
        Ok(())
    }

    fn set_percent(&mut self, percent: f64) -> Result<(), HardwareFault> {
        let max = self.pwm.max_duty_cycle();
        let raw = (percent.clamp(0.0, 100.0) / 100.0 * f64::from(max)).round() as u16;
        self.pwm
            .set_duty_cycle(raw)
            .map_err(|_| HardwareFault::Pwm { line: LINE })
    }
}
