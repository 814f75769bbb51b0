//! Raspberry Pi GPIO adapter (rppal).
//!
//! Wraps rppal's pins in thin newtypes implementing the `embedded-hal` 1.0
//! traits the drivers are written against.  rppal resets every pin to its
//! original mode when the wrapper is dropped, so releasing the [`Hardware`]
//! bundle also releases the header.
//!
//! The servo uses rppal's software PWM on a plain output line.  Duty 0 %
//! clears the PWM thread and parks the line low.

use core::convert::Infallible;
use core::fmt;

use embedded_hal::digital::{self, ErrorType};
use embedded_hal::pwm::{self, SetDutyCycle};
use log::{error, info};
use rppal::gpio::{Gpio, InputPin, OutputPin};

use crate::config::PinConfig;
use crate::error::HardwareFault;
use crate::supervisor::Hardware;

/// Duty resolution exposed to the servo driver (0.01 % steps).
const SOFT_PWM_MAX_DUTY: u16 = 10_000;

/// Acquired line set on a Raspberry Pi.
pub type RpiHardware = Hardware<SoftPwm, RpiOutput, RpiOutput, RpiInput>;

// ── Acquisition ───────────────────────────────────────────────

/// Claim every configured line: outputs low, buttons with the pull that
/// matches their polarity.
pub fn acquire(
    pins: &PinConfig,
    servo_pwm_hz: f64,
    buttons_active_low: bool,
) -> Result<RpiHardware, HardwareFault> {
    let gpio = Gpio::new().map_err(|e| {
        error!("GPIO open failed: {}", e);
        HardwareFault::Unavailable
    })?;

    let output = |pin: u8| -> Result<OutputPin, HardwareFault> {
        gpio.get(pin)
            .map(|p| p.into_output_low())
            .map_err(|e| {
                error!("GPIO{} unavailable: {}", pin, e);
                HardwareFault::Acquire { pin }
            })
    };
    let input = |pin: u8| -> Result<RpiInput, HardwareFault> {
        gpio.get(pin)
            .map(|p| {
                if buttons_active_low {
                    RpiInput(p.into_input_pullup())
                } else {
                    RpiInput(p.into_input_pulldown())
                }
            })
            .map_err(|e| {
                error!("GPIO{} unavailable: {}", pin, e);
                HardwareFault::Acquire { pin }
            })
    };

    let hardware = Hardware {
        servo: SoftPwm::new(output(pins.servo)?, servo_pwm_hz),
        strobe: RpiOutput(output(pins.strobe_led)?),
        laser: RpiOutput(output(pins.laser_led)?),
        wing_button: input(pins.wing_button)?,
        laser_button: input(pins.laser_button)?,
        phrase_button: input(pins.phrase_button)?,
    };
    info!(
        "GPIO acquired: servo={} strobe={} laser={} buttons={}/{}/{}",
        pins.servo,
        pins.strobe_led,
        pins.laser_led,
        pins.wing_button,
        pins.laser_button,
        pins.phrase_button
    );
    Ok(hardware)
}

// ── Digital lines ─────────────────────────────────────────────

pub struct RpiOutput(OutputPin);

impl ErrorType for RpiOutput {
    type Error = Infallible;
}

impl digital::OutputPin for RpiOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high();
        Ok(())
    }
}

pub struct RpiInput(InputPin);

impl ErrorType for RpiInput {
    type Error = Infallible;
}

impl digital::InputPin for RpiInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.is_low())
    }
}

// ── Software PWM ──────────────────────────────────────────────

#[derive(Debug)]
pub struct SoftPwmError(rppal::gpio::Error);

impl fmt::Display for SoftPwmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "soft PWM: {}", self.0)
    }
}

impl pwm::Error for SoftPwmError {
    fn kind(&self) -> pwm::ErrorKind {
        pwm::ErrorKind::Other
    }
}

pub struct SoftPwm {
    pin: OutputPin,
    frequency_hz: f64,
}

impl SoftPwm {
    pub fn new(pin: OutputPin, frequency_hz: f64) -> Self {
        Self { pin, frequency_hz }
    }
}

impl pwm::ErrorType for SoftPwm {
    type Error = SoftPwmError;
}

impl SetDutyCycle for SoftPwm {
    fn max_duty_cycle(&self) -> u16 {
        SOFT_PWM_MAX_DUTY
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        if duty == 0 {
            self.pin.clear_pwm().map_err(SoftPwmError)?;
            self.pin.set_low();
            return Ok(());
        }
        let fraction = f64::from(duty.min(SOFT_PWM_MAX_DUTY)) / f64::from(SOFT_PWM_MAX_DUTY);
        self.pin
            .set_pwm_frequency(self.frequency_hz, fraction)
            .map_err(SoftPwmError)
    }
}
