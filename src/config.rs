//! Controller configuration.
//!
//! Loaded once at startup (defaults, optionally overlaid by a JSON file) and
//! never mutated afterwards.  [`CostumeConfig::validate`] must pass before any
//! hardware is acquired.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app::phrase::PhraseOrder;
use crate::app::state::Position;
use crate::error::ConfigFault;
use crate::pins;

/// Upper bound for the strobe so each half period stays >= 5 ms.
const MAX_STROBE_HZ: f64 = 100.0;
const MAX_SERVO_PWM_HZ: f64 = 1_000.0;
const MAX_DEBOUNCE_MS: u32 = 5_000;
const MAX_SETTLE_MS: u32 = 5_000;
const MAX_POLL_INTERVAL_MS: u32 = 100;

/// Top-level controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostumeConfig {
    pub pins: PinConfig,
    pub servo: ServoConfig,

    // --- Strobe ---
    /// Strobe flashes per second.
    pub strobe_frequency_hz: f64,

    // --- Buttons ---
    /// Presses closer together than this collapse into one event.
    pub debounce_ms: u32,
    /// `true` when a press pulls the line low (pull-up wiring).
    pub buttons_active_low: bool,
    /// How often the input poller samples the buttons.
    pub poll_interval_ms: u32,

    // --- Audio ---
    /// Directory the clip file names are resolved against.
    pub audio_dir: PathBuf,
    pub clips: ClipConfig,
    pub phrase_order: PhraseOrder,
}

/// Line assignments (BCM numbering).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub servo: u8,
    pub strobe_led: u8,
    pub laser_led: u8,
    pub wing_button: u8,
    pub laser_button: u8,
    pub phrase_button: u8,
}

/// Servo duty cycles and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    /// Duty cycle (%) for [`Position::Primary`]: wings extended.
    pub primary_duty: f64,
    /// Duty cycle (%) for [`Position::Secondary`]: wings at rest.
    pub secondary_duty: f64,
    pub pwm_frequency_hz: f64,
    /// How long a commanded position is held before the signal is dropped.
    pub settle_ms: u32,
}

/// Clip file names, resolved against [`CostumeConfig::audio_dir`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipConfig {
    pub deploy: String,
    pub stow: String,
    pub indicator_on: String,
    pub indicator_off: String,
    /// Ordered phrase list for the phrase button.
    pub phrases: Vec<String>,
}

impl Default for CostumeConfig {
    fn default() -> Self {
        Self {
            pins: PinConfig::default(),
            servo: ServoConfig::default(),
            strobe_frequency_hz: 10.0,
            debounce_ms: 200,
            buttons_active_low: true,
            poll_interval_ms: 5,
            audio_dir: PathBuf::from("audio"),
            clips: ClipConfig::default(),
            phrase_order: PhraseOrder::Random,
        }
    }
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            servo: pins::SERVO_GPIO,
            strobe_led: pins::STROBE_LED_GPIO,
            laser_led: pins::LASER_LED_GPIO,
            wing_button: pins::WING_BUTTON_GPIO,
            laser_button: pins::LASER_BUTTON_GPIO,
            phrase_button: pins::PHRASE_BUTTON_GPIO,
        }
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            primary_duty: 5.0,    // horizontal, 0°
            secondary_duty: 10.0, // vertical, 90°
            pwm_frequency_hz: pins::SERVO_PWM_FREQ_HZ,
            settle_ms: 500,
        }
    }
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            deploy: "wings_open.wav".into(),
            stow: "wings_close.wav".into(),
            indicator_on: "laser_on.wav".into(),
            indicator_off: "laser_off.wav".into(),
            phrases: vec![
                "to_infinity.wav".into(),
                "buzz_lightyear.wav".into(),
                "not_flying.wav".into(),
                "space_ranger.wav".into(),
            ],
        }
    }
}

impl ServoConfig {
    /// Commanded duty cycle for `position`.
    pub fn duty_for(&self, position: Position) -> f64 {
        match position {
            Position::Primary => self.primary_duty,
            Position::Secondary => self.secondary_duty,
        }
    }
}

impl ClipConfig {
    /// Every configured clip, fixed clips first.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        [
            self.deploy.as_str(),
            self.stow.as_str(),
            self.indicator_on.as_str(),
            self.indicator_off.as_str(),
        ]
        .into_iter()
        .chain(self.phrases.iter().map(String::as_str))
    }
}

impl CostumeConfig {
    /// Parse a JSON document.  Missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigFault> {
        serde_json::from_str(json).map_err(|e| ConfigFault::Malformed(e.to_string()))
    }

    /// Read and parse a JSON config file.  Does not validate.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigFault> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigFault::Unreadable(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Reject anything that would misdrive hardware.  Runs before acquisition.
    pub fn validate(&self) -> Result<(), ConfigFault> {
        let lines = [
            ("servo", self.pins.servo),
            ("strobe_led", self.pins.strobe_led),
            ("laser_led", self.pins.laser_led),
            ("wing_button", self.pins.wing_button),
            ("laser_button", self.pins.laser_button),
            ("phrase_button", self.pins.phrase_button),
        ];
        let mut seen = HashSet::new();
        for (name, pin) in lines {
            if pin > pins::MAX_BCM_GPIO {
                return Err(ConfigFault::InvalidPin { name, pin });
            }
            if !seen.insert(pin) {
                return Err(ConfigFault::DuplicatePin(pin));
            }
        }

        check_duty("servo.primary_duty", self.servo.primary_duty)?;
        check_duty("servo.secondary_duty", self.servo.secondary_duty)?;
        check_frequency("servo.pwm_frequency_hz", self.servo.pwm_frequency_hz, MAX_SERVO_PWM_HZ)?;
        check_frequency("strobe_frequency_hz", self.strobe_frequency_hz, MAX_STROBE_HZ)?;

        if self.servo.settle_ms > MAX_SETTLE_MS {
            return Err(ConfigFault::TimingOutOfRange("servo.settle_ms"));
        }
        if self.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigFault::TimingOutOfRange("debounce_ms"));
        }
        if self.poll_interval_ms == 0 || self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(ConfigFault::TimingOutOfRange("poll_interval_ms"));
        }
        if self.clips.phrases.is_empty() {
            return Err(ConfigFault::NoPhrases);
        }
        Ok(())
    }
}

fn check_duty(name: &'static str, duty: f64) -> Result<(), ConfigFault> {
    if duty.is_finite() && (0.0..=100.0).contains(&duty) {
        Ok(())
    } else {
        Err(ConfigFault::DutyOutOfRange(name))
    }
}

fn check_frequency(name: &'static str, hz: f64, max: f64) -> Result<(), ConfigFault> {
    if hz.is_finite() && hz > 0.0 && hz <= max {
        Ok(())
    } else {
        Err(ConfigFault::FrequencyOutOfRange(name))
    }
}
